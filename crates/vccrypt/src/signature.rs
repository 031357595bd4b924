//! Digital signature capability: Ed25519.
//!
//! Curve arithmetic is delegated to `ring`. This module fixes the byte
//! layouts and length checks:
//!
//! - private key: `seed (32 bytes) || public key (32 bytes)`
//! - public key: 32 bytes
//! - signature: 64 bytes (RFC 8032 PureEd25519)

use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use rand::rngs::OsRng;
use rand::RngCore;
use ring::signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519 as RING_ED25519};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Ed25519 seed length in bytes.
pub const ED25519_SEED_LEN: usize = 32;

/// Ed25519 public key length in bytes.
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 private key length in bytes (seed followed by public key).
pub const ED25519_PRIVATE_KEY_LEN: usize = ED25519_SEED_LEN + ED25519_PUBLIC_KEY_LEN;

/// Ed25519 signature length in bytes.
pub const ED25519_SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A digital signature scheme.
pub trait SignatureAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Signature length in bytes.
    fn signature_size(&self) -> usize;

    /// Private key length in bytes.
    fn private_key_size(&self) -> usize;

    /// Public key length in bytes.
    fn public_key_size(&self) -> usize;

    /// Generate a fresh key pair into `private_key` and `public_key`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch, or
    /// `CryptoError::Failure` if key generation fails.
    fn keypair_create(
        &self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError>;

    /// Sign `message` with `private_key`, writing to `signature`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch or a
    /// malformed private key.
    fn sign(
        &self,
        signature: &mut [u8],
        private_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError>;

    /// Check `signature` over `message` against `public_key`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::VerificationFailed` if the signature is invalid.
    fn verify(
        &self,
        signature: &[u8],
        public_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError>;
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), CryptoError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CryptoError::invalid(
            Component::Signature,
            format!("{what} must be {expected} bytes, got {actual}"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Ed25519 via `ring`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519;

impl Ed25519 {
    /// Derive the private/public key pair for a 32-byte `seed`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch.
    pub fn keypair_from_seed(
        seed: &[u8],
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        check_len("seed", seed.len(), ED25519_SEED_LEN)?;
        check_len("private key", private_key.len(), ED25519_PRIVATE_KEY_LEN)?;
        check_len("public key", public_key.len(), ED25519_PUBLIC_KEY_LEN)?;

        let pair = Ed25519KeyPair::from_seed_unchecked(seed).map_err(|e| {
            CryptoError::failure(Component::Signature, format!("Ed25519 key derivation failed: {e}"))
        })?;
        let public = pair.public_key().as_ref();

        let (seed_half, public_half) = private_key.split_at_mut(ED25519_SEED_LEN);
        seed_half.copy_from_slice(seed);
        public_half.copy_from_slice(public);
        public_key.copy_from_slice(public);
        Ok(())
    }
}

impl SignatureAlgorithm for Ed25519 {
    fn name(&self) -> &'static str {
        "Ed25519"
    }

    fn signature_size(&self) -> usize {
        ED25519_SIGNATURE_LEN
    }

    fn private_key_size(&self) -> usize {
        ED25519_PRIVATE_KEY_LEN
    }

    fn public_key_size(&self) -> usize {
        ED25519_PUBLIC_KEY_LEN
    }

    fn keypair_create(
        &self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        let mut seed = Zeroizing::new([0u8; ED25519_SEED_LEN]);
        OsRng.try_fill_bytes(&mut seed[..]).map_err(|e| {
            CryptoError::failure(Component::Signature, format!("entropy source failed: {e}"))
        })?;
        Self::keypair_from_seed(&seed[..], private_key, public_key)
    }

    fn sign(
        &self,
        signature: &mut [u8],
        private_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        check_len("signature", signature.len(), ED25519_SIGNATURE_LEN)?;
        check_len("private key", private_key.len(), ED25519_PRIVATE_KEY_LEN)?;

        let (seed, public) = private_key.split_at(ED25519_SEED_LEN);
        let pair = Ed25519KeyPair::from_seed_and_public_key(seed, public).map_err(|_| {
            CryptoError::invalid(
                Component::Signature,
                "private key seed does not match its public half",
            )
        })?;
        signature.copy_from_slice(pair.sign(message).as_ref());
        Ok(())
    }

    fn verify(
        &self,
        signature: &[u8],
        public_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        check_len("signature", signature.len(), ED25519_SIGNATURE_LEN)?;
        check_len("public key", public_key.len(), ED25519_PUBLIC_KEY_LEN)?;

        UnparsedPublicKey::new(&RING_ED25519, public_key)
            .verify(message, signature)
            .map_err(|_| CryptoError::VerificationFailed(Component::Signature))
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_ed25519() -> Arc<dyn SignatureAlgorithm> {
    Arc::new(Ed25519)
}

static ED25519: Registration = Registration {
    implementation: ids::SIGNATURE_ED25519,
    features: ids::SIGNATURE_ED25519,
    factory: Factory::DigitalSignature(make_ed25519),
};

/// Register Ed25519 under [`ids::SIGNATURE_ED25519`].
pub fn register_ed25519() {
    registry::register(&ED25519);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one signature scheme. Cheap to clone.
#[derive(Clone)]
pub struct SignatureOptions {
    algorithm: Arc<dyn SignatureAlgorithm>,
    allocator: SharedAllocator,
}

impl SignatureOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such scheme is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_signature(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(
        allocator: &SharedAllocator,
        algorithm: Arc<dyn SignatureAlgorithm>,
    ) -> Self {
        Self {
            algorithm,
            allocator: Arc::clone(allocator),
        }
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Signature length in bytes.
    #[must_use]
    pub fn signature_size(&self) -> usize {
        self.algorithm.signature_size()
    }

    /// Private key length in bytes.
    #[must_use]
    pub fn private_key_size(&self) -> usize {
        self.algorithm.private_key_size()
    }

    /// Public key length in bytes.
    #[must_use]
    pub fn public_key_size(&self) -> usize {
        self.algorithm.public_key_size()
    }

    /// Allocator shared by buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Create a signing context.
    #[must_use]
    pub fn init(&self) -> SignatureContext {
        SignatureContext {
            algorithm: Arc::clone(&self.algorithm),
        }
    }

    /// Allocate a buffer sized for a signature.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn signature_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.signature_size())
    }

    /// Allocate a buffer sized for a private key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn private_key_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.private_key_size())
    }

    /// Allocate a buffer sized for a public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn public_key_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.public_key_size())
    }
}

impl fmt::Debug for SignatureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureOptions")
            .field("algorithm", &self.name())
            .finish_non_exhaustive()
    }
}

/// Signing context. Holds no key material between calls.
pub struct SignatureContext {
    algorithm: Arc<dyn SignatureAlgorithm>,
}

impl SignatureContext {
    /// Generate a key pair.
    ///
    /// # Errors
    ///
    /// See [`SignatureAlgorithm::keypair_create`].
    pub fn keypair_create(
        &mut self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        self.algorithm.keypair_create(private_key, public_key)
    }

    /// Sign `message`.
    ///
    /// # Errors
    ///
    /// See [`SignatureAlgorithm::sign`].
    pub fn sign(
        &mut self,
        signature: &mut [u8],
        private_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        self.algorithm.sign(signature, private_key, message)
    }

    /// Verify `signature` over `message`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::VerificationFailed` if the signature is invalid.
    pub fn verify(
        &mut self,
        signature: &[u8],
        public_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        self.algorithm.verify(signature, public_key, message)
    }
}

impl fmt::Debug for SignatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureContext")
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
