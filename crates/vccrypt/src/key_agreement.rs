//! Key agreement capability: Curve25519 with hashed output.
//!
//! This module provides:
//! - [`KeyAgreementAlgorithm`] — the capability contract
//! - [`Curve25519Agreement`] — X25519 (via `x25519-dalek`) hashed with a
//!   SHA-512 family member
//! - [`KeyAgreementOptions`] / [`KeyAgreementContext`] — facade types
//!
//! # Secrets
//!
//! - Long-term: `H(X25519(my_private, their_public))`
//! - Short-term: `HMAC_H(long_term, nonce_a || nonce_b)`
//!
//! Both parties pass the nonces in the same order (initiator first), so the
//! short-term secret is symmetric. The all-zero DH output produced by
//! low-order public keys is rejected.

use crate::error::{Component, CryptoError};
use crate::hash::{Sha2Algorithm, Sha2Variant};
use crate::mac::{Hmac, MacAlgorithm};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use crate::sha2::Sha512State;
use rand::rngs::OsRng;
use std::fmt;
use std::sync::Arc;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// X25519 private key length in bytes.
pub const X25519_PRIVATE_KEY_LEN: usize = 32;

/// X25519 public key length in bytes.
pub const X25519_PUBLIC_KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A key agreement scheme with long-term and nonce-bound short-term secrets.
pub trait KeyAgreementAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Private key length in bytes.
    fn private_key_size(&self) -> usize;

    /// Public key length in bytes.
    fn public_key_size(&self) -> usize;

    /// Shared secret length in bytes.
    fn shared_secret_size(&self) -> usize;

    /// Length of each party's nonce in bytes.
    fn nonce_size(&self) -> usize;

    /// Generate a key pair.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch.
    fn keypair_create(
        &self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError>;

    /// Derive the long-term secret shared with `their_public`. Working
    /// state is drawn from `allocator`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidArgument` on a size mismatch or a low-order
    ///   peer key
    /// - `CryptoError::OutOfMemory` if `allocator` cannot hold the state
    fn long_term_secret_create(
        &self,
        allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError>;

    /// Derive a session secret bound to both nonces.
    ///
    /// # Errors
    ///
    /// Same as [`KeyAgreementAlgorithm::long_term_secret_create`], plus
    /// `CryptoError::InvalidArgument` if a nonce has the wrong length.
    fn short_term_secret_create(
        &self,
        allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        nonce_a: &[u8],
        nonce_b: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError>;
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), CryptoError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CryptoError::invalid(
            Component::KeyAgreement,
            format!("{what} must be {expected} bytes, got {actual}"),
        ))
    }
}

/// Report a hash or MAC state allocation failure against key agreement.
fn within_agreement(err: CryptoError) -> CryptoError {
    match err {
        CryptoError::OutOfMemory(_) => CryptoError::OutOfMemory(Component::KeyAgreement),
        other => other,
    }
}

fn to_key_array(what: &str, bytes: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    check_len(what, bytes.len(), 32)?;
    let mut array = Zeroizing::new([0u8; 32]);
    array.copy_from_slice(bytes);
    Ok(array)
}

// ---------------------------------------------------------------------------
// Curve25519
// ---------------------------------------------------------------------------

/// X25519 Diffie-Hellman with the raw output hashed by a SHA-512 variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Curve25519Agreement {
    variant: Sha2Variant,
}

impl Curve25519Agreement {
    /// Agreement whose secrets are hashed with `variant`.
    #[must_use]
    pub const fn new(variant: Sha2Variant) -> Self {
        Self { variant }
    }
}

impl KeyAgreementAlgorithm for Curve25519Agreement {
    fn name(&self) -> &'static str {
        match self.variant {
            Sha2Variant::Sha384 => "Curve25519-SHA384",
            Sha2Variant::Sha512 => "Curve25519-SHA512",
            Sha2Variant::Sha512_256 => "Curve25519-SHA512/256",
        }
    }

    fn private_key_size(&self) -> usize {
        X25519_PRIVATE_KEY_LEN
    }

    fn public_key_size(&self) -> usize {
        X25519_PUBLIC_KEY_LEN
    }

    fn shared_secret_size(&self) -> usize {
        self.variant.digest_size()
    }

    fn nonce_size(&self) -> usize {
        self.variant.digest_size()
    }

    fn keypair_create(
        &self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        check_len("private key", private_key.len(), X25519_PRIVATE_KEY_LEN)?;
        check_len("public key", public_key.len(), X25519_PUBLIC_KEY_LEN)?;

        // StaticSecret zeroizes itself on drop.
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        let secret_bytes = Zeroizing::new(secret.to_bytes());
        private_key.copy_from_slice(&secret_bytes[..]);
        public_key.copy_from_slice(public.as_bytes());
        Ok(())
    }

    fn long_term_secret_create(
        &self,
        allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        check_len("shared secret", shared.len(), self.shared_secret_size())?;
        let secret = StaticSecret::from(*to_key_array("private key", my_private)?);
        let peer = PublicKey::from(*to_key_array("public key", their_public)?);

        let dh = secret.diffie_hellman(&peer);
        if !dh.was_contributory() {
            return Err(CryptoError::invalid(
                Component::KeyAgreement,
                "peer public key yields a non-contributory shared point",
            ));
        }

        let mut hash = Sha512State::new(allocator, self.variant).map_err(within_agreement)?;
        hash.update(dh.as_bytes());
        hash.finalize(shared)
    }

    fn short_term_secret_create(
        &self,
        allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        nonce_a: &[u8],
        nonce_b: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        check_len("shared secret", shared.len(), self.shared_secret_size())?;
        check_len("nonce", nonce_a.len(), self.nonce_size())?;
        check_len("nonce", nonce_b.len(), self.nonce_size())?;

        let mut long_term = Buffer::for_component(
            allocator,
            self.shared_secret_size(),
            Component::KeyAgreement,
        )?;
        self.long_term_secret_create(allocator, my_private, their_public, &mut long_term)?;

        let hmac = Hmac::new(self.name(), Arc::new(Sha2Algorithm::new(self.variant)));
        let mut mac = hmac
            .new_state(allocator, &long_term)
            .map_err(within_agreement)?;
        mac.update(nonce_a)?;
        mac.update(nonce_b)?;
        mac.finalize(shared)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_curve25519_sha512() -> Arc<dyn KeyAgreementAlgorithm> {
    Arc::new(Curve25519Agreement::new(Sha2Variant::Sha512))
}

fn make_curve25519_sha512_256() -> Arc<dyn KeyAgreementAlgorithm> {
    Arc::new(Curve25519Agreement::new(Sha2Variant::Sha512_256))
}

static CURVE25519_SHA512: Registration = Registration {
    implementation: ids::KEY_AGREEMENT_CURVE25519_SHA512,
    features: ids::KEY_AGREEMENT_CURVE25519_SHA512,
    factory: Factory::KeyAgreement(make_curve25519_sha512),
};

static CURVE25519_SHA512_256: Registration = Registration {
    implementation: ids::KEY_AGREEMENT_CURVE25519_SHA512_256,
    features: ids::KEY_AGREEMENT_CURVE25519_SHA512_256,
    factory: Factory::KeyAgreement(make_curve25519_sha512_256),
};

/// Register Curve25519/SHA-512 under [`ids::KEY_AGREEMENT_CURVE25519_SHA512`].
pub fn register_curve25519_sha512() {
    registry::register(&CURVE25519_SHA512);
}

/// Register Curve25519/SHA-512/256 under
/// [`ids::KEY_AGREEMENT_CURVE25519_SHA512_256`].
pub fn register_curve25519_sha512_256() {
    registry::register(&CURVE25519_SHA512_256);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one key agreement scheme. Cheap to clone.
#[derive(Clone)]
pub struct KeyAgreementOptions {
    algorithm: Arc<dyn KeyAgreementAlgorithm>,
    allocator: SharedAllocator,
}

impl KeyAgreementOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such scheme is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_key_agreement(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(
        allocator: &SharedAllocator,
        algorithm: Arc<dyn KeyAgreementAlgorithm>,
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

    /// Shared secret length in bytes.
    #[must_use]
    pub fn shared_secret_size(&self) -> usize {
        self.algorithm.shared_secret_size()
    }

    /// Nonce length in bytes.
    #[must_use]
    pub fn nonce_size(&self) -> usize {
        self.algorithm.nonce_size()
    }

    /// Allocator shared by buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Create an agreement context. Secret derivation draws its working
    /// state from the options' allocator.
    #[must_use]
    pub fn init(&self) -> KeyAgreementContext {
        KeyAgreementContext {
            algorithm: Arc::clone(&self.algorithm),
            allocator: Arc::clone(&self.allocator),
        }
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

    /// Allocate a buffer sized for a shared secret.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn shared_secret_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.shared_secret_size())
    }

    /// Allocate a buffer sized for a nonce.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn nonce_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.nonce_size())
    }
}

impl fmt::Debug for KeyAgreementOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAgreementOptions")
            .field("algorithm", &self.name())
            .finish_non_exhaustive()
    }
}

/// Key agreement context. Holds no key material between calls.
pub struct KeyAgreementContext {
    algorithm: Arc<dyn KeyAgreementAlgorithm>,
    allocator: SharedAllocator,
}

impl KeyAgreementContext {
    /// Generate a key pair.
    ///
    /// # Errors
    ///
    /// See [`KeyAgreementAlgorithm::keypair_create`].
    pub fn keypair_create(
        &mut self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        self.algorithm.keypair_create(private_key, public_key)
    }

    /// Derive the long-term secret.
    ///
    /// # Errors
    ///
    /// See [`KeyAgreementAlgorithm::long_term_secret_create`].
    pub fn long_term_secret_create(
        &mut self,
        my_private: &[u8],
        their_public: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        self.algorithm
            .long_term_secret_create(&self.allocator, my_private, their_public, shared)
    }

    /// Derive a nonce-bound short-term secret. Both parties pass the nonces
    /// in the same order.
    ///
    /// # Errors
    ///
    /// See [`KeyAgreementAlgorithm::short_term_secret_create`].
    pub fn short_term_secret_create(
        &mut self,
        my_private: &[u8],
        their_public: &[u8],
        nonce_a: &[u8],
        nonce_b: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        self.algorithm.short_term_secret_create(
            &self.allocator,
            my_private,
            their_public,
            nonce_a,
            nonce_b,
            shared,
        )
    }
}

impl fmt::Debug for KeyAgreementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAgreementContext")
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
