//! Closure-driven test double for the `mock` suite.
//!
//! This module provides:
//! - [`MockOp`] — one operation slot, either [`MockOp::NotMocked`] or a
//!   caller-installed closure
//! - [`MockSuite`] — the shared slot table, with one `add_*` installer per
//!   operation
//!
//! Every capability of a mock suite is backed by an algorithm that forwards
//! to its slot. Calling an operation whose slot is empty fails with
//! [`CryptoError::MockNotAdded`] naming the operation. Sizes advertised by
//! the mock algorithms are those of `velo_v1`, so suite buffer helpers work
//! unchanged.
//!
//! Slots may be installed or replaced at any time, including after contexts
//! have been created; each call reads the slot it needs.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::aes::{BLOCK_SIZE as AES_BLOCK_SIZE, KEY_SIZE_256};
use crate::block::{BlockCipherAlgorithm, BlockCipherState};
use crate::error::CryptoError;
use crate::hash::{HashAlgorithm, HashState};
use crate::kdf::KeyDerivationAlgorithm;
use crate::key_agreement::{KeyAgreementAlgorithm, X25519_PRIVATE_KEY_LEN, X25519_PUBLIC_KEY_LEN};
use crate::mac::{MacAlgorithm, MacOptions, MacState};
use crate::memory::SharedAllocator;
use crate::prng::PrngAlgorithm;
use crate::sha2::{self, Sha2Variant};
use crate::signature::{
    SignatureAlgorithm, ED25519_PRIVATE_KEY_LEN, ED25519_PUBLIC_KEY_LEN, ED25519_SIGNATURE_LEN,
};
use crate::stream::{StreamCipherAlgorithm, StreamCipherState, IV_SIZE as CTR_IV_SIZE};

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Closure consuming input bytes (hash/MAC digest).
pub type DigestFn = dyn Fn(&[u8]) -> Result<(), CryptoError> + Send + Sync;
/// Closure filling an output buffer (finalize, PRNG read).
pub type FillFn = dyn Fn(&mut [u8]) -> Result<(), CryptoError> + Send + Sync;
/// Block operation: `(iv, input, output)`.
pub type BlockFn = dyn Fn(&[u8], &[u8], &mut [u8]) -> Result<(), CryptoError> + Send + Sync;
/// Stream operation writing at an offset: `(input_or_iv, output, offset)`.
pub type StreamWriteFn =
    dyn Fn(&[u8], &mut [u8], &mut usize) -> Result<(), CryptoError> + Send + Sync;
/// Stream decryption start: `(input, offset)`.
pub type StreamStartFn = dyn Fn(&[u8], &mut usize) -> Result<(), CryptoError> + Send + Sync;
/// Stream continuation: `(iv, position)`.
pub type StreamContinueFn = dyn Fn(&[u8], u64) -> Result<(), CryptoError> + Send + Sync;
/// Key pair generation: `(private_key, public_key)`.
pub type KeypairFn = dyn Fn(&mut [u8], &mut [u8]) -> Result<(), CryptoError> + Send + Sync;
/// Signing: `(signature, private_key, message)`.
pub type SignFn = dyn Fn(&mut [u8], &[u8], &[u8]) -> Result<(), CryptoError> + Send + Sync;
/// Verification: `(signature, public_key, message)`.
pub type VerifyFn = dyn Fn(&[u8], &[u8], &[u8]) -> Result<(), CryptoError> + Send + Sync;
/// Long-term secret: `(my_private, their_public, shared)`.
pub type LongTermFn = dyn Fn(&[u8], &[u8], &mut [u8]) -> Result<(), CryptoError> + Send + Sync;
/// Short-term secret: `(my_private, their_public, nonce_a, nonce_b, shared)`.
pub type ShortTermFn =
    dyn Fn(&[u8], &[u8], &[u8], &[u8], &mut [u8]) -> Result<(), CryptoError> + Send + Sync;
/// Key derivation: `(derived_key, password, salt, rounds)`.
pub type DeriveFn = dyn Fn(&mut [u8], &[u8], &[u8], u32) -> Result<(), CryptoError> + Send + Sync;

/// One mockable operation.
pub enum MockOp<F: ?Sized> {
    /// No closure installed; calls fail with `MockNotAdded`.
    NotMocked,
    /// Calls are forwarded to this closure.
    Mocked(Arc<F>),
}

impl<F: ?Sized> MockOp<F> {
    /// Whether a closure is installed.
    #[must_use]
    pub const fn is_mocked(&self) -> bool {
        matches!(self, Self::Mocked(_))
    }
}

impl<F: ?Sized> Default for MockOp<F> {
    fn default() -> Self {
        Self::NotMocked
    }
}

impl<F: ?Sized> Clone for MockOp<F> {
    fn clone(&self) -> Self {
        match self {
            Self::NotMocked => Self::NotMocked,
            Self::Mocked(f) => Self::Mocked(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized> fmt::Debug for MockOp<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotMocked => "NotMocked",
            Self::Mocked(_) => "Mocked",
        })
    }
}

#[derive(Default)]
struct Slots {
    hash_digest: MockOp<DigestFn>,
    hash_finalize: MockOp<FillFn>,

    mac_digest: MockOp<DigestFn>,
    mac_finalize: MockOp<FillFn>,
    mac_short_digest: MockOp<DigestFn>,
    mac_short_finalize: MockOp<FillFn>,

    block_encrypt: MockOp<BlockFn>,
    block_decrypt: MockOp<BlockFn>,

    stream_start_encryption: MockOp<StreamWriteFn>,
    stream_start_decryption: MockOp<StreamStartFn>,
    stream_continue_encryption: MockOp<StreamContinueFn>,
    stream_continue_decryption: MockOp<StreamContinueFn>,
    stream_encrypt: MockOp<StreamWriteFn>,
    stream_decrypt: MockOp<StreamWriteFn>,

    signature_keypair_create: MockOp<KeypairFn>,
    signature_sign: MockOp<SignFn>,
    signature_verify: MockOp<VerifyFn>,

    auth_keypair_create: MockOp<KeypairFn>,
    auth_long_term_secret_create: MockOp<LongTermFn>,
    auth_short_term_secret_create: MockOp<ShortTermFn>,

    cipher_keypair_create: MockOp<KeypairFn>,
    cipher_long_term_secret_create: MockOp<LongTermFn>,
    cipher_short_term_secret_create: MockOp<ShortTermFn>,

    prng_read: MockOp<FillFn>,

    key_derivation_derive: MockOp<DeriveFn>,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Shared slot table of a mock suite. Clones share the same slots.
#[derive(Clone, Default)]
pub struct MockSuite {
    slots: Arc<RwLock<Slots>>,
}

macro_rules! mock_installer {
    ($(#[$doc:meta])* $method:ident, $slot:ident, ($($arg:ty),*)) => {
        $(#[$doc])*
        pub fn $method(
            &self,
            op: impl Fn($($arg),*) -> Result<(), CryptoError> + Send + Sync + 'static,
        ) {
            self.write().$slot = MockOp::Mocked(Arc::new(op));
        }
    };
}

impl MockSuite {
    /// Empty slot table: every operation is `NotMocked`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn get<F: ?Sized>(
        &self,
        operation: &'static str,
        pick: impl FnOnce(&Slots) -> &MockOp<F>,
    ) -> Result<Arc<F>, CryptoError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match pick(&slots) {
            MockOp::Mocked(op) => Ok(Arc::clone(op)),
            MockOp::NotMocked => {
                tracing::trace!(operation, "mock operation called without a closure");
                Err(CryptoError::MockNotAdded(operation))
            }
        }
    }

    /// Remove every installed closure.
    pub fn clear(&self) {
        *self.write() = Slots::default();
    }

    mock_installer!(/// Mock `HashContext::digest`.
        add_hash_digest, hash_digest, (&[u8]));
    mock_installer!(/// Mock `HashContext::finalize`.
        add_hash_finalize, hash_finalize, (&mut [u8]));

    mock_installer!(/// Mock `MacContext::digest` of the full-length MAC.
        add_mac_digest, mac_digest, (&[u8]));
    mock_installer!(/// Mock `MacContext::finalize` of the full-length MAC.
        add_mac_finalize, mac_finalize, (&mut [u8]));
    mock_installer!(/// Mock `MacContext::digest` of the short MAC.
        add_mac_short_digest, mac_short_digest, (&[u8]));
    mock_installer!(/// Mock `MacContext::finalize` of the short MAC.
        add_mac_short_finalize, mac_short_finalize, (&mut [u8]));

    mock_installer!(/// Mock `BlockContext::encrypt`.
        add_block_encrypt, block_encrypt, (&[u8], &[u8], &mut [u8]));
    mock_installer!(/// Mock `BlockContext::decrypt`.
        add_block_decrypt, block_decrypt, (&[u8], &[u8], &mut [u8]));

    mock_installer!(/// Mock `StreamContext::start_encryption`.
        add_stream_start_encryption, stream_start_encryption, (&[u8], &mut [u8], &mut usize));
    mock_installer!(/// Mock `StreamContext::start_decryption`.
        add_stream_start_decryption, stream_start_decryption, (&[u8], &mut usize));
    mock_installer!(/// Mock `StreamContext::continue_encryption`.
        add_stream_continue_encryption, stream_continue_encryption, (&[u8], u64));
    mock_installer!(/// Mock `StreamContext::continue_decryption`.
        add_stream_continue_decryption, stream_continue_decryption, (&[u8], u64));
    mock_installer!(/// Mock `StreamContext::encrypt`.
        add_stream_encrypt, stream_encrypt, (&[u8], &mut [u8], &mut usize));
    mock_installer!(/// Mock `StreamContext::decrypt`.
        add_stream_decrypt, stream_decrypt, (&[u8], &mut [u8], &mut usize));

    mock_installer!(/// Mock `SignatureContext::keypair_create`.
        add_signature_keypair_create, signature_keypair_create, (&mut [u8], &mut [u8]));
    mock_installer!(/// Mock `SignatureContext::sign`.
        add_signature_sign, signature_sign, (&mut [u8], &[u8], &[u8]));
    mock_installer!(/// Mock `SignatureContext::verify`.
        add_signature_verify, signature_verify, (&[u8], &[u8], &[u8]));

    mock_installer!(/// Mock key pair creation of the auth key agreement.
        add_auth_keypair_create, auth_keypair_create, (&mut [u8], &mut [u8]));
    mock_installer!(/// Mock the long-term secret of the auth key agreement.
        add_auth_long_term_secret_create, auth_long_term_secret_create,
        (&[u8], &[u8], &mut [u8]));
    mock_installer!(/// Mock the short-term secret of the auth key agreement.
        add_auth_short_term_secret_create, auth_short_term_secret_create,
        (&[u8], &[u8], &[u8], &[u8], &mut [u8]));

    mock_installer!(/// Mock key pair creation of the cipher key agreement.
        add_cipher_keypair_create, cipher_keypair_create, (&mut [u8], &mut [u8]));
    mock_installer!(/// Mock the long-term secret of the cipher key agreement.
        add_cipher_long_term_secret_create, cipher_long_term_secret_create,
        (&[u8], &[u8], &mut [u8]));
    mock_installer!(/// Mock the short-term secret of the cipher key agreement.
        add_cipher_short_term_secret_create, cipher_short_term_secret_create,
        (&[u8], &[u8], &[u8], &[u8], &mut [u8]));

    mock_installer!(/// Mock `PrngContext::read`.
        add_prng_read, prng_read, (&mut [u8]));

    mock_installer!(/// Mock `KeyDerivationContext::derive`.
        add_key_derivation_derive, key_derivation_derive, (&mut [u8], &[u8], &[u8], u32));

    // Algorithms wired to this slot table, one per suite capability.

    pub(crate) fn hash_algorithm(&self) -> Arc<dyn HashAlgorithm> {
        Arc::new(MockHash { mock: self.clone() })
    }

    pub(crate) fn mac_algorithm(&self, short: bool) -> Arc<dyn MacAlgorithm> {
        Arc::new(MockMac {
            mock: self.clone(),
            short,
        })
    }

    pub(crate) fn block_algorithm(&self) -> Arc<dyn BlockCipherAlgorithm> {
        Arc::new(MockBlock { mock: self.clone() })
    }

    pub(crate) fn stream_algorithm(&self) -> Arc<dyn StreamCipherAlgorithm> {
        Arc::new(MockStream { mock: self.clone() })
    }

    pub(crate) fn signature_algorithm(&self) -> Arc<dyn SignatureAlgorithm> {
        Arc::new(MockSignature { mock: self.clone() })
    }

    pub(crate) fn key_agreement_algorithm(&self, cipher: bool) -> Arc<dyn KeyAgreementAlgorithm> {
        Arc::new(MockKeyAgreement {
            mock: self.clone(),
            cipher,
        })
    }

    pub(crate) fn prng_algorithm(&self) -> Arc<dyn PrngAlgorithm> {
        Arc::new(MockPrng { mock: self.clone() })
    }

    pub(crate) fn key_derivation_algorithm(&self) -> Arc<dyn KeyDerivationAlgorithm> {
        Arc::new(MockKeyDerivation { mock: self.clone() })
    }
}

impl fmt::Debug for MockSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSuite").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Hash and MAC
// ---------------------------------------------------------------------------

struct MockHash {
    mock: MockSuite,
}

impl HashAlgorithm for MockHash {
    fn name(&self) -> &'static str {
        "mock-hash"
    }

    fn digest_size(&self) -> usize {
        Sha2Variant::Sha512.digest_size()
    }

    fn block_size(&self) -> usize {
        sha2::BLOCK_SIZE
    }

    fn new_state(&self, _allocator: &SharedAllocator) -> Result<Box<dyn HashState>, CryptoError> {
        Ok(Box::new(MockHashState {
            mock: self.mock.clone(),
        }))
    }
}

struct MockHashState {
    mock: MockSuite,
}

impl HashState for MockHashState {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        let op = self.mock.get("hash_digest", |s| &s.hash_digest)?;
        op(data)
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let op = self.mock.get("hash_finalize", |s| &s.hash_finalize)?;
        op(out)
    }

    fn reset(&mut self) {}
}

struct MockMac {
    mock: MockSuite,
    short: bool,
}

impl MacAlgorithm for MockMac {
    fn name(&self) -> &'static str {
        if self.short {
            "mock-mac-short"
        } else {
            "mock-mac"
        }
    }

    fn mac_size(&self) -> usize {
        if self.short {
            Sha2Variant::Sha512_256.digest_size()
        } else {
            Sha2Variant::Sha512.digest_size()
        }
    }

    fn key_size(&self) -> usize {
        self.mac_size()
    }

    fn new_state(
        &self,
        _allocator: &SharedAllocator,
        _key: &[u8],
    ) -> Result<Box<dyn MacState>, CryptoError> {
        Ok(Box::new(MockMacState {
            mock: self.mock.clone(),
            short: self.short,
        }))
    }
}

struct MockMacState {
    mock: MockSuite,
    short: bool,
}

impl MacState for MockMacState {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        let op = if self.short {
            self.mock.get("mac_short_digest", |s| &s.mac_short_digest)?
        } else {
            self.mock.get("mac_digest", |s| &s.mac_digest)?
        };
        op(data)
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let op = if self.short {
            self.mock.get("mac_short_finalize", |s| &s.mac_short_finalize)?
        } else {
            self.mock.get("mac_finalize", |s| &s.mac_finalize)?
        };
        op(out)
    }
}

// ---------------------------------------------------------------------------
// Ciphers
// ---------------------------------------------------------------------------

struct MockBlock {
    mock: MockSuite,
}

impl BlockCipherAlgorithm for MockBlock {
    fn name(&self) -> &'static str {
        "mock-block"
    }

    fn key_size(&self) -> usize {
        KEY_SIZE_256
    }

    fn iv_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn new_state(
        &self,
        _allocator: &SharedAllocator,
        _key: &[u8],
        _for_encryption: bool,
    ) -> Result<Box<dyn BlockCipherState>, CryptoError> {
        Ok(Box::new(MockBlockState {
            mock: self.mock.clone(),
        }))
    }
}

struct MockBlockState {
    mock: MockSuite,
}

impl BlockCipherState for MockBlockState {
    fn encrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        let op = self.mock.get("block_encrypt", |s| &s.block_encrypt)?;
        op(iv, input, output)
    }

    fn decrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        let op = self.mock.get("block_decrypt", |s| &s.block_decrypt)?;
        op(iv, input, output)
    }
}

struct MockStream {
    mock: MockSuite,
}

impl StreamCipherAlgorithm for MockStream {
    fn name(&self) -> &'static str {
        "mock-stream"
    }

    fn key_size(&self) -> usize {
        KEY_SIZE_256
    }

    fn iv_size(&self) -> usize {
        CTR_IV_SIZE
    }

    fn new_state(
        &self,
        _allocator: &SharedAllocator,
        _key: &[u8],
    ) -> Result<Box<dyn StreamCipherState>, CryptoError> {
        Ok(Box::new(MockStreamState {
            mock: self.mock.clone(),
        }))
    }
}

struct MockStreamState {
    mock: MockSuite,
}

impl StreamCipherState for MockStreamState {
    fn start_encryption(
        &mut self,
        iv: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        let op = self
            .mock
            .get("stream_start_encryption", |s| &s.stream_start_encryption)?;
        op(iv, output, offset)
    }

    fn start_decryption(&mut self, input: &[u8], offset: &mut usize) -> Result<(), CryptoError> {
        let op = self
            .mock
            .get("stream_start_decryption", |s| &s.stream_start_decryption)?;
        op(input, offset)
    }

    fn continue_encryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        let op = self
            .mock
            .get("stream_continue_encryption", |s| &s.stream_continue_encryption)?;
        op(iv, position)
    }

    fn continue_decryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        let op = self
            .mock
            .get("stream_continue_decryption", |s| &s.stream_continue_decryption)?;
        op(iv, position)
    }

    fn encrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        let op = self.mock.get("stream_encrypt", |s| &s.stream_encrypt)?;
        op(input, output, offset)
    }

    fn decrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        let op = self.mock.get("stream_decrypt", |s| &s.stream_decrypt)?;
        op(input, output, offset)
    }
}

// ---------------------------------------------------------------------------
// Asymmetric
// ---------------------------------------------------------------------------

struct MockSignature {
    mock: MockSuite,
}

impl SignatureAlgorithm for MockSignature {
    fn name(&self) -> &'static str {
        "mock-signature"
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
        let op = self
            .mock
            .get("signature_keypair_create", |s| &s.signature_keypair_create)?;
        op(private_key, public_key)
    }

    fn sign(
        &self,
        signature: &mut [u8],
        private_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        let op = self.mock.get("signature_sign", |s| &s.signature_sign)?;
        op(signature, private_key, message)
    }

    fn verify(
        &self,
        signature: &[u8],
        public_key: &[u8],
        message: &[u8],
    ) -> Result<(), CryptoError> {
        let op = self.mock.get("signature_verify", |s| &s.signature_verify)?;
        op(signature, public_key, message)
    }
}

struct MockKeyAgreement {
    mock: MockSuite,
    cipher: bool,
}

impl KeyAgreementAlgorithm for MockKeyAgreement {
    fn name(&self) -> &'static str {
        if self.cipher {
            "mock-cipher-key-agreement"
        } else {
            "mock-auth-key-agreement"
        }
    }

    fn private_key_size(&self) -> usize {
        X25519_PRIVATE_KEY_LEN
    }

    fn public_key_size(&self) -> usize {
        X25519_PUBLIC_KEY_LEN
    }

    fn shared_secret_size(&self) -> usize {
        if self.cipher {
            Sha2Variant::Sha512_256.digest_size()
        } else {
            Sha2Variant::Sha512.digest_size()
        }
    }

    fn nonce_size(&self) -> usize {
        self.shared_secret_size()
    }

    fn keypair_create(
        &self,
        private_key: &mut [u8],
        public_key: &mut [u8],
    ) -> Result<(), CryptoError> {
        let op = if self.cipher {
            self.mock
                .get("cipher_keypair_create", |s| &s.cipher_keypair_create)?
        } else {
            self.mock.get("auth_keypair_create", |s| &s.auth_keypair_create)?
        };
        op(private_key, public_key)
    }

    fn long_term_secret_create(
        &self,
        _allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        let op = if self.cipher {
            self.mock.get("cipher_long_term_secret_create", |s| {
                &s.cipher_long_term_secret_create
            })?
        } else {
            self.mock.get("auth_long_term_secret_create", |s| {
                &s.auth_long_term_secret_create
            })?
        };
        op(my_private, their_public, shared)
    }

    fn short_term_secret_create(
        &self,
        _allocator: &SharedAllocator,
        my_private: &[u8],
        their_public: &[u8],
        nonce_a: &[u8],
        nonce_b: &[u8],
        shared: &mut [u8],
    ) -> Result<(), CryptoError> {
        let op = if self.cipher {
            self.mock.get("cipher_short_term_secret_create", |s| {
                &s.cipher_short_term_secret_create
            })?
        } else {
            self.mock.get("auth_short_term_secret_create", |s| {
                &s.auth_short_term_secret_create
            })?
        };
        op(my_private, their_public, nonce_a, nonce_b, shared)
    }
}

// ---------------------------------------------------------------------------
// PRNG and key derivation
// ---------------------------------------------------------------------------

struct MockPrng {
    mock: MockSuite,
}

impl PrngAlgorithm for MockPrng {
    fn name(&self) -> &'static str {
        "mock-prng"
    }

    fn read(&self, out: &mut [u8]) -> Result<(), CryptoError> {
        let op = self.mock.get("prng_read", |s| &s.prng_read)?;
        op(out)
    }
}

struct MockKeyDerivation {
    mock: MockSuite,
}

impl KeyDerivationAlgorithm for MockKeyDerivation {
    fn name(&self) -> &'static str {
        "mock-key-derivation"
    }

    fn derive(
        &self,
        _prf: &MacOptions,
        derived_key: &mut [u8],
        password: &[u8],
        salt: &[u8],
        rounds: u32,
    ) -> Result<(), CryptoError> {
        let op = self
            .mock
            .get("key_derivation_derive", |s| &s.key_derivation_derive)?;
        op(derived_key, password, salt, rounds)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
