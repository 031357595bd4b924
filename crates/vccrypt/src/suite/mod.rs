//! Crypto suites: one algorithm per capability behind a single handle.
//!
//! This module provides:
//! - [`SuiteOptions`] — the per-capability options of one suite, with
//!   context constructors (`*_init`) and pre-sized buffer helpers
//!   (`buffer_for_*`)
//! - [`SuiteId`] / [`SuiteConfig`] — suite selection, see [`config`]
//! - [`register_velo_v1`] — registry entries required by `velo_v1`
//!
//! # `velo_v1`
//!
//! | Capability | Algorithm |
//! |---|---|
//! | hash | SHA-512 |
//! | MAC / short MAC | HMAC-SHA-512 / HMAC-SHA-512/256 |
//! | auth key agreement | Curve25519 + SHA-512 |
//! | cipher key agreement | Curve25519 + SHA-512/256 |
//! | signature | Ed25519 |
//! | PRNG | operating system |
//! | block / stream | AES-256-CBC / AES-256-CTR |
//! | key derivation | PBKDF2 over HMAC-SHA-512/256 |
//!
//! The AES round multiplier of the block and stream ciphers is FIPS unless
//! a [`SuiteConfig`] selects otherwise.
//!
//! All options of a suite share one allocator.

pub mod config;

pub use config::{SuiteConfig, SuiteId};

use std::fmt;
use std::sync::Arc;

use crate::aes::RoundMultiplier;
use crate::block::{self, BlockContext, BlockOptions};
use crate::error::CryptoError;
use crate::hash::{self, HashContext, HashOptions};
use crate::kdf::{self, KeyDerivationContext, KeyDerivationOptions};
use crate::key_agreement::{self, KeyAgreementContext, KeyAgreementOptions};
use crate::mac::{self, MacContext, MacOptions};
use crate::memory::{Buffer, SharedAllocator};
use crate::mock::MockSuite;
use crate::prng::{self, PrngContext, PrngOptions, UUID_SIZE};
use crate::registry::ids;
use crate::signature::{self, SignatureContext, SignatureOptions};
use crate::stream::{self, StreamContext, StreamOptions};

/// Register every algorithm `velo_v1` uses, with FIPS AES.
///
/// Idempotent. Suites built through [`SuiteOptions::from_config`] call this
/// themselves.
pub fn register_velo_v1() {
    hash::register_sha_2_512();
    mac::register_hmac_sha_2_512();
    mac::register_hmac_sha_2_512_256();
    key_agreement::register_curve25519_sha512();
    key_agreement::register_curve25519_sha512_256();
    signature::register_ed25519();
    prng::register_operating_system_source();
    block::register_aes_256_cbc_fips();
    stream::register_aes_256_ctr_fips();
    kdf::register_pbkdf2();
}

// ---------------------------------------------------------------------------
// Suite options
// ---------------------------------------------------------------------------

/// Options of every capability of one suite.
///
/// Immutable once built and cheap to clone; contexts created from it are
/// independent of each other.
#[derive(Clone)]
pub struct SuiteOptions {
    suite: SuiteId,
    allocator: SharedAllocator,
    hash: HashOptions,
    mac: MacOptions,
    mac_short: MacOptions,
    prng: PrngOptions,
    signature: SignatureOptions,
    auth_key_agreement: KeyAgreementOptions,
    cipher_key_agreement: KeyAgreementOptions,
    block: BlockOptions,
    stream: StreamOptions,
    key_derivation: KeyDerivationOptions,
    mock: Option<MockSuite>,
}

impl SuiteOptions {
    /// Build `suite` with its default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if an algorithm cannot be
    /// resolved.
    pub fn new(allocator: &SharedAllocator, suite: SuiteId) -> Result<Self, CryptoError> {
        Self::from_config(allocator, &SuiteConfig::for_suite(suite))
    }

    /// Build the suite described by `config`, registering what it needs.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if an algorithm cannot be
    /// resolved.
    pub fn from_config(
        allocator: &SharedAllocator,
        config: &SuiteConfig,
    ) -> Result<Self, CryptoError> {
        let options = match config.suite {
            SuiteId::VeloV1 => Self::velo_v1(allocator, config)?,
            SuiteId::Mock => Self::mock_suite(allocator),
        };
        tracing::debug!(
            suite = %config.suite,
            block = options.block.name(),
            stream = options.stream.name(),
            "crypto suite initialized"
        );
        Ok(options)
    }

    fn velo_v1(allocator: &SharedAllocator, config: &SuiteConfig) -> Result<Self, CryptoError> {
        register_velo_v1();

        let (block_id, register_block) = block::implementation_for(config.block_cipher_rounds);
        let (stream_id, register_stream) = stream::implementation_for(config.stream_cipher_rounds);
        if config.block_cipher_rounds != RoundMultiplier::Fips
            || config.stream_cipher_rounds != RoundMultiplier::Fips
        {
            tracing::debug!(
                block_rounds = u8::from(config.block_cipher_rounds),
                stream_rounds = u8::from(config.stream_cipher_rounds),
                "non-FIPS AES round multiplier selected"
            );
        }
        register_block();
        register_stream();

        Ok(Self {
            suite: SuiteId::VeloV1,
            allocator: Arc::clone(allocator),
            hash: HashOptions::new(allocator, ids::HASH_SHA_2_512)?,
            mac: MacOptions::new(allocator, ids::MAC_HMAC_SHA_2_512)?,
            mac_short: MacOptions::new(allocator, ids::MAC_HMAC_SHA_2_512_256)?,
            prng: PrngOptions::new(allocator, ids::PRNG_SOURCE_OPERATING_SYSTEM)?,
            signature: SignatureOptions::new(allocator, ids::SIGNATURE_ED25519)?,
            auth_key_agreement: KeyAgreementOptions::new(
                allocator,
                ids::KEY_AGREEMENT_CURVE25519_SHA512,
            )?,
            cipher_key_agreement: KeyAgreementOptions::new(
                allocator,
                ids::KEY_AGREEMENT_CURVE25519_SHA512_256,
            )?,
            block: BlockOptions::new(allocator, block_id)?,
            stream: StreamOptions::new(allocator, stream_id)?,
            key_derivation: KeyDerivationOptions::new(
                allocator,
                ids::KEY_DERIVATION_PBKDF2,
                ids::MAC_HMAC_SHA_2_512_256,
            )?,
            mock: None,
        })
    }

    fn mock_suite(allocator: &SharedAllocator) -> Self {
        let mock = MockSuite::new();
        let mac_short = MacOptions::with_algorithm(allocator, mock.mac_algorithm(true));
        Self {
            suite: SuiteId::Mock,
            allocator: Arc::clone(allocator),
            hash: HashOptions::with_algorithm(allocator, mock.hash_algorithm()),
            mac: MacOptions::with_algorithm(allocator, mock.mac_algorithm(false)),
            prng: PrngOptions::with_algorithm(allocator, mock.prng_algorithm()),
            signature: SignatureOptions::with_algorithm(allocator, mock.signature_algorithm()),
            auth_key_agreement: KeyAgreementOptions::with_algorithm(
                allocator,
                mock.key_agreement_algorithm(false),
            ),
            cipher_key_agreement: KeyAgreementOptions::with_algorithm(
                allocator,
                mock.key_agreement_algorithm(true),
            ),
            block: BlockOptions::with_algorithm(allocator, mock.block_algorithm()),
            stream: StreamOptions::with_algorithm(allocator, mock.stream_algorithm()),
            key_derivation: KeyDerivationOptions::with_algorithm(
                mock.key_derivation_algorithm(),
                mac_short.clone(),
            ),
            mac_short,
            mock: Some(mock),
        }
    }

    /// Which suite this is.
    #[must_use]
    pub const fn suite(&self) -> SuiteId {
        self.suite
    }

    /// Allocator shared by every capability.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Closure slots of a mock suite; `None` for real suites.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockSuite> {
        self.mock.as_ref()
    }

    // ── Per-capability options ─────────────────────────────────────

    /// Hash options.
    #[must_use]
    pub const fn hash_options(&self) -> &HashOptions {
        &self.hash
    }

    /// Full-length MAC options.
    #[must_use]
    pub const fn mac_options(&self) -> &MacOptions {
        &self.mac
    }

    /// Short MAC options.
    #[must_use]
    pub const fn mac_short_options(&self) -> &MacOptions {
        &self.mac_short
    }

    /// PRNG options.
    #[must_use]
    pub const fn prng_options(&self) -> &PrngOptions {
        &self.prng
    }

    /// Signature options.
    #[must_use]
    pub const fn signature_options(&self) -> &SignatureOptions {
        &self.signature
    }

    /// Key agreement options of the auth slot.
    #[must_use]
    pub const fn auth_key_agreement_options(&self) -> &KeyAgreementOptions {
        &self.auth_key_agreement
    }

    /// Key agreement options of the cipher slot.
    #[must_use]
    pub const fn cipher_key_agreement_options(&self) -> &KeyAgreementOptions {
        &self.cipher_key_agreement
    }

    /// Block cipher options.
    #[must_use]
    pub const fn block_options(&self) -> &BlockOptions {
        &self.block
    }

    /// Stream cipher options.
    #[must_use]
    pub const fn stream_options(&self) -> &StreamOptions {
        &self.stream
    }

    /// Key derivation options.
    #[must_use]
    pub const fn key_derivation_options(&self) -> &KeyDerivationOptions {
        &self.key_derivation
    }

    // ── Contexts ───────────────────────────────────────────────────

    /// Start a hash.
    ///
    /// # Errors
    ///
    /// Propagates state construction errors.
    pub fn hash_init(&self) -> Result<HashContext, CryptoError> {
        self.hash.init()
    }

    /// Start a full-length MAC under `key`.
    ///
    /// # Errors
    ///
    /// Propagates state construction errors.
    pub fn mac_init(&self, key: &[u8]) -> Result<MacContext, CryptoError> {
        self.mac.init(key)
    }

    /// Start a short MAC under `key`.
    ///
    /// # Errors
    ///
    /// Propagates state construction errors.
    pub fn mac_short_init(&self, key: &[u8]) -> Result<MacContext, CryptoError> {
        self.mac_short.init(key)
    }

    /// Random byte reader.
    #[must_use]
    pub fn prng_init(&self) -> PrngContext {
        self.prng.init()
    }

    /// Signature context.
    #[must_use]
    pub fn digital_signature_init(&self) -> SignatureContext {
        self.signature.init()
    }

    /// Key agreement context deriving authentication keys.
    #[must_use]
    pub fn auth_key_agreement_init(&self) -> KeyAgreementContext {
        self.auth_key_agreement.init()
    }

    /// Key agreement context deriving cipher keys.
    #[must_use]
    pub fn cipher_key_agreement_init(&self) -> KeyAgreementContext {
        self.cipher_key_agreement.init()
    }

    /// Block cipher context keyed for one direction.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a wrong key length, or a
    /// bad-key error from the key schedule.
    pub fn block_init(&self, key: &[u8], for_encryption: bool) -> Result<BlockContext, CryptoError> {
        self.block.init(key, for_encryption)
    }

    /// Stream cipher context.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a wrong key length, or a
    /// bad-key error from the key schedule.
    pub fn stream_init(&self, key: &[u8]) -> Result<StreamContext, CryptoError> {
        self.stream.init(key)
    }

    /// Key derivation context.
    #[must_use]
    pub fn key_derivation_init(&self) -> KeyDerivationContext {
        self.key_derivation.init()
    }

    // ── Buffers ────────────────────────────────────────────────────
    //
    // Each helper returns a zeroed buffer sized for one role.

    /// Hash digest.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_hash(&self) -> Result<Buffer, CryptoError> {
        self.hash.buffer()
    }

    /// Signature.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_signature(&self) -> Result<Buffer, CryptoError> {
        self.signature.signature_buffer()
    }

    /// Signing private key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_signature_private_key(&self) -> Result<Buffer, CryptoError> {
        self.signature.private_key_buffer()
    }

    /// Signing public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_signature_public_key(&self) -> Result<Buffer, CryptoError> {
        self.signature.public_key_buffer()
    }

    /// Auth key agreement private key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_auth_key_agreement_private_key(&self) -> Result<Buffer, CryptoError> {
        self.auth_key_agreement.private_key_buffer()
    }

    /// Auth key agreement public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_auth_key_agreement_public_key(&self) -> Result<Buffer, CryptoError> {
        self.auth_key_agreement.public_key_buffer()
    }

    /// Auth key agreement nonce.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_auth_key_agreement_nonce(&self) -> Result<Buffer, CryptoError> {
        self.auth_key_agreement.nonce_buffer()
    }

    /// Auth key agreement shared secret.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_auth_key_agreement_shared_secret(&self) -> Result<Buffer, CryptoError> {
        self.auth_key_agreement.shared_secret_buffer()
    }

    /// Cipher key agreement private key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_cipher_key_agreement_private_key(&self) -> Result<Buffer, CryptoError> {
        self.cipher_key_agreement.private_key_buffer()
    }

    /// Cipher key agreement public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_cipher_key_agreement_public_key(&self) -> Result<Buffer, CryptoError> {
        self.cipher_key_agreement.public_key_buffer()
    }

    /// Cipher key agreement nonce.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_cipher_key_agreement_nonce(&self) -> Result<Buffer, CryptoError> {
        self.cipher_key_agreement.nonce_buffer()
    }

    /// Cipher key agreement shared secret.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_cipher_key_agreement_shared_secret(&self) -> Result<Buffer, CryptoError> {
        self.cipher_key_agreement.shared_secret_buffer()
    }

    /// Full-length MAC output.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_mac_authentication_code(&self) -> Result<Buffer, CryptoError> {
        self.mac.buffer()
    }

    /// Short MAC output.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_mac_short_authentication_code(&self) -> Result<Buffer, CryptoError> {
        self.mac_short.buffer()
    }

    /// MAC key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_mac_private_key(&self) -> Result<Buffer, CryptoError> {
        self.mac.key_buffer()
    }

    /// Block cipher key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_block_secret_key(&self) -> Result<Buffer, CryptoError> {
        self.block.key_buffer()
    }

    /// One cipher block (also the CBC IV size).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_block(&self) -> Result<Buffer, CryptoError> {
        self.block.block_buffer()
    }

    /// Stream cipher key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_stream_secret_key(&self) -> Result<Buffer, CryptoError> {
        self.stream.key_buffer()
    }

    /// Stream cipher IV.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_stream_iv(&self) -> Result<Buffer, CryptoError> {
        self.stream.iv_buffer()
    }

    /// UUID (16 bytes).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer_for_uuid(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, UUID_SIZE)
    }
}

impl fmt::Debug for SuiteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteOptions")
            .field("suite", &self.suite)
            .field("hash", &self.hash.name())
            .field("mac", &self.mac.name())
            .field("mac_short", &self.mac_short.name())
            .field("signature", &self.signature.name())
            .field("block", &self.block.name())
            .field("stream", &self.stream.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
