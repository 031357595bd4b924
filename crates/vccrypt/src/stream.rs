//! Stream cipher capability: AES-256 in counter mode.
//!
//! The 128-bit counter block is `nonce (8 bytes) || block index (8 bytes,
//! big-endian)`. A stream starts at block index zero; the 8-byte nonce travels
//! in front of the ciphertext.
//!
//! # Offsets
//!
//! [`StreamContext::encrypt`] and [`StreamContext::decrypt`] read all of
//! `input` and write it, transformed, to `output[*offset..]`, advancing
//! `*offset` by the number of bytes processed. The start calls set `*offset`
//! to the nonce length:
//!
//! - encryption writes the nonce to `output[..8]`, so the first ciphertext
//!   byte lands right after it;
//! - decryption reads the nonce from `input[..8]`, so `input[*offset..]` is
//!   the ciphertext body.
//!
//! # Resuming
//!
//! `continue_encryption` / `continue_decryption` position the keystream at an
//! absolute byte position (counted from the first byte after the nonce). The
//! resulting keystream is identical to a fresh stream that has already
//! produced that many bytes.

#![allow(clippy::arithmetic_side_effects)]

use crate::aes::{AesKey, RoundMultiplier, BLOCK_SIZE, KEY_SIZE_256};
use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use std::fmt;
use std::sync::Arc;

/// Length of the nonce that prefixes every stream.
pub const IV_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A keyed stream cipher.
pub trait StreamCipherAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Key length in bytes.
    fn key_size(&self) -> usize;

    /// IV (nonce) length in bytes.
    fn iv_size(&self) -> usize;

    /// Build a keyed state whose key schedule and counter blocks are drawn
    /// from `allocator`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::BadEncryptionKey` if the key schedule rejects `key`
    /// - `CryptoError::OutOfMemory` if `allocator` cannot hold the state
    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
    ) -> Result<Box<dyn StreamCipherState>, CryptoError>;
}

/// A keyed stream cipher state. See the module documentation for offsets.
pub trait StreamCipherState: Send {
    /// Begin a stream under `iv`, writing it to the front of `output`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` has the wrong length or
    /// `output` cannot hold it.
    fn start_encryption(
        &mut self,
        iv: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError>;

    /// Begin a stream whose IV is at the front of `input`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `input` is shorter than the IV.
    fn start_decryption(&mut self, input: &[u8], offset: &mut usize) -> Result<(), CryptoError>;

    /// Resume a stream under `iv` at keystream byte `position`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` has the wrong length.
    fn continue_encryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError>;

    /// Resume a stream under `iv` at keystream byte `position`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` has the wrong length.
    fn continue_decryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError>;

    /// Encrypt `input` into `output[*offset..]`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `output` is too short or no
    /// stream was started.
    fn encrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError>;

    /// Decrypt `input` into `output[*offset..]`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `output` is too short or no
    /// stream was started.
    fn decrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError>;
}

// ---------------------------------------------------------------------------
// AES-256-CTR
// ---------------------------------------------------------------------------

/// AES-256 in counter mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AesCtr {
    multiplier: RoundMultiplier,
}

impl AesCtr {
    /// AES-256-CTR with the given round multiplier.
    #[must_use]
    pub const fn new(multiplier: RoundMultiplier) -> Self {
        Self { multiplier }
    }

    /// Round multiplier used by the key schedule.
    #[must_use]
    pub const fn multiplier(&self) -> RoundMultiplier {
        self.multiplier
    }
}

impl StreamCipherAlgorithm for AesCtr {
    fn name(&self) -> &'static str {
        match self.multiplier {
            RoundMultiplier::Fips => "AES-256-CTR",
            RoundMultiplier::Double => "AES-256-2X-CTR",
            RoundMultiplier::Triple => "AES-256-3X-CTR",
            RoundMultiplier::Quadruple => "AES-256-4X-CTR",
        }
    }

    fn key_size(&self) -> usize {
        KEY_SIZE_256
    }

    fn iv_size(&self) -> usize {
        IV_SIZE
    }

    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
    ) -> Result<Box<dyn StreamCipherState>, CryptoError> {
        if key.len() != KEY_SIZE_256 {
            return Err(CryptoError::BadEncryptionKey(Component::Stream));
        }
        let schedule = AesKey::encryption(allocator, key, self.multiplier)
            .map_err(|e| e.for_encryption(Component::Stream))?;
        Ok(Box::new(CtrState::new(allocator, schedule)?))
    }
}

/// Counter-mode state. The key schedule and the counter and keystream blocks
/// are allocator-backed and zeroed on drop.
struct CtrState {
    key: AesKey,
    /// Counter block followed by the keystream block it encrypts to.
    blocks: Buffer,
    /// Keystream bytes already used, in `0..=16`.
    count: usize,
    started: bool,
}

impl CtrState {
    fn new(allocator: &SharedAllocator, key: AesKey) -> Result<Self, CryptoError> {
        Ok(Self {
            key,
            blocks: Buffer::for_component(allocator, 2 * BLOCK_SIZE, Component::Stream)?,
            count: 0,
            started: false,
        })
    }

    fn ctr(&mut self) -> &mut [u8] {
        &mut self.blocks[..BLOCK_SIZE]
    }

    fn load_iv(&mut self, iv: &[u8]) -> Result<(), CryptoError> {
        if iv.len() != IV_SIZE {
            return Err(CryptoError::invalid(
                Component::Stream,
                format!("iv must be {IV_SIZE} bytes, got {}", iv.len()),
            ));
        }
        self.ctr()[..IV_SIZE].copy_from_slice(iv);
        Ok(())
    }

    /// Position the keystream at byte `position` of the stream under the
    /// already-loaded nonce.
    fn seek(&mut self, position: u64) -> Result<(), CryptoError> {
        self.ctr()[IV_SIZE..].copy_from_slice(&(position / BLOCK_SIZE as u64).to_be_bytes());
        self.refill()?;
        // The remainder is below 16, so the cast is lossless.
        self.count = (position % BLOCK_SIZE as u64) as usize;
        self.started = true;
        Ok(())
    }

    /// Encrypt the counter block into the keystream block.
    fn refill(&mut self) -> Result<(), CryptoError> {
        let (ctr, stream) = self.blocks.split_at_mut(BLOCK_SIZE);
        let stream = stream
            .first_chunk_mut::<BLOCK_SIZE>()
            .ok_or_else(|| CryptoError::failure(Component::Stream, "keystream block too small"))?;
        stream.copy_from_slice(ctr);
        self.key.encrypt_block(stream);
        Ok(())
    }

    /// Big-endian increment of the whole 128-bit counter; wraps silently.
    fn increment(&mut self) {
        for byte in self.ctr().iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }

    fn apply(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        if !self.started {
            return Err(CryptoError::invalid(
                Component::Stream,
                "stream must be started or continued first",
            ));
        }
        let end = offset
            .checked_add(input.len())
            .filter(|&end| end <= output.len())
            .ok_or_else(|| {
                CryptoError::invalid(
                    Component::Stream,
                    format!(
                        "output holds {} bytes, need {} at offset {}",
                        output.len(),
                        input.len(),
                        *offset
                    ),
                )
            })?;

        for (out, byte) in output[*offset..end].iter_mut().zip(input) {
            if self.count == BLOCK_SIZE {
                self.increment();
                self.refill()?;
                self.count = 0;
            }
            *out = byte ^ self.blocks[BLOCK_SIZE + self.count];
            self.count += 1;
        }
        *offset = end;
        Ok(())
    }
}

impl StreamCipherState for CtrState {
    fn start_encryption(
        &mut self,
        iv: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        let prefix = output.get_mut(..IV_SIZE).ok_or_else(|| {
            CryptoError::invalid(Component::Stream, "output cannot hold the iv")
        })?;
        self.load_iv(iv)?;
        prefix.copy_from_slice(iv);
        self.seek(0)?;
        *offset = IV_SIZE;
        Ok(())
    }

    fn start_decryption(&mut self, input: &[u8], offset: &mut usize) -> Result<(), CryptoError> {
        let iv = input.get(..IV_SIZE).ok_or_else(|| {
            CryptoError::invalid(Component::Stream, "input is shorter than the iv")
        })?;
        self.load_iv(iv)?;
        self.seek(0)?;
        *offset = IV_SIZE;
        Ok(())
    }

    fn continue_encryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        self.load_iv(iv)?;
        self.seek(position)
    }

    fn continue_decryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        self.continue_encryption(iv, position)
    }

    fn encrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        self.apply(input, output, offset)
    }

    fn decrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        self.apply(input, output, offset)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_aes_256_ctr_fips() -> Arc<dyn StreamCipherAlgorithm> {
    Arc::new(AesCtr::new(RoundMultiplier::Fips))
}

fn make_aes_256_2x_ctr() -> Arc<dyn StreamCipherAlgorithm> {
    Arc::new(AesCtr::new(RoundMultiplier::Double))
}

fn make_aes_256_3x_ctr() -> Arc<dyn StreamCipherAlgorithm> {
    Arc::new(AesCtr::new(RoundMultiplier::Triple))
}

fn make_aes_256_4x_ctr() -> Arc<dyn StreamCipherAlgorithm> {
    Arc::new(AesCtr::new(RoundMultiplier::Quadruple))
}

static AES_256_CTR_FIPS: Registration = Registration {
    implementation: ids::STREAM_AES_256_CTR_FIPS,
    features: ids::STREAM_AES_256_CTR_FIPS,
    factory: Factory::StreamCipher(make_aes_256_ctr_fips),
};

static AES_256_2X_CTR: Registration = Registration {
    implementation: ids::STREAM_AES_256_2X_CTR,
    features: ids::STREAM_AES_256_2X_CTR,
    factory: Factory::StreamCipher(make_aes_256_2x_ctr),
};

static AES_256_3X_CTR: Registration = Registration {
    implementation: ids::STREAM_AES_256_3X_CTR,
    features: ids::STREAM_AES_256_3X_CTR,
    factory: Factory::StreamCipher(make_aes_256_3x_ctr),
};

static AES_256_4X_CTR: Registration = Registration {
    implementation: ids::STREAM_AES_256_4X_CTR,
    features: ids::STREAM_AES_256_4X_CTR,
    factory: Factory::StreamCipher(make_aes_256_4x_ctr),
};

/// Register FIPS AES-256-CTR under [`ids::STREAM_AES_256_CTR_FIPS`].
pub fn register_aes_256_ctr_fips() {
    registry::register(&AES_256_CTR_FIPS);
}

/// Register 2× AES-256-CTR under [`ids::STREAM_AES_256_2X_CTR`].
pub fn register_aes_256_2x_ctr() {
    registry::register(&AES_256_2X_CTR);
}

/// Register 3× AES-256-CTR under [`ids::STREAM_AES_256_3X_CTR`].
pub fn register_aes_256_3x_ctr() {
    registry::register(&AES_256_3X_CTR);
}

/// Register 4× AES-256-CTR under [`ids::STREAM_AES_256_4X_CTR`].
pub fn register_aes_256_4x_ctr() {
    registry::register(&AES_256_4X_CTR);
}

/// Identifier and registration entry point for a round multiplier.
#[must_use]
pub fn implementation_for(multiplier: RoundMultiplier) -> (u32, fn()) {
    match multiplier {
        RoundMultiplier::Fips => (ids::STREAM_AES_256_CTR_FIPS, register_aes_256_ctr_fips),
        RoundMultiplier::Double => (ids::STREAM_AES_256_2X_CTR, register_aes_256_2x_ctr),
        RoundMultiplier::Triple => (ids::STREAM_AES_256_3X_CTR, register_aes_256_3x_ctr),
        RoundMultiplier::Quadruple => (ids::STREAM_AES_256_4X_CTR, register_aes_256_4x_ctr),
    }
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one stream cipher. Cheap to clone.
#[derive(Clone)]
pub struct StreamOptions {
    algorithm: Arc<dyn StreamCipherAlgorithm>,
    allocator: SharedAllocator,
}

impl StreamOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such cipher is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_stream_cipher(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(
        allocator: &SharedAllocator,
        algorithm: Arc<dyn StreamCipherAlgorithm>,
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

    /// Key length in bytes.
    #[must_use]
    pub fn key_size(&self) -> usize {
        self.algorithm.key_size()
    }

    /// IV (nonce) length in bytes.
    #[must_use]
    pub fn iv_size(&self) -> usize {
        self.algorithm.iv_size()
    }

    /// Allocator shared by contexts and buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Key a new stream context. Its state is drawn from the options'
    /// allocator.
    ///
    /// # Errors
    ///
    /// - `CryptoError::BadEncryptionKey` if the key is rejected
    /// - `CryptoError::OutOfMemory` if the allocator cannot hold the state
    pub fn init(&self, key: &[u8]) -> Result<StreamContext, CryptoError> {
        Ok(StreamContext {
            state: self.algorithm.new_state(&self.allocator, key)?,
        })
    }

    /// Allocate a buffer sized for a key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn key_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.key_size())
    }

    /// Allocate a buffer sized for an IV.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn iv_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.iv_size())
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("algorithm", &self.name())
            .finish_non_exhaustive()
    }
}

/// A keyed stream cipher context.
pub struct StreamContext {
    state: Box<dyn StreamCipherState>,
}

impl StreamContext {
    /// Start encrypting under `iv`; writes the IV to `output[..8]` and sets
    /// `*offset = 8`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` is not 8 bytes.
    pub fn start_encryption(
        &mut self,
        iv: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        self.state.start_encryption(iv, output, offset)
    }

    /// Start decrypting a stream whose IV is `input[..8]`; sets `*offset = 8`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `input` is shorter than 8 bytes.
    pub fn start_decryption(&mut self, input: &[u8], offset: &mut usize) -> Result<(), CryptoError> {
        self.state.start_decryption(input, offset)
    }

    /// Resume encryption under `iv` at keystream byte `position`.
    ///
    /// After resuming, the next byte processed uses keystream byte `position`.
    /// `position` is absolute: it is never adjusted for bytes processed since
    /// an earlier start or resume, so callers resuming repeatedly must track
    /// it themselves.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` is not 8 bytes.
    pub fn continue_encryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        self.state.continue_encryption(iv, position)
    }

    /// Resume decryption under `iv` at keystream byte `position`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `iv` is not 8 bytes.
    pub fn continue_decryption(&mut self, iv: &[u8], position: u64) -> Result<(), CryptoError> {
        self.state.continue_decryption(iv, position)
    }

    /// Encrypt `input` into `output[*offset..]`, advancing `*offset`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `output` is too short or the
    /// stream was never started.
    pub fn encrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        self.state.encrypt(input, output, offset)
    }

    /// Decrypt `input` into `output[*offset..]`, advancing `*offset`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `output` is too short or the
    /// stream was never started.
    pub fn decrypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        offset: &mut usize,
    ) -> Result<(), CryptoError> {
        self.state.decrypt(input, output, offset)
    }
}

impl fmt::Debug for StreamContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamContext(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
