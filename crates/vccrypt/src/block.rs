//! Block cipher capability: single-block AES-256-CBC.
//!
//! The facade keeps no chaining register. Each call takes an explicit IV (the
//! previous ciphertext block when chaining) and transforms exactly one
//! 16-byte block, so padding, framing and streaming policy stay with the
//! caller:
//!
//! - encrypt: `out = AES_encrypt(key, input XOR iv)`
//! - decrypt: `out = AES_decrypt(key, input) XOR iv`
//!
//! One registration exists per AES round multiplier; only the FIPS variant is
//! standard AES.

use crate::aes::{AesKey, RoundMultiplier, BLOCK_SIZE, KEY_SIZE_256};
use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A keyed single-block cipher.
pub trait BlockCipherAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Key length in bytes.
    fn key_size(&self) -> usize;

    /// IV length in bytes.
    fn iv_size(&self) -> usize;

    /// Block length in bytes.
    fn block_size(&self) -> usize;

    /// Build a keyed state for one direction. Key schedules and working
    /// blocks are drawn from `allocator`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::BadEncryptionKey` / `BadDecryptionKey` if the key
    ///   schedule rejects `key`
    /// - `CryptoError::OutOfMemory` if `allocator` cannot hold the state
    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
        for_encryption: bool,
    ) -> Result<Box<dyn BlockCipherState>, CryptoError>;
}

/// A keyed single-block cipher state.
///
/// Callers guarantee that `iv`, `input` and `output` are exactly one block;
/// [`BlockContext`] checks this before dispatching.
pub trait BlockCipherState: Send {
    /// Encrypt one block.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if the state was keyed for
    /// decryption.
    fn encrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError>;

    /// Decrypt one block.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if the state was keyed for
    /// encryption.
    fn decrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError>;
}

// ---------------------------------------------------------------------------
// AES-256-CBC
// ---------------------------------------------------------------------------

/// AES-256 in caller-chained CBC mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AesCbc {
    multiplier: RoundMultiplier,
}

impl AesCbc {
    /// AES-256-CBC with the given round multiplier.
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

impl BlockCipherAlgorithm for AesCbc {
    fn name(&self) -> &'static str {
        match self.multiplier {
            RoundMultiplier::Fips => "AES-256-CBC",
            RoundMultiplier::Double => "AES-256-2X-CBC",
            RoundMultiplier::Triple => "AES-256-3X-CBC",
            RoundMultiplier::Quadruple => "AES-256-4X-CBC",
        }
    }

    fn key_size(&self) -> usize {
        KEY_SIZE_256
    }

    fn iv_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
        for_encryption: bool,
    ) -> Result<Box<dyn BlockCipherState>, CryptoError> {
        if key.len() != KEY_SIZE_256 {
            return Err(if for_encryption {
                CryptoError::BadEncryptionKey(Component::Block)
            } else {
                CryptoError::BadDecryptionKey(Component::Block)
            });
        }

        let (direction, schedule) = if for_encryption {
            let schedule = AesKey::encryption(allocator, key, self.multiplier)
                .map_err(|e| e.for_encryption(Component::Block))?;
            (Direction::Encrypt, schedule)
        } else {
            let schedule = AesKey::decryption(allocator, key, self.multiplier)
                .map_err(|e| e.for_decryption(Component::Block))?;
            (Direction::Decrypt, schedule)
        };
        Ok(Box::new(AesCbcState {
            direction,
            schedule,
            block: Buffer::for_component(allocator, BLOCK_SIZE, Component::Block)?,
        }))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Key schedule plus a working block, both allocator-backed and zeroed on
/// drop.
struct AesCbcState {
    direction: Direction,
    schedule: AesKey,
    block: Buffer,
}

/// Load `input` into the working block.
fn load_block<'a>(block: &'a mut Buffer, input: &[u8]) -> Result<&'a mut [u8; BLOCK_SIZE], CryptoError> {
    if input.len() != BLOCK_SIZE {
        return Err(CryptoError::invalid(
            Component::Block,
            format!("expected a {BLOCK_SIZE}-byte block, got {}", input.len()),
        ));
    }
    let block = block
        .first_chunk_mut::<BLOCK_SIZE>()
        .ok_or_else(|| CryptoError::failure(Component::Block, "working block too small"))?;
    block.copy_from_slice(input);
    Ok(block)
}

fn xor_into(block: &mut [u8; BLOCK_SIZE], other: &[u8]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

impl BlockCipherState for AesCbcState {
    fn encrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        if self.direction != Direction::Encrypt {
            return Err(CryptoError::invalid(
                Component::Block,
                "context was initialised for decryption",
            ));
        }
        let block = load_block(&mut self.block, input)?;
        xor_into(block, iv);
        self.schedule.encrypt_block(block);
        output.copy_from_slice(block);
        Ok(())
    }

    fn decrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        if self.direction != Direction::Decrypt {
            return Err(CryptoError::invalid(
                Component::Block,
                "context was initialised for encryption",
            ));
        }
        let block = load_block(&mut self.block, input)?;
        self.schedule.decrypt_block(block);
        xor_into(block, iv);
        output.copy_from_slice(block);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_aes_256_cbc_fips() -> Arc<dyn BlockCipherAlgorithm> {
    Arc::new(AesCbc::new(RoundMultiplier::Fips))
}

fn make_aes_256_2x_cbc() -> Arc<dyn BlockCipherAlgorithm> {
    Arc::new(AesCbc::new(RoundMultiplier::Double))
}

fn make_aes_256_3x_cbc() -> Arc<dyn BlockCipherAlgorithm> {
    Arc::new(AesCbc::new(RoundMultiplier::Triple))
}

fn make_aes_256_4x_cbc() -> Arc<dyn BlockCipherAlgorithm> {
    Arc::new(AesCbc::new(RoundMultiplier::Quadruple))
}

static AES_256_CBC_FIPS: Registration = Registration {
    implementation: ids::BLOCK_AES_256_CBC_FIPS,
    features: ids::BLOCK_AES_256_CBC_FIPS,
    factory: Factory::BlockCipher(make_aes_256_cbc_fips),
};

static AES_256_2X_CBC: Registration = Registration {
    implementation: ids::BLOCK_AES_256_2X_CBC,
    features: ids::BLOCK_AES_256_2X_CBC,
    factory: Factory::BlockCipher(make_aes_256_2x_cbc),
};

static AES_256_3X_CBC: Registration = Registration {
    implementation: ids::BLOCK_AES_256_3X_CBC,
    features: ids::BLOCK_AES_256_3X_CBC,
    factory: Factory::BlockCipher(make_aes_256_3x_cbc),
};

static AES_256_4X_CBC: Registration = Registration {
    implementation: ids::BLOCK_AES_256_4X_CBC,
    features: ids::BLOCK_AES_256_4X_CBC,
    factory: Factory::BlockCipher(make_aes_256_4x_cbc),
};

/// Register FIPS AES-256-CBC under [`ids::BLOCK_AES_256_CBC_FIPS`].
pub fn register_aes_256_cbc_fips() {
    registry::register(&AES_256_CBC_FIPS);
}

/// Register 2× AES-256-CBC under [`ids::BLOCK_AES_256_2X_CBC`].
pub fn register_aes_256_2x_cbc() {
    registry::register(&AES_256_2X_CBC);
}

/// Register 3× AES-256-CBC under [`ids::BLOCK_AES_256_3X_CBC`].
pub fn register_aes_256_3x_cbc() {
    registry::register(&AES_256_3X_CBC);
}

/// Register 4× AES-256-CBC under [`ids::BLOCK_AES_256_4X_CBC`].
pub fn register_aes_256_4x_cbc() {
    registry::register(&AES_256_4X_CBC);
}

/// Identifier and registration entry point for a round multiplier.
#[must_use]
pub fn implementation_for(multiplier: RoundMultiplier) -> (u32, fn()) {
    match multiplier {
        RoundMultiplier::Fips => (ids::BLOCK_AES_256_CBC_FIPS, register_aes_256_cbc_fips),
        RoundMultiplier::Double => (ids::BLOCK_AES_256_2X_CBC, register_aes_256_2x_cbc),
        RoundMultiplier::Triple => (ids::BLOCK_AES_256_3X_CBC, register_aes_256_3x_cbc),
        RoundMultiplier::Quadruple => (ids::BLOCK_AES_256_4X_CBC, register_aes_256_4x_cbc),
    }
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one block cipher. Cheap to clone.
#[derive(Clone)]
pub struct BlockOptions {
    algorithm: Arc<dyn BlockCipherAlgorithm>,
    allocator: SharedAllocator,
}

impl BlockOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such cipher is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_block_cipher(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(
        allocator: &SharedAllocator,
        algorithm: Arc<dyn BlockCipherAlgorithm>,
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

    /// IV length in bytes.
    #[must_use]
    pub fn iv_size(&self) -> usize {
        self.algorithm.iv_size()
    }

    /// Block length in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    /// Allocator shared by contexts and buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Key a context for encryption (`for_encryption = true`) or decryption.
    /// The context's key schedule is drawn from the options' allocator.
    ///
    /// # Errors
    ///
    /// - `CryptoError::BadEncryptionKey` / `BadDecryptionKey` if the key is
    ///   rejected
    /// - `CryptoError::OutOfMemory` if the allocator cannot hold the state
    pub fn init(&self, key: &[u8], for_encryption: bool) -> Result<BlockContext, CryptoError> {
        Ok(BlockContext {
            state: self
                .algorithm
                .new_state(&self.allocator, key, for_encryption)?,
            iv_size: self.iv_size(),
            block_size: self.block_size(),
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

    /// Allocate a buffer sized for one block.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn block_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.block_size())
    }
}

impl fmt::Debug for BlockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockOptions")
            .field("algorithm", &self.name())
            .finish_non_exhaustive()
    }
}

/// A keyed block cipher context for one direction.
pub struct BlockContext {
    state: Box<dyn BlockCipherState>,
    iv_size: usize,
    block_size: usize,
}

impl BlockContext {
    fn check_sizes(&self, iv: &[u8], input: &[u8], output: &[u8]) -> Result<(), CryptoError> {
        if iv.len() != self.iv_size {
            return Err(CryptoError::invalid(
                Component::Block,
                format!("iv must be {} bytes, got {}", self.iv_size, iv.len()),
            ));
        }
        if input.len() != self.block_size || output.len() != self.block_size {
            return Err(CryptoError::invalid(
                Component::Block,
                format!(
                    "input and output must be {} bytes, got {} and {}",
                    self.block_size,
                    input.len(),
                    output.len()
                ),
            ));
        }
        Ok(())
    }

    /// Encrypt exactly one block chained on `iv`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch or if the
    /// context was keyed for decryption.
    pub fn encrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        self.check_sizes(iv, input, output)?;
        self.state.encrypt(iv, input, output)
    }

    /// Decrypt exactly one block chained on `iv`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` on a size mismatch or if the
    /// context was keyed for encryption.
    pub fn decrypt(&mut self, iv: &[u8], input: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        self.check_sizes(iv, input, output)?;
        self.state.decrypt(iv, input, output)
    }
}

impl fmt::Debug for BlockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlockContext(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
