//! Hash capability: SHA-384, SHA-512 and SHA-512/256.
//!
//! This module provides:
//! - [`HashAlgorithm`] / [`HashState`] — the capability contract
//! - [`Sha2Algorithm`] — the SHA-512 family over the crate's own core
//! - [`HashOptions`] — immutable per-algorithm options resolved from the registry
//! - [`HashContext`] — one streaming hash computation
//!
//! Register the algorithms you need with [`register_sha_2_384`],
//! [`register_sha_2_512`] or [`register_sha_2_512_256`] before resolving them.

use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use crate::sha2::{self, Sha512State};
use std::fmt;
use std::sync::Arc;

pub use crate::sha2::Sha2Variant;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A hash function that can start independent computations.
pub trait HashAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Digest length in bytes.
    fn digest_size(&self) -> usize;

    /// Internal block length in bytes (used by HMAC key processing).
    fn block_size(&self) -> usize;

    /// Begin a new computation whose working state is drawn from
    /// `allocator`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if `allocator` cannot hold the
    /// state.
    fn new_state(&self, allocator: &SharedAllocator) -> Result<Box<dyn HashState>, CryptoError>;
}

/// State of one in-progress hash computation.
pub trait HashState: Send {
    /// Absorb `data`.
    ///
    /// # Errors
    ///
    /// Implementation-specific; the built-in algorithms never fail here.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Write the digest to the start of `out` and reset the state.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is shorter than the
    /// digest.
    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Discard absorbed input and start over.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// SHA-2 implementation
// ---------------------------------------------------------------------------

/// The SHA-512 family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha2Algorithm {
    variant: Sha2Variant,
}

impl Sha2Algorithm {
    /// Algorithm for `variant`.
    #[must_use]
    pub const fn new(variant: Sha2Variant) -> Self {
        Self { variant }
    }

    /// Selected variant.
    #[must_use]
    pub const fn variant(&self) -> Sha2Variant {
        self.variant
    }
}

impl HashAlgorithm for Sha2Algorithm {
    fn name(&self) -> &'static str {
        self.variant.name()
    }

    fn digest_size(&self) -> usize {
        self.variant.digest_size()
    }

    fn block_size(&self) -> usize {
        sha2::BLOCK_SIZE
    }

    fn new_state(&self, allocator: &SharedAllocator) -> Result<Box<dyn HashState>, CryptoError> {
        Ok(Box::new(Sha512State::new(allocator, self.variant)?))
    }
}

impl HashState for Sha512State {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        Self::update(self, data);
        Ok(())
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        Self::finalize(self, out)
    }

    fn reset(&mut self) {
        Self::reset(self);
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_sha_2_384() -> Arc<dyn HashAlgorithm> {
    Arc::new(Sha2Algorithm::new(Sha2Variant::Sha384))
}

fn make_sha_2_512() -> Arc<dyn HashAlgorithm> {
    Arc::new(Sha2Algorithm::new(Sha2Variant::Sha512))
}

fn make_sha_2_512_256() -> Arc<dyn HashAlgorithm> {
    Arc::new(Sha2Algorithm::new(Sha2Variant::Sha512_256))
}

static SHA_2_384: Registration = Registration {
    implementation: ids::HASH_SHA_2_384,
    features: ids::HASH_SHA_2_384,
    factory: Factory::Hash(make_sha_2_384),
};

static SHA_2_512: Registration = Registration {
    implementation: ids::HASH_SHA_2_512,
    features: ids::HASH_SHA_2_512,
    factory: Factory::Hash(make_sha_2_512),
};

static SHA_2_512_256: Registration = Registration {
    implementation: ids::HASH_SHA_2_512_256,
    features: ids::HASH_SHA_2_512_256,
    factory: Factory::Hash(make_sha_2_512_256),
};

/// Register SHA-384 under [`ids::HASH_SHA_2_384`].
pub fn register_sha_2_384() {
    registry::register(&SHA_2_384);
}

/// Register SHA-512 under [`ids::HASH_SHA_2_512`].
pub fn register_sha_2_512() {
    registry::register(&SHA_2_512);
}

/// Register SHA-512/256 under [`ids::HASH_SHA_2_512_256`].
pub fn register_sha_2_512_256() {
    registry::register(&SHA_2_512_256);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one hash algorithm. Cheap to clone.
#[derive(Clone)]
pub struct HashOptions {
    algorithm: Arc<dyn HashAlgorithm>,
    allocator: SharedAllocator,
}

impl HashOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such hash is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_hash(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(allocator: &SharedAllocator, algorithm: Arc<dyn HashAlgorithm>) -> Self {
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

    /// Digest length in bytes.
    #[must_use]
    pub fn digest_size(&self) -> usize {
        self.algorithm.digest_size()
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

    /// Start a new hash computation. Its state is drawn from the options'
    /// allocator.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if the allocator cannot hold the
    /// state.
    pub fn init(&self) -> Result<HashContext, CryptoError> {
        Ok(HashContext {
            state: self.algorithm.new_state(&self.allocator)?,
            digest_size: self.digest_size(),
        })
    }

    /// Allocate a buffer sized for this algorithm's digest.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.digest_size())
    }

    /// Hash `data` in one call.
    ///
    /// # Errors
    ///
    /// Propagates allocation and algorithm errors.
    pub fn hash(&self, data: &[u8]) -> Result<Buffer, CryptoError> {
        let mut ctx = self.init()?;
        ctx.digest(data)?;
        let mut out = self.buffer()?;
        ctx.finalize(&mut out)?;
        Ok(out)
    }
}

impl fmt::Debug for HashOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashOptions")
            .field("algorithm", &self.name())
            .field("digest_size", &self.digest_size())
            .finish_non_exhaustive()
    }
}

/// One streaming hash computation. Not shareable across threads at once.
pub struct HashContext {
    state: Box<dyn HashState>,
    digest_size: usize,
}

impl HashContext {
    /// Digest length written by [`HashContext::finalize`].
    #[must_use]
    pub const fn digest_size(&self) -> usize {
        self.digest_size
    }

    /// Absorb `data`. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates the algorithm's error.
    pub fn digest(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.state.update(data)
    }

    /// Write the digest to the start of `out`; the context can then be reused
    /// for a new message.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is shorter than
    /// [`HashContext::digest_size`].
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() < self.digest_size {
            return Err(CryptoError::invalid(
                Component::Hash,
                format!(
                    "digest buffer is {} bytes, need at least {}",
                    out.len(),
                    self.digest_size
                ),
            ));
        }
        self.state.finalize(out)
    }

    /// Discard absorbed input.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl fmt::Debug for HashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashContext(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
