//! Random byte source backed by the operating system.
//!
//! There is no in-process seeding and no exposed state: every read is served
//! by `rand::rngs::OsRng` (`getrandom`). Reads may block while the OS
//! gathers entropy.

use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Length of a UUID in bytes.
pub const UUID_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A cryptographically secure random byte source.
pub trait PrngAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Fill `out` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Failure` if the entropy source fails.
    fn read(&self, out: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system entropy source.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatingSystemSource;

impl PrngAlgorithm for OperatingSystemSource {
    fn name(&self) -> &'static str {
        "OS"
    }

    fn read(&self, out: &mut [u8]) -> Result<(), CryptoError> {
        OsRng
            .try_fill_bytes(out)
            .map_err(|e| CryptoError::failure(Component::Prng, format!("entropy source failed: {e}")))
    }
}

fn make_operating_system_source() -> Arc<dyn PrngAlgorithm> {
    Arc::new(OperatingSystemSource)
}

static OPERATING_SYSTEM: Registration = Registration {
    implementation: ids::PRNG_SOURCE_OPERATING_SYSTEM,
    features: ids::PRNG_SOURCE_OPERATING_SYSTEM,
    factory: Factory::Prng(make_operating_system_source),
};

/// Register the OS source under [`ids::PRNG_SOURCE_OPERATING_SYSTEM`].
pub fn register_operating_system_source() {
    registry::register(&OPERATING_SYSTEM);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one random source. Cheap to clone.
#[derive(Clone)]
pub struct PrngOptions {
    algorithm: Arc<dyn PrngAlgorithm>,
    allocator: SharedAllocator,
}

impl PrngOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such source is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_prng(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(allocator: &SharedAllocator, algorithm: Arc<dyn PrngAlgorithm>) -> Self {
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

    /// Allocator shared by buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Create a reader.
    #[must_use]
    pub fn init(&self) -> PrngContext {
        PrngContext {
            algorithm: Arc::clone(&self.algorithm),
        }
    }
}

impl fmt::Debug for PrngOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrngOptions")
            .field("algorithm", &self.name())
            .finish_non_exhaustive()
    }
}

/// Random byte reader.
pub struct PrngContext {
    algorithm: Arc<dyn PrngAlgorithm>,
}

impl PrngContext {
    /// Fill `out` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Failure` if the entropy source fails.
    pub fn read(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        self.algorithm.read(out)
    }

    /// Fill a fresh buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Propagates allocation and entropy errors.
    pub fn read_buffer(
        &mut self,
        allocator: &SharedAllocator,
        size: usize,
    ) -> Result<Buffer, CryptoError> {
        let mut buffer = Buffer::new(allocator, size)?;
        self.read(&mut buffer)?;
        Ok(buffer)
    }

    /// Fill `out` with a random RFC 4122 version 4 UUID.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is not 16 bytes, or
    /// `CryptoError::Failure` if the entropy source fails.
    pub fn read_uuid(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() != UUID_SIZE {
            return Err(CryptoError::invalid(
                Component::Prng,
                format!("uuid buffer must be {UUID_SIZE} bytes, got {}", out.len()),
            ));
        }
        self.read(out)?;
        // Version 4 in the high nibble of byte 6, RFC 4122 variant in byte 8.
        out[6] = (out[6] & 0x0F) | 0x40;
        out[8] = (out[8] & 0x3F) | 0x80;
        Ok(())
    }
}

impl fmt::Debug for PrngContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrngContext")
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
