//! Message authentication: HMAC over any [`HashAlgorithm`].
//!
//! This module provides:
//! - [`MacAlgorithm`] / [`MacState`] — the capability contract
//! - [`Hmac`] — RFC 2104 HMAC, generic over the hash capability
//! - [`MacOptions`] / [`MacContext`] — facade types handed out by the suite
//!
//! A MAC may be finalized into any buffer between one byte and the full MAC
//! size; shorter buffers receive the leading bytes (truncated HMAC).

use crate::error::{Component, CryptoError};
use crate::hash::{HashAlgorithm, HashState, Sha2Algorithm, Sha2Variant};
use crate::memory::{constant_time_eq, Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5C;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A keyed message authentication algorithm.
pub trait MacAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Full MAC length in bytes.
    fn mac_size(&self) -> usize;

    /// Recommended key length in bytes. Other lengths are accepted.
    fn key_size(&self) -> usize;

    /// Begin a MAC computation under `key`. Keyed state is drawn from
    /// `allocator`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::OutOfMemory` if `allocator` cannot hold the state
    /// - errors from the underlying primitive
    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
    ) -> Result<Box<dyn MacState>, CryptoError>;
}

/// State of one in-progress MAC computation.
pub trait MacState: Send {
    /// Absorb `data`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying primitive.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Write the first `out.len()` bytes of the MAC and restart under the
    /// same key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is empty or longer
    /// than the MAC.
    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;
}

// ---------------------------------------------------------------------------
// HMAC
// ---------------------------------------------------------------------------

/// HMAC over a hash capability.
#[derive(Clone)]
pub struct Hmac {
    name: &'static str,
    hash: Arc<dyn HashAlgorithm>,
}

impl Hmac {
    /// HMAC over `hash`.
    #[must_use]
    pub fn new(name: &'static str, hash: Arc<dyn HashAlgorithm>) -> Self {
        Self { name, hash }
    }
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hmac").field("name", &self.name).finish()
    }
}

impl MacAlgorithm for Hmac {
    fn name(&self) -> &'static str {
        self.name
    }

    fn mac_size(&self) -> usize {
        self.hash.digest_size()
    }

    fn key_size(&self) -> usize {
        self.hash.digest_size()
    }

    fn new_state(
        &self,
        allocator: &SharedAllocator,
        key: &[u8],
    ) -> Result<Box<dyn MacState>, CryptoError> {
        let block_size = self.hash.block_size();
        let digest_size = self.hash.digest_size();

        // ipad || opad. The first half holds the padded key until the pads
        // are derived from it.
        let doubled = |size: usize| {
            size.checked_mul(2)
                .ok_or_else(|| CryptoError::invalid(Component::Mac, "hash sizes overflow"))
        };
        let mut pads = Buffer::for_component(allocator, doubled(block_size)?, Component::Mac)?;
        let work = Buffer::for_component(allocator, doubled(digest_size)?, Component::Mac)?;

        // Keys longer than a block are hashed first; all keys are then
        // zero-padded to the block size.
        if key.len() > block_size {
            let mut state = self.hash.new_state(allocator).map_err(within_mac)?;
            state.update(key)?;
            state.finalize(&mut pads[..block_size])?;
        } else {
            pads[..key.len()].copy_from_slice(key);
        }

        let (ipad, opad) = pads.split_at_mut(block_size);
        for (i, o) in ipad.iter_mut().zip(opad.iter_mut()) {
            *o = *i ^ OPAD;
            *i ^= IPAD;
        }

        let mut inner = self.hash.new_state(allocator).map_err(within_mac)?;
        inner.update(&pads[..block_size])?;
        let outer = self.hash.new_state(allocator).map_err(within_mac)?;

        Ok(Box::new(HmacState {
            block_size,
            digest_size,
            inner,
            outer,
            pads,
            work,
        }))
    }
}

/// Report a hash state allocation failure against the MAC.
fn within_mac(err: CryptoError) -> CryptoError {
    match err {
        CryptoError::OutOfMemory(_) => CryptoError::OutOfMemory(Component::Mac),
        other => other,
    }
}

/// In-progress HMAC. Every byte of keyed state, including the inner and
/// outer hash states, comes from the context's allocator.
struct HmacState {
    block_size: usize,
    digest_size: usize,
    inner: Box<dyn HashState>,
    outer: Box<dyn HashState>,
    /// ipad || opad.
    pads: Buffer,
    /// Inner digest || tag.
    work: Buffer,
}

impl MacState for HmacState {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.inner.update(data)
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let digest_size = self.digest_size;
        if out.is_empty() || out.len() > digest_size {
            return Err(CryptoError::invalid(
                Component::Mac,
                format!("mac buffer must be 1-{digest_size} bytes, got {}", out.len()),
            ));
        }

        let (ipad, opad) = self.pads.split_at(self.block_size);
        let (inner_digest, tag) = self.work.split_at_mut(digest_size);
        self.inner.finalize(inner_digest)?;

        self.outer.update(opad)?;
        self.outer.update(inner_digest)?;
        self.outer.finalize(tag)?;

        for (dst, src) in out.iter_mut().zip(tag.iter()) {
            *dst = *src;
        }
        self.work.zeroize();

        self.inner.update(ipad)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_hmac_sha_2_512() -> Arc<dyn MacAlgorithm> {
    Arc::new(Hmac::new(
        "HMAC-SHA-512",
        Arc::new(Sha2Algorithm::new(Sha2Variant::Sha512)),
    ))
}

fn make_hmac_sha_2_512_256() -> Arc<dyn MacAlgorithm> {
    Arc::new(Hmac::new(
        "HMAC-SHA-512/256",
        Arc::new(Sha2Algorithm::new(Sha2Variant::Sha512_256)),
    ))
}

static HMAC_SHA_2_512: Registration = Registration {
    implementation: ids::MAC_HMAC_SHA_2_512,
    features: ids::MAC_HMAC_SHA_2_512,
    factory: Factory::Mac(make_hmac_sha_2_512),
};

static HMAC_SHA_2_512_256: Registration = Registration {
    implementation: ids::MAC_HMAC_SHA_2_512_256,
    features: ids::MAC_HMAC_SHA_2_512_256,
    factory: Factory::Mac(make_hmac_sha_2_512_256),
};

/// Register HMAC-SHA-512 under [`ids::MAC_HMAC_SHA_2_512`].
pub fn register_hmac_sha_2_512() {
    registry::register(&HMAC_SHA_2_512);
}

/// Register HMAC-SHA-512/256 under [`ids::MAC_HMAC_SHA_2_512_256`].
pub fn register_hmac_sha_2_512_256() {
    registry::register(&HMAC_SHA_2_512_256);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options for one MAC algorithm. Cheap to clone.
#[derive(Clone)]
pub struct MacOptions {
    algorithm: Arc<dyn MacAlgorithm>,
    allocator: SharedAllocator,
}

impl MacOptions {
    /// Resolve `implementation` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if no such MAC is registered.
    pub fn new(allocator: &SharedAllocator, implementation: u32) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_mac(implementation)?;
        Ok(Self::with_algorithm(allocator, algorithm))
    }

    /// Options over an already-constructed algorithm.
    #[must_use]
    pub fn with_algorithm(allocator: &SharedAllocator, algorithm: Arc<dyn MacAlgorithm>) -> Self {
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

    /// Full MAC length in bytes.
    #[must_use]
    pub fn mac_size(&self) -> usize {
        self.algorithm.mac_size()
    }

    /// Recommended key length in bytes.
    #[must_use]
    pub fn key_size(&self) -> usize {
        self.algorithm.key_size()
    }

    /// Allocator shared by contexts and buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Start a MAC computation under `key`. Its keyed state is drawn from
    /// the options' allocator.
    ///
    /// # Errors
    ///
    /// - `CryptoError::OutOfMemory` if the allocator cannot hold the state
    /// - the algorithm's initialisation error
    pub fn init(&self, key: &[u8]) -> Result<MacContext, CryptoError> {
        Ok(MacContext {
            state: self.algorithm.new_state(&self.allocator, key)?,
            mac_size: self.mac_size(),
        })
    }

    /// Allocate a buffer sized for the full MAC.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.mac_size())
    }

    /// Allocate a buffer sized for a key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory` if allocation fails.
    pub fn key_buffer(&self) -> Result<Buffer, CryptoError> {
        Buffer::new(&self.allocator, self.key_size())
    }

    /// MAC `message` under `key` in one call.
    ///
    /// # Errors
    ///
    /// Propagates allocation and algorithm errors.
    pub fn compute(&self, key: &[u8], message: &[u8]) -> Result<Buffer, CryptoError> {
        let mut ctx = self.init(key)?;
        ctx.digest(message)?;
        let mut out = self.buffer()?;
        ctx.finalize(&mut out)?;
        Ok(out)
    }

    /// Check `tag` against the MAC of `message` under `key`.
    ///
    /// `tag` may be a truncated MAC; only its length is compared. The
    /// comparison does not exit early on the first differing byte.
    ///
    /// # Errors
    ///
    /// - `CryptoError::VerificationFailed` if the tag does not match
    /// - `CryptoError::InvalidArgument` if `tag` is empty or too long
    pub fn verify(&self, key: &[u8], message: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
        let mut ctx = self.init(key)?;
        ctx.digest(message)?;
        let mut expected = Zeroizing::new(vec![0u8; tag.len()]);
        ctx.finalize(&mut expected)?;
        if constant_time_eq(&expected, tag) {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed(Component::Mac))
        }
    }
}

impl fmt::Debug for MacOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacOptions")
            .field("algorithm", &self.name())
            .field("mac_size", &self.mac_size())
            .finish_non_exhaustive()
    }
}

/// One keyed MAC computation.
pub struct MacContext {
    state: Box<dyn MacState>,
    mac_size: usize,
}

impl MacContext {
    /// Full MAC length in bytes.
    #[must_use]
    pub const fn mac_size(&self) -> usize {
        self.mac_size
    }

    /// Absorb `data`.
    ///
    /// # Errors
    ///
    /// Propagates the algorithm's error.
    pub fn digest(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.state.update(data)
    }

    /// Write the leading `out.len()` bytes of the MAC into `out`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is empty or longer
    /// than [`MacContext::mac_size`].
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        self.state.finalize(out)
    }
}

impl fmt::Debug for MacContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MacContext(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
