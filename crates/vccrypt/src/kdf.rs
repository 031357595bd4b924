//! PBKDF2 (PKCS #5 v2.0) password-based key derivation.
//!
//! This module provides:
//! - [`KeyDerivationAlgorithm`] — the capability contract
//! - [`Pbkdf2`] — PBKDF2 over any MAC from [`crate::mac`] as the PRF
//! - [`KeyDerivationOptions`] / [`KeyDerivationContext`] — facade types
//!
//! # Algorithm
//!
//! The derived key is produced in `ceil(dk_len / h)` chunks, `h` being the
//! PRF output size. Chunk `i` (from 1) is
//! `U_1 ^ U_2 ^ ... ^ U_rounds`, where `U_1 = PRF(password, salt || BE32(i))`
//! and `U_j = PRF(password, U_{j-1})`. The last chunk is truncated to the
//! bytes still needed.
//!
//! Iteration counts are not bounded here; callers pick counts they can
//! afford to run.

use crate::error::{Component, CryptoError};
use crate::mac::MacOptions;
use crate::memory::{Buffer, SharedAllocator};
use crate::registry::{self, ids, Factory, Registration};
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

/// Size of the big-endian block counter appended to the salt.
const COUNTER_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// A password-based key derivation function parameterised by a PRF.
pub trait KeyDerivationAlgorithm: Send + Sync {
    /// Algorithm name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Fill `derived_key` from `password` and `salt`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if a precondition is violated,
    /// or propagates PRF errors. `derived_key` is zeroed on failure.
    fn derive(
        &self,
        prf: &MacOptions,
        derived_key: &mut [u8],
        password: &[u8],
        salt: &[u8],
        rounds: u32,
    ) -> Result<(), CryptoError>;
}

// ---------------------------------------------------------------------------
// PBKDF2
// ---------------------------------------------------------------------------

/// PBKDF2 with a MAC as the PRF.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pbkdf2;

impl KeyDerivationAlgorithm for Pbkdf2 {
    fn name(&self) -> &'static str {
        "PBKDF2"
    }

    fn derive(
        &self,
        prf: &MacOptions,
        derived_key: &mut [u8],
        password: &[u8],
        salt: &[u8],
        rounds: u32,
    ) -> Result<(), CryptoError> {
        let result = pbkdf2(prf, derived_key, password, salt, rounds);
        if result.is_err() {
            derived_key.zeroize();
        }
        result
    }
}

fn pbkdf2(
    prf: &MacOptions,
    derived_key: &mut [u8],
    password: &[u8],
    salt: &[u8],
    rounds: u32,
) -> Result<(), CryptoError> {
    if rounds == 0 {
        return Err(CryptoError::invalid(
            Component::KeyDerivation,
            "rounds must be at least 1",
        ));
    }
    if derived_key.is_empty() {
        return Err(CryptoError::invalid(
            Component::KeyDerivation,
            "derived key length must be non-zero",
        ));
    }
    if salt.is_empty() {
        return Err(CryptoError::invalid(
            Component::KeyDerivation,
            "salt must be non-empty",
        ));
    }
    let salted_len = salt.len().checked_add(COUNTER_LEN).ok_or_else(|| {
        CryptoError::invalid(Component::KeyDerivation, "salt is too long")
    })?;

    let h = prf.mac_size();
    if h == 0 {
        return Err(CryptoError::invalid(
            Component::KeyDerivation,
            "prf output size must be non-zero",
        ));
    }
    if u32::try_from(derived_key.len().div_ceil(h)).is_err() {
        return Err(CryptoError::invalid(
            Component::KeyDerivation,
            "derived key length exceeds 2^32 - 1 PRF blocks",
        ));
    }

    let mut mac = prf.init(password)?;

    // salt || BE32(counter); the counter bytes are rewritten per chunk.
    let mut salted = Zeroizing::new(vec![0u8; salted_len]);
    salted
        .get_mut(..salt.len())
        .ok_or_else(|| CryptoError::failure(Component::KeyDerivation, "salt buffer"))?
        .copy_from_slice(salt);

    let mut u = Buffer::for_component(prf.allocator(), h, Component::KeyDerivation)?;
    let mut t = Buffer::for_component(prf.allocator(), h, Component::KeyDerivation)?;

    let mut counter: u32 = 0;
    for chunk in derived_key.chunks_mut(h) {
        counter = counter.checked_add(1).ok_or_else(|| {
            CryptoError::invalid(Component::KeyDerivation, "block counter overflow")
        })?;
        if let Some(tail) = salted.get_mut(salt.len()..) {
            tail.copy_from_slice(&counter.to_be_bytes());
        }

        mac.digest(&salted)?;
        mac.finalize(&mut u)?;
        t.copy_from_slice(&u);

        for _ in 1..rounds {
            mac.digest(&u)?;
            mac.finalize(&mut u)?;
            for (acc, byte) in t.iter_mut().zip(u.iter()) {
                *acc ^= byte;
            }
        }

        for (dst, src) in chunk.iter_mut().zip(t.iter()) {
            *dst = *src;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn make_pbkdf2() -> Arc<dyn KeyDerivationAlgorithm> {
    Arc::new(Pbkdf2)
}

static PBKDF2: Registration = Registration {
    implementation: ids::KEY_DERIVATION_PBKDF2,
    features: ids::KEY_DERIVATION_PBKDF2,
    factory: Factory::KeyDerivation(make_pbkdf2),
};

/// Register PBKDF2 under [`ids::KEY_DERIVATION_PBKDF2`].
pub fn register_pbkdf2() {
    registry::register(&PBKDF2);
}

// ---------------------------------------------------------------------------
// Options and context
// ---------------------------------------------------------------------------

/// Immutable options pairing a derivation function with its PRF.
#[derive(Clone)]
pub struct KeyDerivationOptions {
    algorithm: Arc<dyn KeyDerivationAlgorithm>,
    prf: MacOptions,
}

impl KeyDerivationOptions {
    /// Resolve `implementation` and the PRF `prf_implementation` (a MAC id)
    /// from the registry.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NotRegistered` if either id is not registered.
    pub fn new(
        allocator: &SharedAllocator,
        implementation: u32,
        prf_implementation: u32,
    ) -> Result<Self, CryptoError> {
        let algorithm = registry::resolve_key_derivation(implementation)?;
        let prf = MacOptions::new(allocator, prf_implementation)?;
        Ok(Self::with_algorithm(algorithm, prf))
    }

    /// Options over an already-constructed algorithm and PRF.
    #[must_use]
    pub fn with_algorithm(algorithm: Arc<dyn KeyDerivationAlgorithm>, prf: MacOptions) -> Self {
        Self { algorithm, prf }
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Options of the PRF.
    #[must_use]
    pub fn prf(&self) -> &MacOptions {
        &self.prf
    }

    /// Output size of one PRF invocation.
    #[must_use]
    pub fn hmac_digest_size(&self) -> usize {
        self.prf.mac_size()
    }

    /// Allocator shared by buffers built from these options.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        self.prf.allocator()
    }

    /// Create a derivation context.
    #[must_use]
    pub fn init(&self) -> KeyDerivationContext {
        KeyDerivationContext {
            algorithm: Arc::clone(&self.algorithm),
            prf: self.prf.clone(),
        }
    }
}

impl fmt::Debug for KeyDerivationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivationOptions")
            .field("algorithm", &self.name())
            .field("prf", &self.prf.name())
            .finish()
    }
}

/// Key derivation context.
pub struct KeyDerivationContext {
    algorithm: Arc<dyn KeyDerivationAlgorithm>,
    prf: MacOptions,
}

impl KeyDerivationContext {
    /// Fill `derived_key` from `password` and `salt` with `rounds` iterations.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `rounds` is zero or
    /// `derived_key` or `salt` is empty. `derived_key` is zeroed on failure.
    pub fn derive(
        &mut self,
        derived_key: &mut [u8],
        password: &[u8],
        salt: &[u8],
        rounds: u32,
    ) -> Result<(), CryptoError> {
        self.algorithm
            .derive(&self.prf, derived_key, password, salt, rounds)
    }

    /// Derive a key of `size` bytes into a new buffer.
    ///
    /// # Errors
    ///
    /// Same as [`KeyDerivationContext::derive`], plus allocation errors.
    pub fn derive_buffer(
        &mut self,
        size: usize,
        password: &[u8],
        salt: &[u8],
        rounds: u32,
    ) -> Result<Buffer, CryptoError> {
        let mut key = Buffer::new(self.prf.allocator(), size)?;
        self.derive(&mut key, password, salt, rounds)?;
        Ok(key)
    }
}

impl fmt::Debug for KeyDerivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivationContext")
            .field("algorithm", &self.algorithm.name())
            .field("prf", &self.prf.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
