//! Process-wide algorithm registry.
//!
//! Maps `(interface, implementation id)` pairs to [`Registration`] records.
//! Each algorithm module exposes `register_*` entry points that insert a
//! `'static` record; a suite calls the ones it needs before resolving
//! identifiers.
//!
//! # Threading
//!
//! Registrations are expected during single-threaded start-up. The table is
//! behind an `RwLock` so later lookups are plain shared reads. Registration is
//! idempotent: inserting the same record twice is a no-op, and a second,
//! different record for an already-registered pair is ignored with a warning
//! (the first registration wins).

use crate::block::BlockCipherAlgorithm;
use crate::error::CryptoError;
use crate::hash::HashAlgorithm;
use crate::kdf::KeyDerivationAlgorithm;
use crate::key_agreement::KeyAgreementAlgorithm;
use crate::mac::MacAlgorithm;
use crate::prng::PrngAlgorithm;
use crate::signature::SignatureAlgorithm;
use crate::stream::StreamCipherAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Capability interfaces known to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceId {
    /// Cryptographic hash functions.
    Hash,
    /// Message authentication codes.
    Mac,
    /// Single-block ciphers.
    BlockCipher,
    /// Stream ciphers.
    StreamCipher,
    /// Digital signatures.
    DigitalSignature,
    /// Key agreement.
    KeyAgreement,
    /// Random byte sources.
    Prng,
    /// Password-based key derivation.
    KeyDerivation,
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hash => "hash",
            Self::Mac => "mac",
            Self::BlockCipher => "block cipher",
            Self::StreamCipher => "stream cipher",
            Self::DigitalSignature => "digital signature",
            Self::KeyAgreement => "key agreement",
            Self::Prng => "prng",
            Self::KeyDerivation => "key derivation",
        })
    }
}

/// Implementation identifiers.
///
/// Identifiers are single-bit flags within their interface so that a
/// record's `features` mask can advertise several behaviours at once.
pub mod ids {
    /// SHA-384.
    pub const HASH_SHA_2_384: u32 = 0x0000_0200;
    /// SHA-512.
    pub const HASH_SHA_2_512: u32 = 0x0000_0400;
    /// SHA-512/256.
    pub const HASH_SHA_2_512_256: u32 = 0x0000_1000;

    /// HMAC over SHA-512.
    pub const MAC_HMAC_SHA_2_512: u32 = 0x0000_0400;
    /// HMAC over SHA-512/256.
    pub const MAC_HMAC_SHA_2_512_256: u32 = 0x0000_1000;

    /// AES-256-CBC, FIPS round count.
    pub const BLOCK_AES_256_CBC_FIPS: u32 = 0x0000_0100;
    /// AES-256-CBC, 2× rounds.
    pub const BLOCK_AES_256_2X_CBC: u32 = 0x0000_0200;
    /// AES-256-CBC, 3× rounds.
    pub const BLOCK_AES_256_3X_CBC: u32 = 0x0000_0400;
    /// AES-256-CBC, 4× rounds.
    pub const BLOCK_AES_256_4X_CBC: u32 = 0x0000_0800;

    /// AES-256-CTR, FIPS round count.
    pub const STREAM_AES_256_CTR_FIPS: u32 = 0x0000_0100;
    /// AES-256-CTR, 2× rounds.
    pub const STREAM_AES_256_2X_CTR: u32 = 0x0000_0200;
    /// AES-256-CTR, 3× rounds.
    pub const STREAM_AES_256_3X_CTR: u32 = 0x0000_0400;
    /// AES-256-CTR, 4× rounds.
    pub const STREAM_AES_256_4X_CTR: u32 = 0x0000_0800;

    /// Ed25519.
    pub const SIGNATURE_ED25519: u32 = 0x0000_0100;

    /// Curve25519 agreement hashed with SHA-512 (authentication slot).
    pub const KEY_AGREEMENT_CURVE25519_SHA512: u32 = 0x0000_0100;
    /// Curve25519 agreement hashed with SHA-512/256 (cipher slot).
    pub const KEY_AGREEMENT_CURVE25519_SHA512_256: u32 = 0x0000_0200;

    /// Operating-system entropy source.
    pub const PRNG_SOURCE_OPERATING_SYSTEM: u32 = 0x0000_0100;

    /// PBKDF2 (PKCS #5 v2.0).
    pub const KEY_DERIVATION_PBKDF2: u32 = 0x0000_0100;
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Factory for a capability implementation, tagged by interface.
#[derive(Clone, Copy)]
pub enum Factory {
    /// Builds a hash algorithm.
    Hash(fn() -> Arc<dyn HashAlgorithm>),
    /// Builds a MAC algorithm.
    Mac(fn() -> Arc<dyn MacAlgorithm>),
    /// Builds a block cipher algorithm.
    BlockCipher(fn() -> Arc<dyn BlockCipherAlgorithm>),
    /// Builds a stream cipher algorithm.
    StreamCipher(fn() -> Arc<dyn StreamCipherAlgorithm>),
    /// Builds a signature algorithm.
    DigitalSignature(fn() -> Arc<dyn SignatureAlgorithm>),
    /// Builds a key agreement algorithm.
    KeyAgreement(fn() -> Arc<dyn KeyAgreementAlgorithm>),
    /// Builds a random source algorithm.
    Prng(fn() -> Arc<dyn PrngAlgorithm>),
    /// Builds a key derivation algorithm.
    KeyDerivation(fn() -> Arc<dyn KeyDerivationAlgorithm>),
}

impl Factory {
    /// Interface this factory produces implementations for.
    #[must_use]
    pub const fn interface(&self) -> InterfaceId {
        match self {
            Self::Hash(_) => InterfaceId::Hash,
            Self::Mac(_) => InterfaceId::Mac,
            Self::BlockCipher(_) => InterfaceId::BlockCipher,
            Self::StreamCipher(_) => InterfaceId::StreamCipher,
            Self::DigitalSignature(_) => InterfaceId::DigitalSignature,
            Self::KeyAgreement(_) => InterfaceId::KeyAgreement,
            Self::Prng(_) => InterfaceId::Prng,
            Self::KeyDerivation(_) => InterfaceId::KeyDerivation,
        }
    }
}

/// A registered implementation.
///
/// Records are `'static`; their address is their identity for the lifetime of
/// the process.
pub struct Registration {
    /// Implementation identifier within the interface.
    pub implementation: u32,
    /// Behaviours this implementation supports (superset of `implementation`).
    pub features: u32,
    /// Constructor for the implementation.
    pub factory: Factory,
}

impl Registration {
    /// Interface this record belongs to.
    #[must_use]
    pub const fn interface(&self) -> InterfaceId {
        self.factory.interface()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("interface", &self.interface())
            .field("implementation", &format_args!("{:#010x}", self.implementation))
            .field("features", &format_args!("{:#010x}", self.features))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

static REGISTRY: RwLock<Vec<&'static Registration>> = RwLock::new(Vec::new());

/// Insert a record into the process-wide registry.
///
/// Duplicate registrations of the same record are ignored. A different record
/// for an already-registered `(interface, implementation)` pair is a program
/// error; it is ignored and logged so that the first registration stays
/// authoritative.
pub fn register(record: &'static Registration) {
    let mut table = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = table.iter().find(|r| {
        r.interface() == record.interface() && r.implementation == record.implementation
    }) {
        if !std::ptr::eq(*existing, record) {
            tracing::warn!(
                interface = %record.interface(),
                implementation = record.implementation,
                "conflicting registration ignored"
            );
        }
        return;
    }

    tracing::debug!(
        interface = %record.interface(),
        implementation = record.implementation,
        "algorithm registered"
    );
    table.push(record);
}

/// Find the record for an exact `(interface, implementation)` pair.
#[must_use]
pub fn lookup(interface: InterfaceId, implementation: u32) -> Option<&'static Registration> {
    let table = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    let found = table
        .iter()
        .copied()
        .find(|r| r.interface() == interface && r.implementation == implementation);
    tracing::trace!(%interface, implementation, found = found.is_some(), "registry lookup");
    found
}

/// Find the first record of `interface` whose features cover every bit of
/// `mask`.
#[must_use]
pub fn lookup_by_features(interface: InterfaceId, mask: u32) -> Option<&'static Registration> {
    let table = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    table
        .iter()
        .copied()
        .find(|r| r.interface() == interface && r.features & mask == mask)
}

/// Identifiers currently registered for `interface`, in registration order.
#[must_use]
pub fn registered_implementations(interface: InterfaceId) -> Vec<u32> {
    let table = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    table
        .iter()
        .filter(|r| r.interface() == interface)
        .map(|r| r.implementation)
        .collect()
}

fn require(interface: InterfaceId, implementation: u32) -> Result<Factory, CryptoError> {
    lookup(interface, implementation)
        .map(|r| r.factory)
        .ok_or(CryptoError::NotRegistered {
            interface,
            implementation,
        })
}

// One resolver per interface. The factory tag always matches the record's
// interface because `interface()` is derived from it.

pub(crate) fn resolve_hash(id: u32) -> Result<Arc<dyn HashAlgorithm>, CryptoError> {
    match require(InterfaceId::Hash, id)? {
        Factory::Hash(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::Hash, id)),
    }
}

pub(crate) fn resolve_mac(id: u32) -> Result<Arc<dyn MacAlgorithm>, CryptoError> {
    match require(InterfaceId::Mac, id)? {
        Factory::Mac(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::Mac, id)),
    }
}

pub(crate) fn resolve_block_cipher(
    id: u32,
) -> Result<Arc<dyn BlockCipherAlgorithm>, CryptoError> {
    match require(InterfaceId::BlockCipher, id)? {
        Factory::BlockCipher(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::BlockCipher, id)),
    }
}

pub(crate) fn resolve_stream_cipher(
    id: u32,
) -> Result<Arc<dyn StreamCipherAlgorithm>, CryptoError> {
    match require(InterfaceId::StreamCipher, id)? {
        Factory::StreamCipher(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::StreamCipher, id)),
    }
}

pub(crate) fn resolve_signature(id: u32) -> Result<Arc<dyn SignatureAlgorithm>, CryptoError> {
    match require(InterfaceId::DigitalSignature, id)? {
        Factory::DigitalSignature(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::DigitalSignature, id)),
    }
}

pub(crate) fn resolve_key_agreement(
    id: u32,
) -> Result<Arc<dyn KeyAgreementAlgorithm>, CryptoError> {
    match require(InterfaceId::KeyAgreement, id)? {
        Factory::KeyAgreement(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::KeyAgreement, id)),
    }
}

pub(crate) fn resolve_prng(id: u32) -> Result<Arc<dyn PrngAlgorithm>, CryptoError> {
    match require(InterfaceId::Prng, id)? {
        Factory::Prng(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::Prng, id)),
    }
}

pub(crate) fn resolve_key_derivation(
    id: u32,
) -> Result<Arc<dyn KeyDerivationAlgorithm>, CryptoError> {
    match require(InterfaceId::KeyDerivation, id)? {
        Factory::KeyDerivation(make) => Ok(make()),
        _ => Err(not_registered(InterfaceId::KeyDerivation, id)),
    }
}

const fn not_registered(interface: InterfaceId, implementation: u32) -> CryptoError {
    CryptoError::NotRegistered {
        interface,
        implementation,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
