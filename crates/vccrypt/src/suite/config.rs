//! Suite selection, readable from JSON.
//!
//! A deployment names the suite and, when it must read ciphertexts produced
//! with the non-standard AES round counts, the round multiplier of the
//! block and stream ciphers. Every field has a default, so `{}` selects
//! `velo_v1` with FIPS AES.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aes::RoundMultiplier;
use crate::error::CryptoError;

// ── Suite identifier ───────────────────────────────────────────────

/// Recognised crypto suites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteId {
    /// SHA-512, HMAC, Curve25519, Ed25519, OS PRNG, AES-256, PBKDF2.
    #[default]
    VeloV1,
    /// Closure-driven test double; every operation fails until mocked.
    Mock,
}

impl SuiteId {
    /// Numeric identifier of `velo_v1`.
    pub const VELO_V1: u32 = 0x0000_0001;
    /// Numeric identifier of the mock suite.
    pub const MOCK: u32 = 0x8000_0000;

    /// Numeric identifier of this suite.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::VeloV1 => Self::VELO_V1,
            Self::Mock => Self::MOCK,
        }
    }

    /// String form, as used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeloV1 => "velo_v1",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiteId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "velo_v1" => Ok(Self::VeloV1),
            "mock" => Ok(Self::Mock),
            other => Err(CryptoError::InvalidConfiguration(format!(
                "unknown suite `{other}`"
            ))),
        }
    }
}

impl TryFrom<u32> for SuiteId {
    type Error = CryptoError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            Self::VELO_V1 => Ok(Self::VeloV1),
            Self::MOCK => Ok(Self::Mock),
            other => Err(CryptoError::InvalidConfiguration(format!(
                "unknown suite id {other:#010x}"
            ))),
        }
    }
}

impl From<SuiteId> for u32 {
    fn from(suite: SuiteId) -> Self {
        suite.id()
    }
}

// ── Configuration ──────────────────────────────────────────────────

/// Suite selection plus AES round multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Which suite to build.
    #[serde(default)]
    pub suite: SuiteId,

    /// Round multiplier of the AES-256-CBC block cipher.
    #[serde(default)]
    pub block_cipher_rounds: RoundMultiplier,

    /// Round multiplier of the AES-256-CTR stream cipher.
    #[serde(default)]
    pub stream_cipher_rounds: RoundMultiplier,
}

impl SuiteConfig {
    /// Default configuration for `suite`.
    #[must_use]
    pub fn for_suite(suite: SuiteId) -> Self {
        Self {
            suite,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidConfiguration` on malformed JSON, unknown
    /// fields, an unknown suite name or a multiplier outside 1–4.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::InvalidConfiguration(e.to_string()))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidConfiguration` if serialization fails.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidConfiguration(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
