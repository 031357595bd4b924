//! Error types and status codes for `vccrypt`.
//!
//! Every fallible operation returns [`CryptoError`]. Callers that speak in
//! integer status codes (FFI shims, wire-level RPC) translate with
//! [`CryptoError::code`] or [`status_code`]; success is always
//! [`STATUS_SUCCESS`].

use std::fmt;
use thiserror::Error;

use crate::registry::InterfaceId;

/// Status code reported for a successful operation.
pub const STATUS_SUCCESS: u32 = 0;

/// The component an error originated in.
///
/// Each component owns a contiguous range of status codes starting at
/// [`Component::base`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// Byte buffers and allocation.
    Buffer,
    /// Hash facade and SHA-2 core.
    Hash,
    /// Message authentication codes.
    Mac,
    /// Block cipher facade (AES-CBC).
    Block,
    /// Stream cipher facade (AES-CTR).
    Stream,
    /// Digital signatures.
    Signature,
    /// Key agreement.
    KeyAgreement,
    /// Random byte source.
    Prng,
    /// Password-based key derivation.
    KeyDerivation,
    /// Algorithm registry.
    Registry,
    /// Mock suite harness.
    Mock,
    /// Crypto suite construction.
    Suite,
}

impl Component {
    /// First status code of this component's range.
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::Buffer => 0x0100,
            Self::Hash => 0x0200,
            Self::Mac => 0x0300,
            Self::Block => 0x0400,
            Self::Stream => 0x0500,
            Self::Signature => 0x0600,
            Self::KeyAgreement => 0x0700,
            Self::Prng => 0x0800,
            Self::KeyDerivation => 0x0900,
            Self::Registry => 0x0A00,
            Self::Mock => 0x0B00,
            Self::Suite => 0x0C00,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Hash => "hash",
            Self::Mac => "mac",
            Self::Block => "block cipher",
            Self::Stream => "stream cipher",
            Self::Signature => "digital signature",
            Self::KeyAgreement => "key agreement",
            Self::Prng => "prng",
            Self::KeyDerivation => "key derivation",
            Self::Registry => "registry",
            Self::Mock => "mock",
            Self::Suite => "suite",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Disallowed size, out-of-range counter or otherwise malformed input.
    #[error("{component}: invalid argument: {reason}")]
    InvalidArgument {
        /// Component that rejected the input.
        component: Component,
        /// Human-readable description of the rejected input.
        reason: String,
    },

    /// The allocator could not satisfy a request.
    #[error("{0}: out of memory")]
    OutOfMemory(Component),

    /// Buffer copy between regions of different sizes.
    #[error("buffer copy size mismatch: {expected} bytes expected, {actual} given")]
    CopySizeMismatch {
        /// Size of the destination buffer.
        expected: usize,
        /// Size of the source data.
        actual: usize,
    },

    /// The AES key schedule rejected an encryption key.
    #[error("{0}: bad encryption key")]
    BadEncryptionKey(Component),

    /// The AES key schedule rejected a decryption key.
    #[error("{0}: bad decryption key")]
    BadDecryptionKey(Component),

    /// A signature or authentication code did not match.
    #[error("{0}: verification failed")]
    VerificationFailed(Component),

    /// No implementation is registered for the requested identifier.
    #[error("no {interface} implementation registered for id {implementation:#010x}")]
    NotRegistered {
        /// Capability interface that was queried.
        interface: InterfaceId,
        /// Implementation identifier that was queried.
        implementation: u32,
    },

    /// The mock suite has no closure installed for an operation.
    #[error("mock operation `{0}` has no installed closure")]
    MockNotAdded(&'static str),

    /// Suite configuration could not be parsed or names an unknown value.
    #[error("invalid suite configuration: {0}")]
    InvalidConfiguration(String),

    /// Catch-all failure inside a component (entropy source, back-end error).
    #[error("{component}: {reason}")]
    Failure {
        /// Component that failed.
        component: Component,
        /// Description of the failure.
        reason: String,
    },
}

impl CryptoError {
    /// Shorthand for [`CryptoError::InvalidArgument`].
    pub(crate) fn invalid(component: Component, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            component,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CryptoError::Failure`].
    pub(crate) fn failure(component: Component, reason: impl Into<String>) -> Self {
        Self::Failure {
            component,
            reason: reason.into(),
        }
    }

    /// The component this error belongs to.
    #[must_use]
    pub const fn component(&self) -> Component {
        match self {
            Self::InvalidArgument { component, .. } | Self::Failure { component, .. } => {
                *component
            }
            Self::OutOfMemory(component)
            | Self::BadEncryptionKey(component)
            | Self::BadDecryptionKey(component)
            | Self::VerificationFailed(component) => *component,
            Self::CopySizeMismatch { .. } => Component::Buffer,
            Self::NotRegistered { .. } => Component::Registry,
            Self::MockNotAdded(_) => Component::Mock,
            Self::InvalidConfiguration(_) => Component::Suite,
        }
    }

    /// Integer status code for this error. Never equal to [`STATUS_SUCCESS`].
    #[must_use]
    pub const fn code(&self) -> u32 {
        let offset = match self {
            Self::InvalidArgument { .. } | Self::MockNotAdded(_) | Self::InvalidConfiguration(_) => {
                0x01
            }
            Self::OutOfMemory(_) => 0x02,
            Self::BadEncryptionKey(_) => 0x03,
            Self::BadDecryptionKey(_) => 0x04,
            Self::CopySizeMismatch { .. } => 0x05,
            Self::VerificationFailed(_) => 0x06,
            Self::NotRegistered { .. } => 0x10,
            Self::Failure { .. } => 0xFF,
        };
        self.component().base() | offset
    }
}

/// Translate a result into its integer status code.
#[must_use]
pub fn status_code<T>(result: &Result<T, CryptoError>) -> u32 {
    match result {
        Ok(_) => STATUS_SUCCESS,
        Err(e) => e.code(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
