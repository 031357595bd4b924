//! `vccrypt` — Pluggable cryptographic primitives and crypto suites for Velo.
//!
//! Algorithms register themselves in a process-wide [`registry`] and are
//! reached through per-capability options and contexts (hash, MAC, block and
//! stream ciphers, signatures, key agreement, PRNG, key derivation). A
//! [`suite::SuiteOptions`] picks one algorithm per capability.
//!
//! No network, no async, no global subscriber: the crate only emits
//! `tracing` events.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;
pub mod registry;

pub mod aes;
pub mod sha2;

pub mod block;
pub mod hash;
pub mod mac;
pub mod stream;

pub mod kdf;

pub mod key_agreement;
pub mod signature;

pub mod prng;

pub mod mock;
pub mod suite;

pub use aes::{AesKey, KeyScheduleError, RoundMultiplier};
pub use block::{BlockContext, BlockOptions};
pub use error::{status_code, Component, CryptoError, STATUS_SUCCESS};
pub use hash::{HashContext, HashOptions, Sha2Variant};
pub use kdf::{KeyDerivationContext, KeyDerivationOptions};
pub use key_agreement::{KeyAgreementContext, KeyAgreementOptions};
pub use mac::{MacContext, MacOptions};
pub use memory::{system_allocator, Allocator, Buffer, SharedAllocator, SystemAllocator};
pub use mock::{MockOp, MockSuite};
pub use prng::{PrngContext, PrngOptions};
pub use registry::{ids, InterfaceId, Registration};
pub use signature::{SignatureContext, SignatureOptions};
pub use stream::{StreamContext, StreamOptions};
pub use suite::{register_velo_v1, SuiteConfig, SuiteId, SuiteOptions};
