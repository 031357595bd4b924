//! Allocator capability and zeroing byte buffers.
//!
//! This module provides:
//! - [`Allocator`] — the host allocation capability, supplied by the caller
//! - [`SystemAllocator`] — the default heap-backed allocator
//! - [`Buffer`] — an owned, fixed-size byte region that is zeroed before it
//!   is handed back to its allocator
//!
//! Buffers routinely hold keys and plaintext, so zeroing on drop is not
//! optional: the region returned to [`Allocator::release`] is always all
//! zero bytes.

use crate::error::{Component, CryptoError};
use data_encoding::HEXLOWER_PERMISSIVE;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Allocator
// ---------------------------------------------------------------------------

/// Host allocation capability.
///
/// Owned by the caller; it must outlive every buffer and context that
/// references it, which [`SharedAllocator`] guarantees by reference counting.
/// Teardown of the allocator is its `Drop`.
pub trait Allocator: Send + Sync {
    /// Allocate a zero-filled region of exactly `size` bytes.
    ///
    /// Returns `None` when the request cannot be satisfied.
    fn allocate(&self, size: usize) -> Option<Vec<u8>>;

    /// Return a region previously obtained from [`Allocator::allocate`].
    ///
    /// The region has already been zeroed by its owner.
    fn release(&self, region: Vec<u8>);
}

/// Shared handle to an allocator.
pub type SharedAllocator = Arc<dyn Allocator>;

/// Heap-backed allocator using the global Rust allocator.
///
/// Allocation failure is reported as `None` instead of aborting.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Option<Vec<u8>> {
        let mut region = Vec::new();
        region.try_reserve_exact(size).ok()?;
        region.resize(size, 0);
        Some(region)
    }

    fn release(&self, region: Vec<u8>) {
        drop(region);
    }
}

/// Create a shared handle to the [`SystemAllocator`].
#[must_use]
pub fn system_allocator() -> SharedAllocator {
    Arc::new(SystemAllocator)
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Owned byte region allocated through an [`Allocator`].
///
/// - The size is fixed at construction and is never zero.
/// - Contents start zeroed.
/// - On drop the bytes are overwritten with zeros, then the region is
///   released to the allocator it came from.
/// - `Debug`/`Display` output is masked.
///
/// `Buffer` dereferences to `[u8]`, so it can be passed wherever the
/// capability contexts take byte slices.
pub struct Buffer {
    data: Vec<u8>,
    allocator: SharedAllocator,
}

impl Buffer {
    /// Allocate a zeroed buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidArgument` if `size` is zero
    /// - `CryptoError::OutOfMemory` if the allocator cannot satisfy the request
    pub fn new(allocator: &SharedAllocator, size: usize) -> Result<Self, CryptoError> {
        if size == 0 {
            return Err(CryptoError::invalid(
                Component::Buffer,
                "buffer size must be non-zero",
            ));
        }

        let data = allocator
            .allocate(size)
            .ok_or(CryptoError::OutOfMemory(Component::Buffer))?;
        if data.len() != size {
            allocator.release(data);
            return Err(CryptoError::OutOfMemory(Component::Buffer));
        }

        Ok(Self {
            data,
            allocator: Arc::clone(allocator),
        })
    }

    /// Allocate working storage for a capability context. Allocation failure
    /// is reported against `component` rather than [`Component::Buffer`].
    pub(crate) fn for_component(
        allocator: &SharedAllocator,
        size: usize,
        component: Component,
    ) -> Result<Self, CryptoError> {
        Self::new(allocator, size).map_err(|e| match e {
            CryptoError::OutOfMemory(_) => CryptoError::OutOfMemory(component),
            other => other,
        })
    }

    /// Allocate a buffer holding a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// Same as [`Buffer::new`] with `size = bytes.len()`.
    pub fn from_slice(allocator: &SharedAllocator, bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut buffer = Self::new(allocator, bytes.len())?;
        buffer.data.copy_from_slice(bytes);
        Ok(buffer)
    }

    /// Decode a hex string (either case) into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `hex` is not valid hex, plus
    /// the errors of [`Buffer::new`].
    pub fn from_hex(allocator: &SharedAllocator, hex: &str) -> Result<Self, CryptoError> {
        let mut decoded = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|e| CryptoError::invalid(Component::Buffer, format!("invalid hex: {e}")))?;
        let result = Self::from_slice(allocator, &decoded);
        decoded.zeroize();
        result
    }

    /// Number of bytes in the buffer.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Copy `src` into the beginning of this buffer.
    ///
    /// Bytes past `src.len()` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::CopySizeMismatch` if `src` is longer than the
    /// buffer.
    pub fn read_data(&mut self, src: &[u8]) -> Result<(), CryptoError> {
        let expected = self.data.len();
        let dst = self
            .data
            .get_mut(..src.len())
            .ok_or(CryptoError::CopySizeMismatch {
                expected,
                actual: src.len(),
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Copy the beginning of this buffer into `dst`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::CopySizeMismatch` if `dst` is longer than the
    /// buffer.
    pub fn write_data(&self, dst: &mut [u8]) -> Result<(), CryptoError> {
        let src = self
            .data
            .get(..dst.len())
            .ok_or(CryptoError::CopySizeMismatch {
                expected: self.data.len(),
                actual: dst.len(),
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Copy the entire contents of `src` into this buffer.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::CopySizeMismatch` unless both buffers have the
    /// same size.
    pub fn copy_from(&mut self, src: &Self) -> Result<(), CryptoError> {
        if src.size() != self.size() {
            return Err(CryptoError::CopySizeMismatch {
                expected: self.size(),
                actual: src.size(),
            });
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    /// Lowercase hex encoding of the contents.
    ///
    /// The returned string is ordinary heap memory; encode secrets only when
    /// the caller takes over responsibility for them.
    #[must_use]
    pub fn to_hex(&self) -> String {
        HEXLOWER_PERMISSIVE.encode(&self.data)
    }

    /// Handle of the allocator backing this buffer.
    #[must_use]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Zero in place so the allocator receives the scrubbed region.
        self.data.as_mut_slice().zeroize();
        self.allocator.release(std::mem::take(&mut self.data));
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Buffer(***)")
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Buffer(***)")
    }
}

// ---------------------------------------------------------------------------
// Constant-time comparison
// ---------------------------------------------------------------------------

/// Compare two byte slices without an early exit on the first difference.
///
/// Lengths are not secret; slices of different length compare unequal.
#[must_use]
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
