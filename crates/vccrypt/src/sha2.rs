//! SHA-512 compression function and streaming state.
//!
//! One state type serves SHA-512, SHA-384 and SHA-512/256; the variants differ
//! only in their initial hash value and in how many output bytes are kept.
//!
//! Inputs are buffered into 128-byte blocks. The message length is tracked as
//! a 128-bit bit count `(high, low)` and encoded big-endian in the final block.

#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use zeroize::Zeroize;

/// SHA-512 block length in bytes.
pub const BLOCK_SIZE: usize = 128;

/// Size of the big-endian length field that closes the final block.
const LENGTH_FIELD: usize = 16;

/// SHA-2 variants built on the 64-bit compression function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sha2Variant {
    /// SHA-384 (48-byte digest).
    Sha384,
    /// SHA-512 (64-byte digest).
    Sha512,
    /// SHA-512/256 (32-byte digest).
    Sha512_256,
}

impl Sha2Variant {
    /// Digest length in bytes.
    #[must_use]
    pub const fn digest_size(self) -> usize {
        match self {
            Self::Sha384 => 48,
            Self::Sha512 => 64,
            Self::Sha512_256 => 32,
        }
    }

    /// Conventional algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha512_256 => "SHA-512/256",
        }
    }

    const fn initial_hash(self) -> [u64; 8] {
        match self {
            Self::Sha384 => IV_SHA_384,
            Self::Sha512 => IV_SHA_512,
            Self::Sha512_256 => IV_SHA_512_256,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const K: [u64; 80] = [
    0x428a2f98d728ae22, 0x7137449123ef65cd, 0xb5c0fbcfec4d3b2f, 0xe9b5dba58189dbbc,
    0x3956c25bf348b538, 0x59f111f1b605d019, 0x923f82a4af194f9b, 0xab1c5ed5da6d8118,
    0xd807aa98a3030242, 0x12835b0145706fbe, 0x243185be4ee4b28c, 0x550c7dc3d5ffb4e2,
    0x72be5d74f27b896f, 0x80deb1fe3b1696b1, 0x9bdc06a725c71235, 0xc19bf174cf692694,
    0xe49b69c19ef14ad2, 0xefbe4786384f25e3, 0x0fc19dc68b8cd5b5, 0x240ca1cc77ac9c65,
    0x2de92c6f592b0275, 0x4a7484aa6ea6e483, 0x5cb0a9dcbd41fbd4, 0x76f988da831153b5,
    0x983e5152ee66dfab, 0xa831c66d2db43210, 0xb00327c898fb213f, 0xbf597fc7beef0ee4,
    0xc6e00bf33da88fc2, 0xd5a79147930aa725, 0x06ca6351e003826f, 0x142929670a0e6e70,
    0x27b70a8546d22ffc, 0x2e1b21385c26c926, 0x4d2c6dfc5ac42aed, 0x53380d139d95b3df,
    0x650a73548baf63de, 0x766a0abb3c77b2a8, 0x81c2c92e47edaee6, 0x92722c851482353b,
    0xa2bfe8a14cf10364, 0xa81a664bbc423001, 0xc24b8b70d0f89791, 0xc76c51a30654be30,
    0xd192e819d6ef5218, 0xd69906245565a910, 0xf40e35855771202a, 0x106aa07032bbd1b8,
    0x19a4c116b8d2d0c8, 0x1e376c085141ab53, 0x2748774cdf8eeb99, 0x34b0bcb5e19b48a8,
    0x391c0cb3c5c95a63, 0x4ed8aa4ae3418acb, 0x5b9cca4f7763e373, 0x682e6ff3d6b2b8a3,
    0x748f82ee5defb2fc, 0x78a5636f43172f60, 0x84c87814a1f0ab72, 0x8cc702081a6439ec,
    0x90befffa23631e28, 0xa4506cebde82bde9, 0xbef9a3f7b2c67915, 0xc67178f2e372532b,
    0xca273eceea26619c, 0xd186b8c721c0c207, 0xeada7dd6cde0eb1e, 0xf57d4f7fee6ed178,
    0x06f067aa72176fba, 0x0a637dc5a2c898a6, 0x113f9804bef90dae, 0x1b710b35131c471b,
    0x28db77f523047d84, 0x32caab7b40c72493, 0x3c9ebe0a15c9bebc, 0x431d67c49c100d4c,
    0x4cc5d4becb3e42b6, 0x597f299cfc657e2a, 0x5fcb6fab3ad6faec, 0x6c44198c4a475817,
];
const IV_SHA_512: [u64; 8] = [
    0x6a09e667f3bcc908, 0xbb67ae8584caa73b, 0x3c6ef372fe94f82b, 0xa54ff53a5f1d36f1,
    0x510e527fade682d1, 0x9b05688c2b3e6c1f, 0x1f83d9abfb41bd6b, 0x5be0cd19137e2179,
];
const IV_SHA_384: [u64; 8] = [
    0xcbbb9d5dc1059ed8, 0x629a292a367cd507, 0x9159015a3070dd17, 0x152fecd8f70e5939,
    0x67332667ffc00b31, 0x8eb44a8768581511, 0xdb0c2e0d64f98fa7, 0x47b5481dbefa4fa4,
];
const IV_SHA_512_256: [u64; 8] = [
    0x22312194fc2bf72c, 0x9f555fa3c84c64c2, 0x2393b86b6f53b151, 0x963877195940eabd,
    0x96283ee2a88effe3, 0xbe5e1e2553863992, 0x2b0199fc2c85b8aa, 0x0eb72ddc81c52ca2,
];

// ---------------------------------------------------------------------------
// Streaming state
// ---------------------------------------------------------------------------

/// Bytes of chaining value at the front of the state storage.
const HASH_BYTES: usize = 64;

/// Streaming SHA-512 family state.
///
/// The chaining value (as big-endian words) and the partial message block
/// live in one [`Buffer`] from the caller's allocator, zeroed on drop.
pub struct Sha512State {
    /// `h[0..8]` big-endian, then the message block.
    storage: Buffer,
    /// Low 64 bits of the message length in bits.
    nl: u64,
    /// High 64 bits of the message length in bits.
    nh: u64,
    buf_len: usize,
    variant: Sha2Variant,
}

impl Sha512State {
    /// Fresh state for `variant`, with storage drawn from `allocator`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::OutOfMemory(Component::Hash)` if the allocator
    /// cannot hold the state.
    pub fn new(allocator: &SharedAllocator, variant: Sha2Variant) -> Result<Self, CryptoError> {
        let mut state = Self {
            storage: Buffer::for_component(allocator, HASH_BYTES + BLOCK_SIZE, Component::Hash)?,
            nl: 0,
            nh: 0,
            buf_len: 0,
            variant,
        };
        state.reset();
        Ok(state)
    }

    /// Variant this state computes.
    #[must_use]
    pub const fn variant(&self) -> Sha2Variant {
        self.variant
    }

    /// Digest length produced by [`Sha512State::finalize`].
    #[must_use]
    pub const fn digest_size(&self) -> usize {
        self.variant.digest_size()
    }

    /// Chaining value and message block, borrowed separately.
    fn split(&mut self) -> (&mut [u8], &mut [u8]) {
        self.storage.split_at_mut(HASH_BYTES)
    }

    /// Return to the initial state of the same variant.
    pub fn reset(&mut self) {
        let initial = self.variant.initial_hash();
        let (h, buf) = self.split();
        for (bytes, word) in h.chunks_exact_mut(8).zip(initial) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }
        buf.zeroize();
        self.nl = 0;
        self.nh = 0;
        self.buf_len = 0;
    }

    /// Absorb `data`. An empty slice is a no-op.
    pub fn update(&mut self, mut data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let bits = (data.len() as u64) << 3;
        let (low, carry) = self.nl.overflowing_add(bits);
        self.nl = low;
        self.nh = self
            .nh
            .wrapping_add((data.len() as u64) >> 61)
            .wrapping_add(u64::from(carry));

        let mut buf_len = self.buf_len;
        let (h, buf) = self.split();
        if buf_len > 0 {
            let take = (BLOCK_SIZE - buf_len).min(data.len());
            buf[buf_len..buf_len + take].copy_from_slice(&data[..take]);
            buf_len += take;
            data = &data[take..];
            if buf_len < BLOCK_SIZE {
                self.buf_len = buf_len;
                return;
            }
            compress(h, buf);
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            compress(h, block);
        }

        let rest = blocks.remainder();
        buf[..rest.len()].copy_from_slice(rest);
        self.buf_len = rest.len();
    }

    /// Pad, process the final block(s) and write the digest to the start of
    /// `out`. The state is reset afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidArgument` if `out` is shorter than the
    /// digest; the state is left untouched in that case.
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let size = self.digest_size();
        let out = out.get_mut(..size).ok_or_else(|| {
            CryptoError::invalid(
                Component::Hash,
                format!("digest output must be at least {size} bytes"),
            )
        })?;

        let (nh, nl) = (self.nh, self.nl);
        let mut buf_len = self.buf_len;
        let (h, buf) = self.split();
        buf[buf_len] = 0x80;
        buf_len += 1;
        if buf_len > BLOCK_SIZE - LENGTH_FIELD {
            buf[buf_len..].fill(0);
            compress(h, buf);
            buf_len = 0;
        }
        buf[buf_len..BLOCK_SIZE - LENGTH_FIELD].fill(0);
        buf[BLOCK_SIZE - LENGTH_FIELD..BLOCK_SIZE - 8].copy_from_slice(&nh.to_be_bytes());
        buf[BLOCK_SIZE - 8..].copy_from_slice(&nl.to_be_bytes());
        compress(h, buf);

        // The chaining value is stored big-endian, so the digest is its prefix.
        out.copy_from_slice(&h[..size]);

        self.reset();
        Ok(())
    }
}

impl std::fmt::Debug for Sha512State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sha512State({}, ***)", self.variant.name())
    }
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

const fn big_sigma0(x: u64) -> u64 {
    x.rotate_right(28) ^ x.rotate_right(34) ^ x.rotate_right(39)
}

const fn big_sigma1(x: u64) -> u64 {
    x.rotate_right(14) ^ x.rotate_right(18) ^ x.rotate_right(41)
}

const fn small_sigma0(x: u64) -> u64 {
    x.rotate_right(1) ^ x.rotate_right(8) ^ (x >> 7)
}

const fn small_sigma1(x: u64) -> u64 {
    x.rotate_right(19) ^ x.rotate_right(61) ^ (x >> 6)
}

const fn ch(x: u64, y: u64, z: u64) -> u64 {
    (x & y) ^ (!x & z)
}

const fn maj(x: u64, y: u64, z: u64) -> u64 {
    (x & y) ^ (x & z) ^ (y & z)
}

/// Process one 128-byte block into the big-endian chaining value `h`.
fn compress(h: &mut [u8], block: &[u8]) {
    let mut w = [0u64; 80];
    for (word, bytes) in w.iter_mut().zip(block.chunks_exact(8)) {
        let mut be = [0u8; 8];
        be.copy_from_slice(bytes);
        *word = u64::from_be_bytes(be);
    }
    for i in 16..80 {
        w[i] = small_sigma1(w[i - 2])
            .wrapping_add(w[i - 7])
            .wrapping_add(small_sigma0(w[i - 15]))
            .wrapping_add(w[i - 16]);
    }

    let mut state = [0u64; 8];
    for (word, bytes) in state.iter_mut().zip(h.chunks_exact(8)) {
        let mut be = [0u8; 8];
        be.copy_from_slice(bytes);
        *word = u64::from_be_bytes(be);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut hh] = state;
    for (k, wi) in K.iter().zip(w.iter()) {
        let t1 = hh
            .wrapping_add(big_sigma1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(*k)
            .wrapping_add(*wi);
        let t2 = big_sigma0(a).wrapping_add(maj(a, b, c));
        hh = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for ((bytes, word), v) in h
        .chunks_exact_mut(8)
        .zip(state.iter_mut())
        .zip([a, b, c, d, e, f, g, hh])
    {
        *word = word.wrapping_add(v);
        bytes.copy_from_slice(&word.to_be_bytes());
    }

    w.zeroize();
    state.zeroize();
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
