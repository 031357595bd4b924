//! AES block transform with a configurable round multiplier.
//!
//! This module provides:
//! - [`AesKey`] — an expanded key schedule for one direction, held in
//!   allocator-backed storage
//! - [`KeyScheduleError`] — why a schedule could not be built
//! - [`RoundMultiplier`] — the round-count knob (1×, 2×, 3×, 4×)
//!
//! With [`RoundMultiplier::Fips`] the transform is FIPS 197 AES. The larger
//! multipliers iterate the standard round function `14 × m` times (for a
//! 256-bit key) and extend the key schedule to match, continuing the Rcon
//! sequence in GF(2⁸) past its ten FIPS values. They are not FIPS 197, but are
//! bit-for-bit reproducible and kept for compatibility with existing
//! ciphertexts.
//!
//! The multiplier is not recorded in ciphertext; both sides must agree on it
//! out of band.

#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

mod tables;

use crate::error::{Component, CryptoError};
use crate::memory::{Buffer, SharedAllocator};
use serde::{Deserialize, Serialize};
use std::fmt;
use tables::{INV_SBOX, SBOX};

/// AES block length in bytes.
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_SIZE_256: usize = 32;

// ---------------------------------------------------------------------------
// Round multiplier
// ---------------------------------------------------------------------------

/// Scales the AES round count. Serialized as its integer factor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoundMultiplier {
    /// FIPS 197 round count (14 rounds for AES-256).
    #[default]
    Fips,
    /// Twice the FIPS round count.
    Double,
    /// Three times the FIPS round count.
    Triple,
    /// Four times the FIPS round count.
    Quadruple,
}

impl RoundMultiplier {
    /// All multipliers, in increasing order.
    pub const ALL: [Self; 4] = [Self::Fips, Self::Double, Self::Triple, Self::Quadruple];

    /// Integer factor applied to the FIPS round count.
    #[must_use]
    pub const fn factor(self) -> usize {
        match self {
            Self::Fips => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quadruple => 4,
        }
    }

    /// Round count for a key of `key_len` bytes, if the length is supported.
    #[must_use]
    pub const fn rounds_for(self, key_len: usize) -> Option<usize> {
        match key_len {
            16 => Some(10 * self.factor()),
            24 => Some(12 * self.factor()),
            32 => Some(14 * self.factor()),
            _ => None,
        }
    }
}

impl TryFrom<u8> for RoundMultiplier {
    type Error = CryptoError;

    fn try_from(factor: u8) -> Result<Self, Self::Error> {
        match factor {
            1 => Ok(Self::Fips),
            2 => Ok(Self::Double),
            3 => Ok(Self::Triple),
            4 => Ok(Self::Quadruple),
            other => Err(CryptoError::InvalidConfiguration(format!(
                "unsupported AES round multiplier: {other} (expected 1-4)"
            ))),
        }
    }
}

impl From<RoundMultiplier> for u8 {
    fn from(multiplier: RoundMultiplier) -> Self {
        match multiplier {
            RoundMultiplier::Fips => 1,
            RoundMultiplier::Double => 2,
            RoundMultiplier::Triple => 3,
            RoundMultiplier::Quadruple => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Key schedule
// ---------------------------------------------------------------------------

/// The key schedule could not be built.
#[derive(Debug, thiserror::Error)]
pub enum KeyScheduleError {
    /// The key is not 16, 24 or 32 bytes long.
    #[error("unsupported AES key length: {0} bytes (expected 16, 24 or 32)")]
    UnsupportedKeyLength(usize),

    /// The allocator could not provide storage for the round keys.
    #[error("out of memory while expanding the AES key schedule")]
    OutOfMemory,
}

impl KeyScheduleError {
    /// Report an encryption-schedule failure against `component`.
    pub(crate) fn for_encryption(self, component: Component) -> CryptoError {
        match self {
            Self::UnsupportedKeyLength(_) => CryptoError::BadEncryptionKey(component),
            Self::OutOfMemory => CryptoError::OutOfMemory(component),
        }
    }

    /// Report a decryption-schedule failure against `component`.
    pub(crate) fn for_decryption(self, component: Component) -> CryptoError {
        match self {
            Self::UnsupportedKeyLength(_) => CryptoError::BadDecryptionKey(component),
            Self::OutOfMemory => CryptoError::OutOfMemory(component),
        }
    }
}

/// Expanded AES key schedule for a single direction.
///
/// Built by [`AesKey::encryption`] or [`AesKey::decryption`]; the two are not
/// interchangeable. The round keys live in a [`Buffer`] drawn from the
/// caller's allocator, stored as big-endian words, and are zeroed when the
/// schedule is dropped.
pub struct AesKey {
    round_keys: Buffer,
    rounds: usize,
}

impl AesKey {
    /// Expand `key` (16, 24 or 32 bytes) into an encryption schedule.
    ///
    /// # Errors
    ///
    /// - [`KeyScheduleError::UnsupportedKeyLength`] for any other key length
    /// - [`KeyScheduleError::OutOfMemory`] if `allocator` cannot hold the
    ///   round keys
    pub fn encryption(
        allocator: &SharedAllocator,
        key: &[u8],
        multiplier: RoundMultiplier,
    ) -> Result<Self, KeyScheduleError> {
        let rounds = multiplier
            .rounds_for(key.len())
            .ok_or(KeyScheduleError::UnsupportedKeyLength(key.len()))?;
        let nk = key.len() / 4;
        let words = 4 * (rounds + 1);

        let mut rk = Buffer::new(allocator, 4 * words).map_err(|_| KeyScheduleError::OutOfMemory)?;
        rk[..key.len()].copy_from_slice(key);

        let mut rcon: u8 = 0x01;
        for i in nk..words {
            let mut temp = word_at(&rk, i - 1);
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ (u32::from(rcon) << 24);
                rcon = xtime(rcon);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            let word = word_at(&rk, i - nk) ^ temp;
            rk[4 * i..4 * i + 4].copy_from_slice(&word.to_be_bytes());
        }

        Ok(Self {
            round_keys: rk,
            rounds,
        })
    }

    /// Expand `key` into a decryption schedule for the equivalent inverse
    /// cipher: the encryption schedule in reverse round order, with
    /// `InvMixColumns` applied to every round key except the first and last.
    ///
    /// # Errors
    ///
    /// Same as [`AesKey::encryption`].
    pub fn decryption(
        allocator: &SharedAllocator,
        key: &[u8],
        multiplier: RoundMultiplier,
    ) -> Result<Self, KeyScheduleError> {
        let enc = Self::encryption(allocator, key, multiplier)?;
        let rounds = enc.rounds;

        let mut rk = Buffer::new(allocator, enc.round_keys.size())
            .map_err(|_| KeyScheduleError::OutOfMemory)?;
        for round in 0..=rounds {
            let src = 4 * (rounds - round);
            let dst = 4 * round;
            for col in 0..4 {
                let word = word_at(&enc.round_keys, src + col);
                let word = if round == 0 || round == rounds {
                    word
                } else {
                    inv_mix_column_word(word)
                };
                let at = 4 * (dst + col);
                rk[at..at + 4].copy_from_slice(&word.to_be_bytes());
            }
        }

        Ok(Self {
            round_keys: rk,
            rounds,
        })
    }

    /// Number of rounds this schedule runs.
    #[must_use]
    pub const fn rounds(&self) -> usize {
        self.rounds
    }

    /// Encrypt one block in place. Only valid for an encryption schedule.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        add_round_key(block, self.round_key(0));
        for round in 1..self.rounds {
            sub_bytes(block, &SBOX);
            shift_rows(block);
            mix_columns(block);
            add_round_key(block, self.round_key(round));
        }
        sub_bytes(block, &SBOX);
        shift_rows(block);
        add_round_key(block, self.round_key(self.rounds));
    }

    /// Decrypt one block in place. Only valid for a decryption schedule.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        add_round_key(block, self.round_key(0));
        for round in 1..self.rounds {
            sub_bytes(block, &INV_SBOX);
            inv_shift_rows(block);
            inv_mix_columns(block);
            add_round_key(block, self.round_key(round));
        }
        sub_bytes(block, &INV_SBOX);
        inv_shift_rows(block);
        add_round_key(block, self.round_key(self.rounds));
    }

    fn round_key(&self, round: usize) -> &[u8] {
        &self.round_keys[BLOCK_SIZE * round..BLOCK_SIZE * (round + 1)]
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesKey(rounds = {}, ***)", self.rounds)
    }
}

// ---------------------------------------------------------------------------
// Round functions
// ---------------------------------------------------------------------------

/// Multiply by x in GF(2⁸) without a data-dependent branch.
const fn xtime(a: u8) -> u8 {
    (a << 1) ^ (((a >> 7) & 1) * 0x1b)
}

/// Multiply `a` by the public constant `b` in GF(2⁸).
const fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

fn sub_word(word: u32) -> u32 {
    let [a, b, c, d] = word.to_be_bytes();
    u32::from_be_bytes([
        SBOX[usize::from(a)],
        SBOX[usize::from(b)],
        SBOX[usize::from(c)],
        SBOX[usize::from(d)],
    ])
}

fn word_at(schedule: &[u8], index: usize) -> u32 {
    let b = &schedule[4 * index..4 * index + 4];
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn add_round_key(block: &mut [u8; BLOCK_SIZE], round_key: &[u8]) {
    for (byte, key) in block.iter_mut().zip(round_key) {
        *byte ^= key;
    }
}

fn sub_bytes(block: &mut [u8; BLOCK_SIZE], table: &[u8; 256]) {
    for byte in block.iter_mut() {
        *byte = table[usize::from(*byte)];
    }
}

/// Row `r` rotates left by `r`. The state is column-major: byte `4c + r`.
fn shift_rows(block: &mut [u8; BLOCK_SIZE]) {
    let old = *block;
    for (i, byte) in block.iter_mut().enumerate() {
        *byte = old[(i + 4 * (i % 4)) % BLOCK_SIZE];
    }
}

fn inv_shift_rows(block: &mut [u8; BLOCK_SIZE]) {
    let old = *block;
    for (i, byte) in block.iter_mut().enumerate() {
        *byte = old[(i + 12 * (i % 4)) % BLOCK_SIZE];
    }
}

fn mix_columns(block: &mut [u8; BLOCK_SIZE]) {
    for column in block.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = xtime(a0) ^ xtime(a1) ^ a1 ^ a2 ^ a3;
        column[1] = a0 ^ xtime(a1) ^ xtime(a2) ^ a2 ^ a3;
        column[2] = a0 ^ a1 ^ xtime(a2) ^ xtime(a3) ^ a3;
        column[3] = xtime(a0) ^ a0 ^ a1 ^ a2 ^ xtime(a3);
    }
}

fn inv_mix_column(a: [u8; 4]) -> [u8; 4] {
    [
        gmul(a[0], 14) ^ gmul(a[1], 11) ^ gmul(a[2], 13) ^ gmul(a[3], 9),
        gmul(a[0], 9) ^ gmul(a[1], 14) ^ gmul(a[2], 11) ^ gmul(a[3], 13),
        gmul(a[0], 13) ^ gmul(a[1], 9) ^ gmul(a[2], 14) ^ gmul(a[3], 11),
        gmul(a[0], 11) ^ gmul(a[1], 13) ^ gmul(a[2], 9) ^ gmul(a[3], 14),
    ]
}

fn inv_mix_columns(block: &mut [u8; BLOCK_SIZE]) {
    for column in block.chunks_exact_mut(4) {
        let mixed = inv_mix_column([column[0], column[1], column[2], column[3]]);
        column.copy_from_slice(&mixed);
    }
}

fn inv_mix_column_word(word: u32) -> u32 {
    u32::from_be_bytes(inv_mix_column(word.to_be_bytes()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
