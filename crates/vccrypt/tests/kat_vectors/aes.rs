//! AES Known-Answer Tests.
//!
//! FIPS 197 Appendix C vectors for the standard round count, fixed vectors
//! for the 2×/3×/4× round variants, and the counter-mode keystream layout.
//! A single CBC block under an all-zero IV is plain AES, so the block
//! facade is checked directly against ECB vectors.

use super::hex;
use vccrypt::aes::{AesKey, RoundMultiplier};
use vccrypt::block::{self, BlockOptions};
use vccrypt::stream::{self, StreamOptions};
use vccrypt::system_allocator;

const FIPS_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const FIPS_PLAINTEXT: &str = "00112233445566778899aabbccddeeff";

fn cbc(multiplier: RoundMultiplier) -> BlockOptions {
    let (id, register) = block::implementation_for(multiplier);
    register();
    BlockOptions::new(&system_allocator(), id).expect("block cipher should resolve")
}

fn encrypt_one_block(multiplier: RoundMultiplier, key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut ctx = cbc(multiplier)
        .init(key, true)
        .expect("init should succeed");
    let mut out = [0u8; 16];
    ctx.encrypt(&[0u8; 16], plaintext, &mut out)
        .expect("encrypt should succeed");
    out.to_vec()
}

/// FIPS 197 Appendix C.3 — AES-256.
#[test]
fn fips197_c3_aes256() {
    let ciphertext = encrypt_one_block(
        RoundMultiplier::Fips,
        &hex(FIPS_KEY),
        &hex(FIPS_PLAINTEXT),
    );
    assert_eq!(ciphertext, hex("8ea2b7ca516745bfeafc49904b496089"));

    let mut ctx = cbc(RoundMultiplier::Fips)
        .init(&hex(FIPS_KEY), false)
        .expect("init should succeed");
    let mut plain = [0u8; 16];
    ctx.decrypt(&[0u8; 16], &ciphertext, &mut plain)
        .expect("decrypt should succeed");
    assert_eq!(plain.to_vec(), hex(FIPS_PLAINTEXT));
}

/// FIPS 197 Appendix C.1 / C.2 — the key schedule also takes 128/192-bit keys.
#[test]
fn fips197_c1_c2_shorter_keys() {
    let cases = [
        (
            "000102030405060708090a0b0c0d0e0f",
            "69c4e0d86a7b0430d8cdb78070b4c55a",
        ),
        (
            "000102030405060708090a0b0c0d0e0f1011121314151617",
            "dda97ca4864cdfe06eaf70a0ec0d7191",
        ),
    ];
    for (key, expected) in cases {
        let schedule = AesKey::encryption(&system_allocator(), &hex(key), RoundMultiplier::Fips)
            .expect("key schedule should accept the key");
        let mut block: [u8; 16] = hex(FIPS_PLAINTEXT).try_into().unwrap();
        schedule.encrypt_block(&mut block);
        assert_eq!(block.to_vec(), hex(expected));
    }
}

#[test]
fn round_multipliers_on_fips_key() {
    let cases = [
        (RoundMultiplier::Fips, "8ea2b7ca516745bfeafc49904b496089"),
        (RoundMultiplier::Double, "135fe63a2eefcd883ffa0f1b156e0d55"),
        (RoundMultiplier::Triple, "c2d948a09aaf9f803b03d142084508f5"),
        (RoundMultiplier::Quadruple, "57640406ee69c8238eae125f2b587e85"),
    ];
    for (multiplier, expected) in cases {
        assert_eq!(
            encrypt_one_block(multiplier, &hex(FIPS_KEY), &hex(FIPS_PLAINTEXT)),
            hex(expected),
            "multiplier {multiplier:?}"
        );
    }
}

#[test]
fn round_multipliers_on_zero_key() {
    let cases = [
        (RoundMultiplier::Fips, "dc95c078a2408989ad48a21492842087"),
        (RoundMultiplier::Double, "19951774cd0409729197e6027621c6d4"),
        (RoundMultiplier::Triple, "9f25f0c0055f73b1c29565ab7a2d35fb"),
        (RoundMultiplier::Quadruple, "1a144dd98299af5f3e3ac8c9a68eac5d"),
    ];
    for (multiplier, expected) in cases {
        assert_eq!(
            encrypt_one_block(multiplier, &[0u8; 32], &[0u8; 16]),
            hex(expected),
            "multiplier {multiplier:?}"
        );
    }
}

/// Counter-mode keystream block `k` is AES of `nonce || BE64(k)`; checked
/// against the FIPS key schedule for the first blocks and a resumed block.
/// (RFC 3686 vector #7 lives in the unit tests: its counter block is not
/// reachable from a byte position.)
#[test]
fn ctr_keystream_is_aes_of_counter_block() {
    let key = hex(FIPS_KEY);
    let nonce = hex("0011223344556677");
    let schedule = AesKey::encryption(&system_allocator(), &key, RoundMultiplier::Fips).unwrap();
    let expected_block = |index: u64| {
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&nonce);
        block[8..].copy_from_slice(&index.to_be_bytes());
        schedule.encrypt_block(&mut block);
        block
    };

    stream::register_aes_256_ctr_fips();
    let opts = StreamOptions::new(&system_allocator(), vccrypt::ids::STREAM_AES_256_CTR_FIPS)
        .expect("stream cipher should resolve");

    let mut ctx = opts.init(&key).expect("init should succeed");
    let mut out = [0u8; 8 + 48];
    let mut offset = 0;
    ctx.start_encryption(&nonce, &mut out, &mut offset)
        .expect("start should succeed");
    ctx.encrypt(&[0u8; 48], &mut out, &mut offset)
        .expect("encrypt should succeed");
    assert_eq!(&out[..8], nonce.as_slice());
    for index in 0..3u64 {
        let start = 8 + 16 * usize::try_from(index).unwrap();
        assert_eq!(out[start..start + 16], expected_block(index));
    }

    let mut resumed = [0u8; 16];
    let mut offset = 0;
    ctx.continue_encryption(&nonce, 1_000 * 16)
        .expect("continue should succeed");
    ctx.encrypt(&[0u8; 16], &mut resumed, &mut offset)
        .expect("encrypt should succeed");
    assert_eq!(resumed, expected_block(1_000));
}
