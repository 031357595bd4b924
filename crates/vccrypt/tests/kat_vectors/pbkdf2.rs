//! PBKDF2 Known-Answer Tests over HMAC-SHA-512 and HMAC-SHA-512/256.

use super::hex;
use vccrypt::kdf::{self, KeyDerivationOptions};
use vccrypt::mac;
use vccrypt::{ids, system_allocator};

fn options(prf: u32) -> KeyDerivationOptions {
    kdf::register_pbkdf2();
    mac::register_hmac_sha_2_512();
    mac::register_hmac_sha_2_512_256();
    KeyDerivationOptions::new(&system_allocator(), ids::KEY_DERIVATION_PBKDF2, prf)
        .expect("pbkdf2 should resolve")
}

fn derive(prf: u32, rounds: u32, len: usize) -> Vec<u8> {
    let mut dk = vec![0u8; len];
    options(prf)
        .init()
        .derive(&mut dk, b"password", b"salt", rounds)
        .expect("derive should succeed");
    dk
}

#[test]
fn hmac_sha512_one_round() {
    assert_eq!(
        derive(ids::MAC_HMAC_SHA_2_512, 1, 64),
        hex(
            "867F70CF1ADE02CFF3752599A3A53DC4AF34C7A669815AE5D513554E1C8CF252\
             C02D470A285A0501BAD999BFE943C08F050235D7D68B1DA55E63F73B60A57FCE"
        )
    );
}

#[test]
fn hmac_sha512_two_rounds() {
    assert_eq!(
        derive(ids::MAC_HMAC_SHA_2_512, 2, 64),
        hex(
            "e1d9c16aa681708a45f5c7c4e215ceb66e011a2e9f0040713f18aefdb866d53c\
             f76cab2868a39b9f7840edce4fef5a82be67335c77a6068e04112754f27ccf4e"
        )
    );
}

/// A shorter request is a prefix of a longer one.
#[test]
fn hmac_sha512_truncated_output() {
    let full = derive(ids::MAC_HMAC_SHA_2_512, 2, 64);
    assert_eq!(derive(ids::MAC_HMAC_SHA_2_512, 2, 20), full[..20]);
}

/// 40 bytes over a 32-byte PRF: the second chunk is cut to 8 bytes.
#[test]
fn hmac_sha512_256_partial_last_chunk() {
    assert_eq!(
        derive(ids::MAC_HMAC_SHA_2_512_256, 2, 40),
        hex(
            "fcfd108c99cc888ec0af9f184885aff5f02d19a956afad9ccea4d56a482b851b\
             ec1af5635d574bc1"
        )
    );
}
