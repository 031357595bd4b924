//! RFC 7748 Section 6.1 — Curve25519 agreement Known-Answer Tests.
//!
//! The raw X25519 shared point of the RFC is hashed into the long-term
//! secret (SHA-512 for the auth slot, SHA-512/256 for the cipher slot).

use super::hex;
use vccrypt::key_agreement::{self, KeyAgreementOptions};
use vccrypt::{ids, system_allocator};

const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const BOB_PRIVATE: &str = "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb";
const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
const BOB_PUBLIC: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";

fn options(id: u32) -> KeyAgreementOptions {
    key_agreement::register_curve25519_sha512();
    key_agreement::register_curve25519_sha512_256();
    KeyAgreementOptions::new(&system_allocator(), id).expect("agreement should resolve")
}

fn long_term(id: u32, private: &str, public: &str) -> Vec<u8> {
    let opts = options(id);
    let mut shared = opts.shared_secret_buffer().expect("buffer should allocate");
    opts.init()
        .long_term_secret_create(&hex(private), &hex(public), &mut shared)
        .expect("agreement should succeed");
    shared.to_vec()
}

#[test]
fn auth_slot_is_sha512_of_shared_point() {
    let expected = hex(
        "3efdfd26b71935c26e478db0de1188df085a91d0c670c3522904d311cc554004\
         1439aa931fc0b3f2703313d72d6c118c8b055679b2f4c127c2981871a1a6a070",
    );
    let id = ids::KEY_AGREEMENT_CURVE25519_SHA512;
    assert_eq!(long_term(id, ALICE_PRIVATE, BOB_PUBLIC), expected);
    assert_eq!(long_term(id, BOB_PRIVATE, ALICE_PUBLIC), expected);
}

#[test]
fn cipher_slot_is_sha512_256_of_shared_point() {
    let expected = hex("3b746d5a515765a7d416a68783769356d115aaaec2559f8bcf806dc867e6173a");
    let id = ids::KEY_AGREEMENT_CURVE25519_SHA512_256;
    assert_eq!(long_term(id, ALICE_PRIVATE, BOB_PUBLIC), expected);
    assert_eq!(long_term(id, BOB_PRIVATE, ALICE_PUBLIC), expected);
}

/// Short-term secret = HMAC-SHA-512(long-term, nonce_a || nonce_b).
#[test]
fn auth_short_term_secret_binds_nonces() {
    let opts = options(ids::KEY_AGREEMENT_CURVE25519_SHA512);
    let nonce_a: Vec<u8> = (0u8..64).collect();
    let nonce_b: Vec<u8> = (64u8..128).collect();
    let mut shared = opts.shared_secret_buffer().expect("buffer should allocate");
    opts.init()
        .short_term_secret_create(
            &hex(ALICE_PRIVATE),
            &hex(BOB_PUBLIC),
            &nonce_a,
            &nonce_b,
            &mut shared,
        )
        .expect("agreement should succeed");
    assert_eq!(
        shared.to_vec(),
        hex(
            "ee76a92a51365ac7df315a0c5978b16840dbb1eb15e7f1ebb310795129de43d5\
             3800ba11b64b041ce2a5261766bd5b4b2574feefbd7be07a9e8d680ee915259e"
        )
    );
}
