//! RFC 4231 HMAC-SHA-512 Known-Answer Tests, plus a full-block key vector.

use super::hex;
use vccrypt::mac::{self, MacOptions};
use vccrypt::{ids, system_allocator};

fn hmac_sha512() -> MacOptions {
    mac::register_hmac_sha_2_512();
    MacOptions::new(&system_allocator(), ids::MAC_HMAC_SHA_2_512).expect("mac should resolve")
}

/// RFC 4231 Section 4.2 — test case 1.
#[test]
fn rfc4231_case_1() {
    let tag = hmac_sha512()
        .compute(&[0x0b; 20], b"Hi There")
        .expect("compute should succeed");
    assert_eq!(
        tag.to_vec(),
        hex(
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        )
    );
}

/// RFC 4231 Section 4.3 — test case 2 (key shorter than the output).
#[test]
fn rfc4231_case_2() {
    let tag = hmac_sha512()
        .compute(b"Jefe", b"what do ya want for nothing?")
        .expect("compute should succeed");
    assert_eq!(
        tag.to_vec(),
        hex(
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        )
    );
}

/// 64-byte key of 0xAA over "abc".
#[test]
fn key_of_0xaa_over_abc() {
    let opts = hmac_sha512();
    let key = [0xAA; 64];
    let tag = opts.compute(&key, b"abc").expect("compute should succeed");
    assert_eq!(
        tag.to_vec(),
        hex(
            "06ba03a44ef91bf5a4c7af26d9e7c7d8d80b95cc8da3eb01b231b9932203e71c\
             2aadb1f4fd2d8551d79e019727fb32f06b5970190a56bf6fabc97239f5dcaa61"
        )
    );
    opts.verify(&key, b"abc", &tag).expect("verify should accept the tag");
}

#[test]
fn streamed_equals_one_shot() {
    let opts = hmac_sha512();
    let mut ctx = opts.init(b"key").expect("init should succeed");
    ctx.digest(b"The quick brown fox ").expect("digest should succeed");
    ctx.digest(b"jumps over the lazy dog").expect("digest should succeed");
    let mut out = opts.buffer().expect("buffer should allocate");
    ctx.finalize(&mut out).expect("finalize should succeed");

    let one_shot = opts
        .compute(b"key", b"The quick brown fox jumps over the lazy dog")
        .expect("compute should succeed");
    assert_eq!(out.to_vec(), one_shot.to_vec());
    assert!(one_shot.to_hex().starts_with("b42af09057bac1e2"));
}
