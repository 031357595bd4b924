//! FIPS 180-4 SHA-2 Known-Answer Tests.
//!
//! Vectors from the NIST "Example Algorithms" documents for SHA-384,
//! SHA-512 and SHA-512/256, plus the classic long-message vectors.

use super::hex;
use vccrypt::hash::{self, HashOptions};
use vccrypt::{ids, system_allocator};

fn options(id: u32) -> HashOptions {
    hash::register_sha_2_384();
    hash::register_sha_2_512();
    hash::register_sha_2_512_256();
    HashOptions::new(&system_allocator(), id).expect("hash should resolve")
}

fn digest(id: u32, message: &[u8]) -> Vec<u8> {
    options(id)
        .hash(message)
        .expect("hash should succeed")
        .to_vec()
}

#[test]
fn sha512_empty_message() {
    assert_eq!(
        digest(ids::HASH_SHA_2_512, b""),
        hex(
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        )
    );
}

#[test]
fn sha512_abc() {
    assert_eq!(
        digest(ids::HASH_SHA_2_512, b"abc"),
        hex(
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        )
    );
}

/// 896-bit message: two compression blocks after padding.
#[test]
fn sha512_two_block_message() {
    let message = b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmn\
                    hijklmnoijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu";
    assert_eq!(
        digest(ids::HASH_SHA_2_512, message),
        hex(
            "8e959b75dae313da8cf4f72814fc143f8f7779c6eb9f7fa17299aeadb6889018\
             501d289e4900f7e4331b99dec4b5433ac7d329eeb6dd26545e96e55b874be909"
        )
    );
}

/// One million `a`, fed in uneven chunks.
#[test]
fn sha512_million_a_streamed() {
    let opts = options(ids::HASH_SHA_2_512);
    let mut ctx = opts.init().expect("init should succeed");
    let chunk = [b'a'; 999];
    let mut remaining = 1_000_000usize;
    while remaining > 0 {
        let take = remaining.min(chunk.len());
        ctx.digest(&chunk[..take]).expect("digest should succeed");
        remaining -= take;
    }
    let mut out = opts.buffer().expect("buffer should allocate");
    ctx.finalize(&mut out).expect("finalize should succeed");
    assert_eq!(
        out.to_vec(),
        hex(
            "e718483d0ce769644e2e42c7bc15b4638e1f98b13b2044285632a803afa973eb\
             de0ff244877ea60a4cb0432ce577c31beb009c5c2c49aa2e4eadb217ad8cc09b"
        )
    );
}

#[test]
fn sha384_single_byte() {
    assert_eq!(
        digest(ids::HASH_SHA_2_384, &[0xc5]),
        hex(
            "b52b72da75d0666379e20f9b4a79c33a329a01f06a2fb7865c9062a28c1de860\
             ba432edfd86b4cb1cb8a75b46076e3b1"
        )
    );
}

#[test]
fn sha384_abc() {
    assert_eq!(
        digest(ids::HASH_SHA_2_384, b"abc"),
        hex(
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed\
             8086072ba1e7cc2358baeca134c825a7"
        )
    );
}

#[test]
fn sha512_256_abc() {
    assert_eq!(
        digest(ids::HASH_SHA_2_512_256, b"abc"),
        hex("53048e2681941ef99b2e29b76b4c7dabe4c2d0c634fc6d46e0e2f13107e7af23")
    );
}
