//! The `velo_v1` suite end to end: two parties, every capability.

use vccrypt::{
    system_allocator, RoundMultiplier, SuiteConfig, SuiteId, SuiteOptions,
};

fn velo_v1() -> SuiteOptions {
    SuiteOptions::new(&system_allocator(), SuiteId::VeloV1).expect("velo_v1 should build")
}

#[test]
fn suite_reports_velo_v1_algorithms() {
    let suite = velo_v1();
    assert_eq!(suite.suite(), SuiteId::VeloV1);
    assert!(suite.mock().is_none());
    assert_eq!(suite.hash_options().name(), "SHA-512");
    assert_eq!(suite.mac_short_options().name(), "HMAC-SHA-512/256");
    assert_eq!(suite.block_options().name(), "AES-256-CBC");
    assert_eq!(suite.stream_options().name(), "AES-256-CTR");
    assert_eq!(suite.signature_options().name(), "Ed25519");
}

#[test]
fn signed_message_verifies_for_the_other_party() {
    let suite = velo_v1();
    let mut signer = suite.digital_signature_init();
    let mut private_key = suite.buffer_for_signature_private_key().unwrap();
    let mut public_key = suite.buffer_for_signature_public_key().unwrap();
    signer
        .keypair_create(&mut private_key, &mut public_key)
        .expect("keypair should succeed");

    let message = b"handshake transcript";
    let mut sig = suite.buffer_for_signature().unwrap();
    signer.sign(&mut sig, &private_key, message).unwrap();

    let mut verifier = suite.digital_signature_init();
    verifier
        .verify(&sig, &public_key, message)
        .expect("signature should verify");

    let mut forged = sig.to_vec();
    forged[0] ^= 0x80;
    let result = verifier.verify(&forged, &public_key, message);
    assert_eq!(vccrypt::status_code(&result), 0x0606);
}

/// Key agreement, then a session under the agreed key: the initiator
/// encrypts with CTR and tags with HMAC, the responder checks and decrypts.
#[test]
fn agreed_key_protects_a_stream_session() {
    let suite = velo_v1();
    let mut agreement = suite.cipher_key_agreement_init();

    let mut client_private = suite.buffer_for_cipher_key_agreement_private_key().unwrap();
    let mut client_public = suite.buffer_for_cipher_key_agreement_public_key().unwrap();
    let mut server_private = suite.buffer_for_cipher_key_agreement_private_key().unwrap();
    let mut server_public = suite.buffer_for_cipher_key_agreement_public_key().unwrap();
    agreement.keypair_create(&mut client_private, &mut client_public).unwrap();
    agreement.keypair_create(&mut server_private, &mut server_public).unwrap();

    let mut prng = suite.prng_init();
    let mut client_nonce = suite.buffer_for_cipher_key_agreement_nonce().unwrap();
    let mut server_nonce = suite.buffer_for_cipher_key_agreement_nonce().unwrap();
    prng.read(&mut client_nonce).unwrap();
    prng.read(&mut server_nonce).unwrap();

    let mut client_key = suite.buffer_for_cipher_key_agreement_shared_secret().unwrap();
    let mut server_key = suite.buffer_for_cipher_key_agreement_shared_secret().unwrap();
    agreement
        .short_term_secret_create(
            &client_private,
            &server_public,
            &server_nonce,
            &client_nonce,
            &mut client_key,
        )
        .unwrap();
    agreement
        .short_term_secret_create(
            &server_private,
            &client_public,
            &server_nonce,
            &client_nonce,
            &mut server_key,
        )
        .unwrap();
    assert_eq!(client_key.to_vec(), server_key.to_vec());
    assert_eq!(client_key.size(), suite.buffer_for_stream_secret_key().unwrap().size());

    // Initiator side.
    let plaintext = b"the quick brown fox jumps over the lazy dog, twice over".repeat(3);
    let mut iv = suite.buffer_for_stream_iv().unwrap();
    prng.read(&mut iv).unwrap();
    let mut ciphertext = vec![0u8; iv.size() + plaintext.len()];
    let mut offset = 0;
    let mut enc = suite.stream_init(&client_key).unwrap();
    enc.start_encryption(&iv, &mut ciphertext, &mut offset).unwrap();
    enc.encrypt(&plaintext, &mut ciphertext, &mut offset).unwrap();
    let mut tag = suite.buffer_for_mac_short_authentication_code().unwrap();
    let mut mac = suite.mac_short_init(&client_key).unwrap();
    mac.digest(&ciphertext).unwrap();
    mac.finalize(&mut tag).unwrap();

    // Responder side.
    suite
        .mac_short_options()
        .verify(&server_key, &ciphertext, &tag)
        .expect("tag should verify");
    let mut dec = suite.stream_init(&server_key).unwrap();
    let mut offset = 0;
    dec.start_decryption(&ciphertext, &mut offset).unwrap();
    let mut recovered = vec![0u8; plaintext.len()];
    let mut out = 0;
    dec.decrypt(&ciphertext[offset..], &mut recovered, &mut out).unwrap();
    assert_eq!(recovered, plaintext);

    // Random access: decrypt only the tail.
    let skip = 100;
    let mut tail_ctx = suite.stream_init(&server_key).unwrap();
    tail_ctx.continue_decryption(&iv, skip as u64).unwrap();
    let mut tail = vec![0u8; plaintext.len() - skip];
    let mut out = 0;
    tail_ctx
        .decrypt(&ciphertext[iv.size() + skip..], &mut tail, &mut out)
        .unwrap();
    assert_eq!(tail, plaintext[skip..]);
}

#[test]
fn auth_agreement_long_term_secret_matches() {
    let suite = velo_v1();
    let mut ctx = suite.auth_key_agreement_init();
    let mut a_private = suite.buffer_for_auth_key_agreement_private_key().unwrap();
    let mut a_public = suite.buffer_for_auth_key_agreement_public_key().unwrap();
    let mut b_private = suite.buffer_for_auth_key_agreement_private_key().unwrap();
    let mut b_public = suite.buffer_for_auth_key_agreement_public_key().unwrap();
    ctx.keypair_create(&mut a_private, &mut a_public).unwrap();
    ctx.keypair_create(&mut b_private, &mut b_public).unwrap();

    let mut a_shared = suite.buffer_for_auth_key_agreement_shared_secret().unwrap();
    let mut b_shared = suite.buffer_for_auth_key_agreement_shared_secret().unwrap();
    ctx.long_term_secret_create(&a_private, &b_public, &mut a_shared).unwrap();
    ctx.long_term_secret_create(&b_private, &a_public, &mut b_shared).unwrap();
    assert_eq!(a_shared.size(), 64);
    assert_eq!(a_shared.to_vec(), b_shared.to_vec());
}

#[test]
fn block_roundtrip_chains_over_several_blocks() {
    let suite = velo_v1();
    let mut key = suite.buffer_for_block_secret_key().unwrap();
    suite.prng_init().read(&mut key).unwrap();

    let blocks: Vec<[u8; 16]> = (0u8..4).map(|i| [i; 16]).collect();
    let mut enc = suite.block_init(&key, true).unwrap();
    let mut dec = suite.block_init(&key, false).unwrap();

    let mut iv = [0u8; 16];
    let mut ciphertexts = Vec::new();
    for block in &blocks {
        let mut out = [0u8; 16];
        enc.encrypt(&iv, block, &mut out).unwrap();
        iv = out;
        ciphertexts.push(out);
    }

    let mut iv = [0u8; 16];
    for (block, ciphertext) in blocks.iter().zip(&ciphertexts) {
        let mut out = [0u8; 16];
        dec.decrypt(&iv, ciphertext, &mut out).unwrap();
        assert_eq!(&out, block);
        iv = *ciphertext;
    }
}

#[test]
fn password_derived_key_is_reproducible() {
    let suite = velo_v1();
    let mut kdf = suite.key_derivation_init();
    let key_size = suite.buffer_for_block_secret_key().unwrap().size();
    let a = kdf.derive_buffer(key_size, b"correct horse", b"per-user salt", 1_000).unwrap();
    let b = kdf.derive_buffer(key_size, b"correct horse", b"per-user salt", 1_000).unwrap();
    let c = kdf.derive_buffer(key_size, b"wrong horse", b"per-user salt", 1_000).unwrap();
    assert_eq!(a.to_vec(), b.to_vec());
    assert_ne!(a.to_vec(), c.to_vec());
    suite.block_init(&a, true).expect("derived key should key the block cipher");
}

#[test]
fn configured_multipliers_change_ciphertext() {
    let json = r#"{ "suite": "velo_v1", "block_cipher_rounds": 4, "stream_cipher_rounds": 2 }"#;
    let config = SuiteConfig::from_json(json).expect("config should parse");
    assert_eq!(config.block_cipher_rounds, RoundMultiplier::Quadruple);

    let tuned = SuiteOptions::from_config(&system_allocator(), &config).unwrap();
    let plain = velo_v1();
    assert_eq!(tuned.block_options().name(), "AES-256-4X-CBC");
    assert_eq!(tuned.stream_options().name(), "AES-256-2X-CTR");

    let key = [0x42u8; 32];
    let mut a = [0u8; 16];
    let mut b = [0u8; 16];
    tuned.block_init(&key, true).unwrap().encrypt(&[0; 16], &[7; 16], &mut a).unwrap();
    plain.block_init(&key, true).unwrap().encrypt(&[0; 16], &[7; 16], &mut b).unwrap();
    assert_ne!(a, b);
}

#[test]
fn uuid_from_suite_prng() {
    let suite = velo_v1();
    let mut uuid = suite.buffer_for_uuid().unwrap();
    suite.prng_init().read_uuid(&mut uuid).unwrap();
    assert_eq!(uuid[6] & 0xF0, 0x40);
    assert_eq!(uuid[8] & 0xC0, 0x80);
}
