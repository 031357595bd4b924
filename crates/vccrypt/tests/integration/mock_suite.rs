//! The mock suite: every operation fails with its mock code until a closure
//! is installed, and installed closures see the caller's arguments.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use vccrypt::{status_code, system_allocator, CryptoError, SuiteConfig, SuiteId, SuiteOptions};

const MOCK_NOT_ADDED: u32 = 0x0B01;

fn mock_suite() -> SuiteOptions {
    SuiteOptions::new(&system_allocator(), SuiteId::Mock).expect("mock suite should build")
}

#[test]
fn uninstalled_operations_report_mock_not_added() {
    let suite = mock_suite();
    let mut buf64 = [0u8; 64];
    let mut buf32 = [0u8; 32];

    let mut hash = suite.hash_init().unwrap();
    assert_eq!(status_code(&hash.digest(b"x")), MOCK_NOT_ADDED);
    assert_eq!(status_code(&hash.finalize(&mut buf64)), MOCK_NOT_ADDED);

    let mut mac = suite.mac_init(&[1u8; 64]).unwrap();
    assert_eq!(status_code(&mac.digest(b"x")), MOCK_NOT_ADDED);

    let mut block = suite.block_init(&[0u8; 32], true).unwrap();
    let mut out = [0u8; 16];
    assert_eq!(
        status_code(&block.encrypt(&[0u8; 16], &[0u8; 16], &mut out)),
        MOCK_NOT_ADDED
    );

    let mut stream = suite.stream_init(&[0u8; 32]).unwrap();
    let mut offset = 0;
    assert_eq!(
        status_code(&stream.start_encryption(&[0u8; 8], &mut buf32, &mut offset)),
        MOCK_NOT_ADDED
    );

    let mut sig = suite.digital_signature_init();
    assert_eq!(
        status_code(&sig.verify(&buf64, &buf32, b"m")),
        MOCK_NOT_ADDED
    );

    let mut ka = suite.cipher_key_agreement_init();
    assert_eq!(
        status_code(&ka.long_term_secret_create(&buf32, &buf32, &mut [0u8; 32])),
        MOCK_NOT_ADDED
    );

    assert_eq!(status_code(&suite.prng_init().read(&mut buf32)), MOCK_NOT_ADDED);

    let mut kdf = suite.key_derivation_init();
    assert_eq!(
        status_code(&kdf.derive(&mut buf32, b"pw", b"salt", 1)),
        MOCK_NOT_ADDED
    );
}

#[test]
fn error_names_the_operation() {
    let suite = mock_suite();
    let err = suite.digital_signature_init().sign(&mut [0u8; 64], &[0u8; 64], b"m").unwrap_err();
    assert!(matches!(err, CryptoError::MockNotAdded("signature_sign")));
}

#[test]
fn installed_closures_receive_arguments() {
    let suite = mock_suite();
    let mock = suite.mock().expect("mock suite should expose its slots");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    mock.add_hash_digest(move |data| {
        recorder.lock().unwrap().extend_from_slice(data);
        Ok(())
    });
    mock.add_hash_finalize(|out| {
        out.fill(0xAB);
        Ok(())
    });

    let mut ctx = suite.hash_init().unwrap();
    ctx.digest(b"hello ").unwrap();
    ctx.digest(b"world").unwrap();
    let mut digest = suite.buffer_for_hash().unwrap();
    ctx.finalize(&mut digest).unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), b"hello world");
    assert!(digest.iter().all(|&b| b == 0xAB));
}

#[test]
fn installed_closure_errors_propagate() {
    let suite = mock_suite();
    let mock = suite.mock().unwrap();
    mock.add_signature_verify(|_, _, _| {
        Err(CryptoError::VerificationFailed(vccrypt::Component::Signature))
    });
    let sig = suite.buffer_for_signature().unwrap();
    let public_key = suite.buffer_for_signature_public_key().unwrap();
    let result = suite.digital_signature_init().verify(&sig, &public_key, b"m");
    assert_eq!(status_code(&result), 0x0606);
}

#[test]
fn stream_and_kdf_closures_drive_offsets_and_outputs() {
    let suite = mock_suite();
    let mock = suite.mock().unwrap();
    mock.add_stream_start_encryption(|iv, output, offset| {
        output[..iv.len()].copy_from_slice(iv);
        *offset = iv.len();
        Ok(())
    });
    let rounds_seen = Arc::new(AtomicU32::new(0));
    let rounds = Arc::clone(&rounds_seen);
    mock.add_key_derivation_derive(move |dk, _password, _salt, r| {
        rounds.store(r, Ordering::SeqCst);
        dk.fill(0x11);
        Ok(())
    });

    let mut stream = suite.stream_init(&[0u8; 32]).unwrap();
    let mut out = [0u8; 8];
    let mut offset = 0;
    stream.start_encryption(&[9u8; 8], &mut out, &mut offset).unwrap();
    assert_eq!(offset, 8);
    assert_eq!(out, [9u8; 8]);

    let key = suite.key_derivation_init().derive_buffer(16, b"pw", b"salt", 77).unwrap();
    assert_eq!(rounds_seen.load(Ordering::SeqCst), 77);
    assert!(key.iter().all(|&b| b == 0x11));
}

#[test]
fn auth_and_cipher_slots_are_separate() {
    let suite = mock_suite();
    let mock = suite.mock().unwrap();
    mock.add_auth_long_term_secret_create(|_, _, shared| {
        shared.fill(0xAA);
        Ok(())
    });

    let mut shared = [0u8; 64];
    suite
        .auth_key_agreement_init()
        .long_term_secret_create(&[0u8; 32], &[0u8; 32], &mut shared)
        .unwrap();
    assert!(shared.iter().all(|&b| b == 0xAA));

    let result = suite
        .cipher_key_agreement_init()
        .long_term_secret_create(&[0u8; 32], &[0u8; 32], &mut [0u8; 32]);
    assert!(matches!(
        result,
        Err(CryptoError::MockNotAdded("cipher_long_term_secret_create"))
    ));
}

#[test]
fn clear_removes_installed_closures() {
    let suite = mock_suite();
    let mock = suite.mock().unwrap();
    mock.add_prng_read(|out| {
        out.fill(4);
        Ok(())
    });
    let mut buf = [0u8; 4];
    suite.prng_init().read(&mut buf).unwrap();
    assert_eq!(buf, [4; 4]);

    mock.clear();
    assert_eq!(status_code(&suite.prng_init().read(&mut buf)), MOCK_NOT_ADDED);
}

#[test]
fn mock_suite_from_config() {
    let config = SuiteConfig::from_json(r#"{ "suite": "mock" }"#).unwrap();
    let suite = SuiteOptions::from_config(&system_allocator(), &config).unwrap();
    assert_eq!(suite.suite(), SuiteId::Mock);
    assert_eq!(suite.buffer_for_signature().unwrap().size(), 64);
    assert_eq!(suite.buffer_for_stream_iv().unwrap().size(), 8);
}
