//! Verify that every region handed back to the allocator is all zeros.
//!
//! A recording allocator keeps each released region, so the check inspects
//! owned memory instead of reading freed pointers.

use std::sync::{Arc, Mutex};
use vccrypt::block::AesCbc;
use vccrypt::hash::{Sha2Algorithm, Sha2Variant};
use vccrypt::mac::Hmac;
use vccrypt::stream::AesCtr;
use vccrypt::{
    status_code, Allocator, BlockOptions, Buffer, Component, CryptoError, HashOptions,
    MacOptions, RoundMultiplier, SharedAllocator, StreamOptions, SuiteId, SuiteOptions,
};

/// Key used for every keyed context below.
const KEY: [u8; 32] = [0x5A; 32];

/// Sentinel pattern used to fill secrets before drop.
const SENTINEL: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

#[derive(Default)]
struct RecordingAllocator {
    released: Mutex<Vec<Vec<u8>>>,
    allocated: Mutex<usize>,
}

impl RecordingAllocator {
    fn released(&self) -> Vec<Vec<u8>> {
        self.released.lock().unwrap().clone()
    }

    fn allocations(&self) -> usize {
        *self.allocated.lock().unwrap()
    }
}

impl Allocator for RecordingAllocator {
    fn allocate(&self, size: usize) -> Option<Vec<u8>> {
        *self.allocated.lock().unwrap() += 1;
        Some(vec![0u8; size])
    }

    fn release(&self, region: Vec<u8>) {
        self.released.lock().unwrap().push(region);
    }
}

/// Allocator that refuses every request.
struct ExhaustedAllocator;

impl Allocator for ExhaustedAllocator {
    fn allocate(&self, _size: usize) -> Option<Vec<u8>> {
        None
    }

    fn release(&self, _region: Vec<u8>) {}
}

/// Allocator that hands back a region of the wrong size.
struct ShortAllocator;

impl Allocator for ShortAllocator {
    fn allocate(&self, size: usize) -> Option<Vec<u8>> {
        Some(vec![0u8; size.saturating_sub(1)])
    }

    fn release(&self, _region: Vec<u8>) {}
}

fn recording() -> (Arc<RecordingAllocator>, SharedAllocator) {
    let recorder = Arc::new(RecordingAllocator::default());
    let shared: SharedAllocator = recorder.clone();
    (recorder, shared)
}

fn assert_all_released_zeroed(recorder: &RecordingAllocator) {
    let released = recorder.released();
    assert!(!released.is_empty(), "no region was released");
    for region in released {
        assert!(
            region.iter().all(|&b| b == 0),
            "region of {} bytes released with non-zero content",
            region.len()
        );
        assert!(
            !region.windows(4).any(|w| w == SENTINEL),
            "sentinel pattern found in released region"
        );
    }
}

#[test]
fn buffer_released_zeroed_after_drop() {
    let (recorder, allocator) = recording();
    {
        let mut buf = Buffer::new(&allocator, 512).expect("allocation should succeed");
        for (dst, src) in buf.iter_mut().zip(SENTINEL.iter().cycle()) {
            *dst = *src;
        }
        assert_eq!(&buf[..4], &SENTINEL);
    }
    assert_eq!(recorder.released().len(), 1);
    assert_all_released_zeroed(&recorder);
}

#[test]
fn large_buffer_released_zeroed_after_drop() {
    let (recorder, allocator) = recording();
    {
        let sentinel_data: Vec<u8> = SENTINEL.iter().copied().cycle().take(65536).collect();
        let _buf = Buffer::from_slice(&allocator, &sentinel_data).expect("allocation should succeed");
    }
    assert_all_released_zeroed(&recorder);
}

#[test]
fn suite_key_material_released_zeroed() {
    let (recorder, allocator) = recording();
    {
        let suite = SuiteOptions::new(&allocator, SuiteId::VeloV1).expect("velo_v1 should build");

        let mut ctx = suite.digital_signature_init();
        let mut private_key = suite.buffer_for_signature_private_key().unwrap();
        let mut public_key = suite.buffer_for_signature_public_key().unwrap();
        ctx.keypair_create(&mut private_key, &mut public_key).unwrap();

        let mut agreement = suite.auth_key_agreement_init();
        let mut ka_private = suite.buffer_for_auth_key_agreement_private_key().unwrap();
        let mut ka_public = suite.buffer_for_auth_key_agreement_public_key().unwrap();
        agreement.keypair_create(&mut ka_private, &mut ka_public).unwrap();
        let mut shared = suite.buffer_for_auth_key_agreement_shared_secret().unwrap();
        agreement
            .long_term_secret_create(&ka_private, &ka_public, &mut shared)
            .unwrap();

        let mut kdf = suite.key_derivation_init();
        let _derived = kdf.derive_buffer(64, b"password", b"salt", 2).unwrap();

        let mut hash = suite.hash_init().unwrap();
        hash.digest(b"message").unwrap();
        let mut digest = suite.buffer_for_hash().unwrap();
        hash.finalize(&mut digest).unwrap();
    }
    assert!(recorder.released().len() >= 6);
    assert_eq!(recorder.released().len(), recorder.allocations());
    assert_all_released_zeroed(&recorder);
}

/// Every region a context allocated is released, and released zeroed, once
/// the context is dropped.
fn assert_context_state_released(recorder: &RecordingAllocator, before: usize) {
    assert!(
        recorder.allocations() > before,
        "context did not draw its state from the allocator"
    );
    assert_eq!(recorder.released().len(), recorder.allocations());
    assert_all_released_zeroed(recorder);
}

#[test]
fn keyed_block_contexts_release_zeroed_state() {
    let (recorder, allocator) = recording();
    let suite = SuiteOptions::new(&allocator, SuiteId::VeloV1).expect("velo_v1 should build");
    let before = recorder.allocations();
    {
        let plaintext: Vec<u8> = SENTINEL.iter().copied().cycle().take(16).collect();
        let mut ciphertext = [0u8; 16];
        let mut recovered = [0u8; 16];

        let mut enc = suite.block_init(&KEY, true).unwrap();
        enc.encrypt(&[0u8; 16], &plaintext, &mut ciphertext).unwrap();
        let mut dec = suite.block_init(&KEY, false).unwrap();
        dec.decrypt(&[0u8; 16], &ciphertext, &mut recovered).unwrap();
        assert_eq!(&recovered[..], &plaintext[..]);
    }
    assert_context_state_released(&recorder, before);
}

#[test]
fn keyed_stream_context_releases_zeroed_state() {
    let (recorder, allocator) = recording();
    let suite = SuiteOptions::new(&allocator, SuiteId::VeloV1).expect("velo_v1 should build");
    let before = recorder.allocations();
    {
        let plaintext: Vec<u8> = SENTINEL.iter().copied().cycle().take(40).collect();
        let mut out = vec![0u8; 8 + plaintext.len()];
        let mut offset = 0;

        let mut ctx = suite.stream_init(&KEY).unwrap();
        ctx.start_encryption(&[0x01; 8], &mut out, &mut offset).unwrap();
        ctx.encrypt(&plaintext, &mut out, &mut offset).unwrap();
        assert_eq!(offset, out.len());
    }
    assert_context_state_released(&recorder, before);
}

#[test]
fn keyed_mac_contexts_release_zeroed_state() {
    let (recorder, allocator) = recording();
    let suite = SuiteOptions::new(&allocator, SuiteId::VeloV1).expect("velo_v1 should build");
    let before = recorder.allocations();
    {
        let mut full = suite.mac_init(&KEY).unwrap();
        full.digest(&SENTINEL).unwrap();
        let mut tag = [0u8; 64];
        full.finalize(&mut tag).unwrap();

        let mut short = suite.mac_short_init(&[0x5A; 200]).unwrap();
        short.digest(&SENTINEL).unwrap();
        let mut short_tag = [0u8; 32];
        short.finalize(&mut short_tag).unwrap();
    }
    assert_context_state_released(&recorder, before);
}

#[test]
fn hash_context_releases_zeroed_state() {
    let (recorder, allocator) = recording();
    let suite = SuiteOptions::new(&allocator, SuiteId::VeloV1).expect("velo_v1 should build");
    let before = recorder.allocations();
    {
        let mut ctx = suite.hash_init().unwrap();
        // Leave a partial block behind to make sure it is scrubbed too.
        ctx.digest(&[0xDE; 300]).unwrap();
    }
    assert_context_state_released(&recorder, before);
}

#[test]
fn context_init_reports_out_of_memory_per_component() {
    let allocator: SharedAllocator = Arc::new(ExhaustedAllocator);

    let block = BlockOptions::with_algorithm(&allocator, Arc::new(AesCbc::new(RoundMultiplier::Fips)));
    assert_eq!(status_code(&block.init(&KEY, true)), 0x0402);
    assert_eq!(status_code(&block.init(&KEY, false)), 0x0402);

    let stream = StreamOptions::with_algorithm(&allocator, Arc::new(AesCtr::new(RoundMultiplier::Fips)));
    assert_eq!(status_code(&stream.init(&KEY)), 0x0502);

    let sha512 = Arc::new(Sha2Algorithm::new(Sha2Variant::Sha512));
    let hash = HashOptions::with_algorithm(&allocator, sha512.clone());
    assert_eq!(status_code(&hash.init()), 0x0202);

    let mac = MacOptions::with_algorithm(&allocator, Arc::new(Hmac::new("HMAC-SHA-512", sha512)));
    assert!(matches!(
        mac.init(&KEY).unwrap_err(),
        CryptoError::OutOfMemory(Component::Mac)
    ));
}

#[test]
fn copy_from_mismatched_sizes_leaves_destination() {
    let (_recorder, allocator) = recording();
    let src = Buffer::from_slice(&allocator, &SENTINEL).unwrap();
    let mut dst = Buffer::new(&allocator, 8).unwrap();
    let err = dst.copy_from(&src).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::CopySizeMismatch { expected: 8, actual: 4 }
    ));
    assert_eq!(err.code(), 0x0105);
    assert!(dst.iter().all(|&b| b == 0));
}

#[test]
fn exhausted_allocator_reports_out_of_memory() {
    let allocator: SharedAllocator = Arc::new(ExhaustedAllocator);
    let result = Buffer::new(&allocator, 32);
    assert_eq!(status_code(&result), 0x0102);
    assert!(matches!(
        result.unwrap_err(),
        CryptoError::OutOfMemory(Component::Buffer)
    ));
}

#[test]
fn short_region_reports_out_of_memory() {
    let allocator: SharedAllocator = Arc::new(ShortAllocator);
    let err = Buffer::new(&allocator, 32).unwrap_err();
    assert!(matches!(err, CryptoError::OutOfMemory(Component::Buffer)));
}

#[test]
fn debug_output_is_masked() {
    let (_recorder, allocator) = recording();
    let buf = Buffer::from_slice(&allocator, &SENTINEL).unwrap();
    assert_eq!(format!("{buf:?}"), "Buffer(***)");
    assert_eq!(format!("{buf}"), "Buffer(***)");
    assert!(!format!("{buf:?}").contains("deadbeef"));
}
