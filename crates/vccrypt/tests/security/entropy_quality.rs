//! Entropy quality smoke tests for the operating-system PRNG.
//!
//! Shannon entropy of uniform random bytes approaches 8.0 bits/byte as the
//! sample grows; finite samples measure lower because not every byte value
//! appears. Thresholds below are set to catch degenerate output (all zeros,
//! short cycles) without tripping on natural variance.
//!
//! | Sample size | Expected entropy | Our threshold |
//! |-------------|------------------|---------------|
//! | 1 KB        | ~7.81            | 7.5           |
//! | 64 KB       | ~7.997           | 7.99          |

use std::collections::HashSet;
use vccrypt::prng::{self, PrngOptions, UUID_SIZE};
use vccrypt::{ids, system_allocator, SuiteId, SuiteOptions};

#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut freq = [0u64; 256];
    for &b in data {
        freq[b as usize] = freq[b as usize].saturating_add(1);
    }
    let len = data.len() as f64;
    freq.iter()
        .filter(|&&f| f > 0)
        .map(|&f| {
            let p = f as f64 / len;
            -p * p.log2()
        })
        .sum()
}

fn options() -> PrngOptions {
    prng::register_operating_system_source();
    PrngOptions::new(&system_allocator(), ids::PRNG_SOURCE_OPERATING_SYSTEM)
        .expect("os prng should resolve")
}

#[test]
fn prng_1kb_entropy() {
    let opts = options();
    let buf = opts
        .init()
        .read_buffer(opts.allocator(), 1024)
        .expect("entropy source should succeed");
    let entropy = shannon_entropy(&buf);
    assert!(entropy > 7.5, "1 KB entropy too low: {entropy:.4} (expected > 7.5)");
}

#[test]
fn prng_64kb_entropy() {
    let opts = options();
    let buf = opts
        .init()
        .read_buffer(opts.allocator(), 65536)
        .expect("entropy source should succeed");
    let entropy = shannon_entropy(&buf);
    assert!(entropy > 7.99, "64 KB entropy too low: {entropy:.4} (expected > 7.99)");
}

#[test]
fn consecutive_reads_differ() {
    let mut ctx = options().init();
    let mut a = [0u8; 32];
    let mut b = [0u8; 32];
    ctx.read(&mut a).unwrap();
    ctx.read(&mut b).unwrap();
    assert_ne!(a, b);
    assert_ne!(a, [0u8; 32]);
}

#[test]
fn uuids_carry_version_and_variant() {
    let suite = SuiteOptions::new(&system_allocator(), SuiteId::VeloV1).unwrap();
    let mut ctx = suite.prng_init();
    let mut seen = HashSet::new();
    for _ in 0..256 {
        let mut uuid = suite.buffer_for_uuid().unwrap();
        assert_eq!(uuid.size(), UUID_SIZE);
        ctx.read_uuid(&mut uuid).expect("uuid read should succeed");
        assert_eq!(uuid[6] >> 4, 0x4, "version nibble");
        assert_eq!(uuid[8] & 0xC0, 0x80, "variant bits");
        assert!(seen.insert(uuid.to_vec()), "duplicate uuid");
    }
}

#[test]
fn uuid_random_bits_are_not_fixed() {
    let mut ctx = options().init();
    let mut or_acc = [0u8; UUID_SIZE];
    let mut and_acc = [0xFFu8; UUID_SIZE];
    for _ in 0..64 {
        let mut uuid = [0u8; UUID_SIZE];
        ctx.read_uuid(&mut uuid).unwrap();
        for i in 0..UUID_SIZE {
            or_acc[i] |= uuid[i];
            and_acc[i] &= uuid[i];
        }
    }
    // Only the version nibble and the variant bits may be constant.
    let mut fixed_mask = [0u8; UUID_SIZE];
    fixed_mask[6] = 0xF0;
    fixed_mask[8] = 0xC0;
    for i in 0..UUID_SIZE {
        let varying = or_acc[i] & !and_acc[i];
        assert_eq!(varying | fixed_mask[i], 0xFF, "byte {i} has stuck bits");
    }
}
