//! Registry resolution across interfaces.

use vccrypt::hash::HashOptions;
use vccrypt::registry::{self, lookup, lookup_by_features, registered_implementations};
use vccrypt::{ids, register_velo_v1, status_code, system_allocator, CryptoError, InterfaceId};

#[test]
fn velo_v1_registration_covers_every_interface() {
    register_velo_v1();
    let expected = [
        (InterfaceId::Hash, ids::HASH_SHA_2_512),
        (InterfaceId::Mac, ids::MAC_HMAC_SHA_2_512),
        (InterfaceId::Mac, ids::MAC_HMAC_SHA_2_512_256),
        (InterfaceId::BlockCipher, ids::BLOCK_AES_256_CBC_FIPS),
        (InterfaceId::StreamCipher, ids::STREAM_AES_256_CTR_FIPS),
        (InterfaceId::DigitalSignature, ids::SIGNATURE_ED25519),
        (InterfaceId::KeyAgreement, ids::KEY_AGREEMENT_CURVE25519_SHA512),
        (InterfaceId::KeyAgreement, ids::KEY_AGREEMENT_CURVE25519_SHA512_256),
        (InterfaceId::Prng, ids::PRNG_SOURCE_OPERATING_SYSTEM),
        (InterfaceId::KeyDerivation, ids::KEY_DERIVATION_PBKDF2),
    ];
    for (interface, id) in expected {
        let record = lookup(interface, id)
            .unwrap_or_else(|| panic!("{interface} {id:#x} should be registered"));
        assert_eq!(record.interface(), interface);
        assert_eq!(record.implementation, id);
        assert!(registered_implementations(interface).contains(&id));
    }
}

#[test]
fn registering_twice_keeps_one_record() {
    register_velo_v1();
    register_velo_v1();
    let hashes = registered_implementations(InterfaceId::Hash);
    let count = hashes
        .iter()
        .filter(|&&id| id == ids::HASH_SHA_2_512)
        .count();
    assert_eq!(count, 1);
}

#[test]
fn same_id_in_other_interface_is_distinct() {
    register_velo_v1();
    // SHA-512 and HMAC-SHA-512 share a numeric id but not an interface.
    let hash = lookup(InterfaceId::Hash, ids::HASH_SHA_2_512).unwrap();
    let mac = lookup(InterfaceId::Mac, ids::MAC_HMAC_SHA_2_512).unwrap();
    assert!(!std::ptr::eq(hash, mac));
}

#[test]
fn feature_lookup_finds_registered_record() {
    register_velo_v1();
    let record = lookup_by_features(InterfaceId::DigitalSignature, ids::SIGNATURE_ED25519)
        .expect("ed25519 should match its own feature bit");
    assert_eq!(record.implementation, ids::SIGNATURE_ED25519);
}

#[test]
fn unknown_id_reports_not_registered() {
    let result = HashOptions::new(&system_allocator(), 0x4000_0000);
    assert_eq!(status_code(&result), 0x0A10);
    assert!(matches!(
        result.unwrap_err(),
        CryptoError::NotRegistered {
            interface: InterfaceId::Hash,
            implementation: 0x4000_0000,
        }
    ));
    assert!(registry::lookup(InterfaceId::Hash, 0x4000_0000).is_none());
}
