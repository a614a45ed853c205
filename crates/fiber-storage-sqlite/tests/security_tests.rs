//! Security tests for record ciphers, key derivation, and password hashing
//!
//! Tests cover:
//! - PBKDF2-HMAC-SHA512 session keys (4096 rounds minimum)
//! - Round-trip and tamper detection for every security tier
//! - BIP-39 entropy seeds

use fiber_core::{codec, Contact};
use fiber_storage_sqlite::security::{
    generate_entropy_seed, SecurityConfig, ENTROPY_KEY, HASH_KEY, KDF_ROUNDS_KEY,
    SECURITY_TYPE_KEY,
};
use fiber_storage_sqlite::{
    entropy_from_mnemonic, generate_entropy_mnemonic, ContactCipher, Error, PasswordHash,
    PasswordHashParams, SecurityTier, SessionKey, MIN_KDF_ROUNDS,
};
use proptest::prelude::*;

fn fast_params() -> PasswordHashParams {
    PasswordHashParams {
        m_cost: 1024,
        t_cost: 1,
        p_cost: 1,
    }
}

// =============================================================================
// Key Derivation
// =============================================================================

#[test]
fn test_pbkdf2_sha512_vector() {
    // PBKDF2-HMAC-SHA512("password", "salt", 4096), first 32 bytes
    let key = SessionKey::derive("password", b"salt", 4096).unwrap();
    assert_eq!(
        hex::encode(key.as_bytes()),
        "d197b1b33db0143e018b12f3d1d1479e6cdebdcc97c5c0f87f6902e072f457b5"
    );
}

#[test]
fn test_key_from_mnemonic_seed_is_stable() {
    let phrase = generate_entropy_mnemonic(12).unwrap();
    let seed = entropy_from_mnemonic(&phrase).unwrap();

    let a = SessionKey::derive("pw1", &seed, MIN_KDF_ROUNDS).unwrap();
    let b = SessionKey::derive("pw1", &entropy_from_mnemonic(&phrase).unwrap(), MIN_KDF_ROUNDS)
        .unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn test_sealed_record_needs_matching_password() {
    let seed = generate_entropy_seed(12).unwrap();
    let contact = Contact::new("Alice").with_address("A1", "BTC");
    let bytes = codec::encode(&contact).unwrap();

    let right = ContactCipher::Sealed(SessionKey::derive("pw1", &seed, MIN_KDF_ROUNDS).unwrap());
    let wrong = ContactCipher::Sealed(SessionKey::derive("pw2", &seed, MIN_KDF_ROUNDS).unwrap());

    let blob = right.encrypt(&bytes).unwrap();
    assert!(matches!(wrong.decrypt(&blob), Err(Error::DecryptionFailed)));
    assert_eq!(codec::decode(&right.decrypt(&blob).unwrap()).unwrap(), contact);
}

// =============================================================================
// Persisted Configuration
// =============================================================================

#[test]
fn test_password_config_record_layout() {
    let hash = PasswordHash::hash("pw1", &fast_params()).unwrap();
    let seed = generate_entropy_seed(12).unwrap();
    let record = SecurityConfig::password(hash, seed.clone(), MIN_KDF_ROUNDS).to_record();

    assert_eq!(record[SECURITY_TYPE_KEY], "2");
    assert!(record[HASH_KEY].starts_with("$argon2id$"));
    assert_eq!(record[ENTROPY_KEY], hex::encode(seed.as_slice()));
    assert_eq!(record[KDF_ROUNDS_KEY], "4096");

    let restored = SecurityConfig::from_record(&record).unwrap();
    assert_eq!(restored.tier, SecurityTier::Password);
    assert!(restored.password_hash().verify("pw1").unwrap());
    assert!(!restored.password_hash().verify("pw2").unwrap());
}

#[test]
fn test_argon2id_default_parameters_verify() {
    // Hashes carry their own parameters, so a cheap hash verifies without config
    let hash = PasswordHash::hash("pw1", &fast_params()).unwrap();
    assert!(hash.hash_string().contains("m=1024,t=1,p=1"));

    let restored = PasswordHash::from_hash(hash.hash_string().to_string());
    assert!(restored.verify("pw1").unwrap());
}

// =============================================================================
// Cipher Properties
// =============================================================================

fn cipher_strategy() -> impl Strategy<Value = ContactCipher> {
    prop_oneof![
        Just(ContactCipher::Plain),
        Just(ContactCipher::Obfuscated),
        any::<[u8; 32]>().prop_map(|key| ContactCipher::Sealed(SessionKey::from_bytes(key))),
    ]
}

proptest! {
    /// Property: decrypt inverts encrypt for every tier
    #[test]
    fn prop_cipher_roundtrip(
        cipher in cipher_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let blob = cipher.encrypt(&plaintext).unwrap();
        prop_assert_eq!(cipher.decrypt(&blob).unwrap(), plaintext);
    }

    /// Property: any single-bit flip of a sealed blob is rejected
    #[test]
    fn prop_sealed_tamper_detected(
        key in any::<[u8; 32]>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..128),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8
    ) {
        let cipher = ContactCipher::Sealed(SessionKey::from_bytes(key));
        let mut blob = cipher.encrypt(&plaintext).unwrap();
        let i = position.index(blob.len());
        blob[i] ^= 1 << bit;

        prop_assert!(matches!(cipher.decrypt(&blob), Err(Error::DecryptionFailed)));
    }

    /// Property: truncated sealed blobs never yield plaintext
    #[test]
    fn prop_sealed_truncation_detected(
        key in any::<[u8; 32]>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..128),
        cut in any::<prop::sample::Index>()
    ) {
        let cipher = ContactCipher::Sealed(SessionKey::from_bytes(key));
        let blob = cipher.encrypt(&plaintext).unwrap();
        let len = cut.index(blob.len());

        prop_assert!(cipher.decrypt(&blob[..len]).is_err());
    }
}
