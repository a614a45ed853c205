//! Security tiers and password material
//!
//! An address book picks one [`SecurityTier`] when it is initialized and
//! keeps it for life. Password-tier books also store an Argon2id password
//! hash and a BIP-39 entropy seed that feeds key derivation.

use crate::storage::ConfigRecord;
use crate::{Error, Result};
use aes_gcm::aead::OsRng;
use argon2::{
    password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Config key for the tier selector
pub const SECURITY_TYPE_KEY: &str = "secType";
/// Config key for the password hash
pub const HASH_KEY: &str = "hash";
/// Config key for the hex-encoded entropy seed
pub const ENTROPY_KEY: &str = "entropy";
/// Config key for the PBKDF2 iteration count
pub const KDF_ROUNDS_KEY: &str = "kdfRounds";

/// Minimum (and default) PBKDF2 iteration count
pub const MIN_KDF_ROUNDS: u32 = 4096;

/// Default mnemonic length used for the entropy seed (128 bits)
pub const DEFAULT_MNEMONIC_WORDS: usize = 12;

/// Security tier
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SecurityTier {
    /// Records stored as plain canonical bytes
    #[default]
    None = 0,
    /// Records stored base64-encoded (casual inspection only)
    Obfuscation = 1,
    /// Records sealed with AES-256-GCM under a password-derived key
    Password = 2,
}

impl SecurityTier {
    /// Get tier from its stored selector
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SecurityTier::None),
            1 => Ok(SecurityTier::Obfuscation),
            2 => Ok(SecurityTier::Password),
            other => Err(Error::InvalidSecurityTier(other.to_string())),
        }
    }

    /// Get as u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SecurityTier::None => "None",
            SecurityTier::Obfuscation => "Obfuscation",
            SecurityTier::Password => "Password",
        }
    }

    /// Whether unlocking requires a password
    pub fn requires_password(&self) -> bool {
        matches!(self, SecurityTier::Password)
    }
}

/// Argon2id cost parameters for the stored password hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHashParams {
    /// Memory in KiB
    pub m_cost: u32,
    /// Iterations
    pub t_cost: u32,
    /// Parallel lanes
    pub p_cost: u32,
}

impl Default for PasswordHashParams {
    /// Memory: 64 MiB, Iterations: 3, Parallelism: 4
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

/// Argon2id password hash in PHC string form
pub struct PasswordHash {
    hash: String,
}

impl PasswordHash {
    /// Hash a password with a fresh random salt
    pub fn hash(password: &str, params: &PasswordHashParams) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::Encryption("Password cannot be empty".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);

        let params = ParamsBuilder::new()
            .m_cost(params.m_cost)
            .t_cost(params.t_cost)
            .p_cost(params.p_cost)
            .build()
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Encryption(e.to_string()))?
            .to_string();

        Ok(Self { hash })
    }

    /// Verify a password.
    ///
    /// Cost parameters come from the PHC string; the final tag comparison is
    /// constant-time.
    pub fn verify(&self, password: &str) -> Result<bool> {
        let parsed_hash =
            PhcHash::new(&self.hash).map_err(|e| Error::Encryption(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Get hash string for storage
    pub fn hash_string(&self) -> &str {
        &self.hash
    }

    /// Load from stored hash
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }
}

/// Number of entropy bytes behind a BIP-39 mnemonic of `words` words
fn entropy_len_for_words(words: usize) -> Result<usize> {
    match words {
        12 | 15 | 18 | 21 | 24 => Ok(words * 4 / 3),
        other => Err(Error::Config(format!(
            "Unsupported mnemonic length: {} words (use 12, 15, 18, 21 or 24)",
            other
        ))),
    }
}

/// Generate a new random English BIP-39 mnemonic
pub fn generate_entropy_mnemonic(words: usize) -> Result<Zeroizing<String>> {
    let mut entropy = Zeroizing::new(vec![0u8; entropy_len_for_words(words)?]);
    OsRng.fill_bytes(&mut entropy);

    let mnemonic =
        Mnemonic::from_entropy(&entropy).map_err(|e| Error::Encryption(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Recover the entropy encoded by a BIP-39 mnemonic (checksum verified)
pub fn entropy_from_mnemonic(phrase: &str) -> Result<Zeroizing<Vec<u8>>> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| Error::Encryption(format!("Invalid mnemonic: {}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

/// Fresh entropy seed for a password-tier book
pub fn generate_entropy_seed(words: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mnemonic = generate_entropy_mnemonic(words)?;
    entropy_from_mnemonic(&mnemonic)
}

/// Persisted security configuration
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Tier chosen at initialization
    pub tier: SecurityTier,
    /// PHC password hash (empty unless tier is Password)
    pub password_hash: String,
    /// Key-derivation seed (empty unless tier is Password)
    pub entropy: Zeroizing<Vec<u8>>,
    /// PBKDF2 rounds the book was created with
    pub kdf_rounds: u32,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("tier", &self.tier)
            .field("kdf_rounds", &self.kdf_rounds)
            .finish_non_exhaustive()
    }
}

impl SecurityConfig {
    /// Config for a tier without password material
    pub fn unprotected(tier: SecurityTier) -> Self {
        Self {
            tier,
            password_hash: String::new(),
            entropy: Zeroizing::new(Vec::new()),
            kdf_rounds: 0,
        }
    }

    /// Config for the password tier
    pub fn password(hash: PasswordHash, entropy: Zeroizing<Vec<u8>>, kdf_rounds: u32) -> Self {
        Self {
            tier: SecurityTier::Password,
            password_hash: hash.hash,
            entropy,
            kdf_rounds,
        }
    }

    /// Stored password hash
    pub fn password_hash(&self) -> PasswordHash {
        PasswordHash::from_hash(self.password_hash.clone())
    }

    /// Encode as a storage config record
    pub fn to_record(&self) -> ConfigRecord {
        let mut record = ConfigRecord::new();
        record.insert(SECURITY_TYPE_KEY.to_string(), self.tier.as_u8().to_string());
        record.insert(HASH_KEY.to_string(), self.password_hash.clone());
        record.insert(ENTROPY_KEY.to_string(), hex::encode(self.entropy.as_slice()));
        if self.tier == SecurityTier::Password {
            record.insert(KDF_ROUNDS_KEY.to_string(), self.kdf_rounds.to_string());
        }
        record
    }

    /// Decode from a storage config record
    pub fn from_record(record: &ConfigRecord) -> Result<Self> {
        let raw_tier = record
            .get(SECURITY_TYPE_KEY)
            .ok_or_else(|| Error::InvalidSecurityTier("missing".to_string()))?;
        let tier = raw_tier
            .parse::<u8>()
            .map_err(|_| Error::InvalidSecurityTier(raw_tier.clone()))
            .and_then(SecurityTier::from_u8)?;

        if tier != SecurityTier::Password {
            return Ok(Self::unprotected(tier));
        }

        let password_hash = record.get(HASH_KEY).cloned().unwrap_or_default();
        if password_hash.is_empty() {
            return Err(Error::Config("Password hash missing".to_string()));
        }

        let entropy = record
            .get(ENTROPY_KEY)
            .map(|e| hex::decode(e).map_err(|e| Error::Config(format!("Invalid entropy: {}", e))))
            .transpose()?
            .unwrap_or_default();
        if entropy.is_empty() {
            return Err(Error::Config("Entropy seed missing".to_string()));
        }

        let kdf_rounds = match record.get(KDF_ROUNDS_KEY) {
            Some(rounds) => rounds
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("Invalid KDF rounds: {}", rounds)))?,
            None => MIN_KDF_ROUNDS,
        };

        Ok(Self {
            tier,
            password_hash,
            entropy: Zeroizing::new(entropy),
            kdf_rounds,
        })
    }
}
