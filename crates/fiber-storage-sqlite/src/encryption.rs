//! Session key derivation and AES-256-GCM sealing

use crate::security::MIN_KDF_ROUNDS;
use crate::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroizing;

/// AES-GCM nonce length
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Key held in memory while a password-tier book is unlocked
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; 32]>);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Derive with PBKDF2-HMAC-SHA512 (password as secret, entropy seed as salt)
    pub fn derive(password: &str, entropy: &[u8], rounds: u32) -> Result<Self> {
        if rounds < MIN_KDF_ROUNDS {
            return Err(Error::Config(format!(
                "KDF rounds must be at least {}",
                MIN_KDF_ROUNDS
            )));
        }
        if entropy.is_empty() {
            return Err(Error::Encryption("Entropy seed is empty".to_string()));
        }

        let mut key = Zeroizing::new([0u8; 32]);
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), entropy, rounds, &mut key[..]);
        Ok(Self(key))
    }

    /// Create from raw key bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Get key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt under a fresh random nonce.
    ///
    /// Format: [nonce(12)][ciphertext + tag(16)]
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(self.0.as_ref().into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt and authenticate a blob produced by [`SessionKey::seal`]
    pub fn open(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::DecryptionFailed);
        }

        let cipher = Aes256Gcm::new(self.0.as_ref().into());
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::DecryptionFailed)
    }
}
