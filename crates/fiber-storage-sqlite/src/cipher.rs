//! Per-tier transform between canonical contact bytes and stored blobs

use crate::encryption::SessionKey;
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Record transform selected by the book's security tier
#[derive(Debug, Clone)]
pub enum ContactCipher {
    /// Identity
    Plain,
    /// Base64 text of the canonical bytes
    Obfuscated,
    /// AES-256-GCM under the session key
    Sealed(SessionKey),
}

impl ContactCipher {
    /// Transform canonical bytes into a storable blob
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            ContactCipher::Plain => Ok(plaintext.to_vec()),
            ContactCipher::Obfuscated => Ok(STANDARD.encode(plaintext).into_bytes()),
            ContactCipher::Sealed(key) => key.seal(plaintext),
        }
    }

    /// Recover canonical bytes from a stored blob
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        match self {
            ContactCipher::Plain => Ok(blob.to_vec()),
            ContactCipher::Obfuscated => STANDARD
                .decode(blob)
                .map_err(|e| Error::DecodeFailed(format!("Invalid base64 record: {}", e))),
            ContactCipher::Sealed(key) => key.open(blob),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_is_identity() {
        let cipher = ContactCipher::Plain;
        assert_eq!(cipher.encrypt(b"\x00\xffraw").unwrap(), b"\x00\xffraw");
        assert_eq!(cipher.decrypt(b"\x00\xffraw").unwrap(), b"\x00\xffraw");
    }

    #[test]
    fn test_obfuscated_is_base64() {
        let cipher = ContactCipher::Obfuscated;
        let blob = cipher.encrypt(b"Alice").unwrap();
        assert_eq!(blob, b"QWxpY2U=");
        assert_eq!(cipher.decrypt(&blob).unwrap(), b"Alice");
    }

    #[test]
    fn test_obfuscated_rejects_bad_text() {
        let result = ContactCipher::Obfuscated.decrypt(b"not base64!!");
        assert!(matches!(result, Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_sealed_roundtrip() {
        let cipher = ContactCipher::Sealed(SessionKey::from_bytes([3u8; 32]));
        let blob = cipher.encrypt(b"Alice").unwrap();
        assert!(!blob.windows(5).any(|w| w == b"Alice"));
        assert_eq!(cipher.decrypt(&blob).unwrap(), b"Alice");
    }

    #[test]
    fn test_sealed_empty_payload() {
        let cipher = ContactCipher::Sealed(SessionKey::from_bytes([3u8; 32]));
        let blob = cipher.encrypt(b"").unwrap();
        assert!(cipher.decrypt(&blob).unwrap().is_empty());
    }
}
