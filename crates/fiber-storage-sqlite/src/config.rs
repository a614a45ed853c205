//! Address book configuration

use crate::security::{PasswordHashParams, DEFAULT_MNEMONIC_WORDS, MIN_KDF_ROUNDS};
use crate::{Error, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the address book location
pub const PATH_ENV_VAR: &str = "FIBER_ADDRESS_BOOK_PATH";

/// Data directory under the user's home
pub const DATA_DIR: &str = ".fiber";

/// Address book file name
pub const DATA_FILE: &str = "data.dt";

/// Settings used to open and initialize an address book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressBookConfig {
    /// Address book file
    pub path: PathBuf,
    /// PBKDF2 rounds recorded for new password-tier books
    pub kdf_rounds: u32,
    /// Mnemonic length behind the entropy seed
    pub mnemonic_words: usize,
    /// Argon2id cost for the stored password hash
    pub password_hash: PasswordHashParams,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            kdf_rounds: MIN_KDF_ROUNDS,
            mnemonic_words: DEFAULT_MNEMONIC_WORDS,
            password_hash: PasswordHashParams::default(),
        }
    }
}

impl AddressBookConfig {
    /// Default settings pointing at `path`
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }

    /// Check settings before use
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("Address book path is empty".to_string()));
        }

        if self.kdf_rounds < MIN_KDF_ROUNDS {
            return Err(Error::Config(format!(
                "kdf_rounds must be at least {}, got {}",
                MIN_KDF_ROUNDS, self.kdf_rounds
            )));
        }

        if !matches!(self.mnemonic_words, 12 | 15 | 18 | 21 | 24) {
            return Err(Error::Config(format!(
                "mnemonic_words must be 12, 15, 18, 21 or 24, got {}",
                self.mnemonic_words
            )));
        }

        let hash = &self.password_hash;
        if hash.m_cost < 8 * hash.p_cost || hash.t_cost == 0 || hash.p_cost == 0 {
            return Err(Error::Config(format!(
                "Invalid Argon2 parameters: m_cost={}, t_cost={}, p_cost={}",
                hash.m_cost, hash.t_cost, hash.p_cost
            )));
        }

        Ok(())
    }

    /// Whether the address book file already exists
    pub fn store_exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Resolve the default address book location
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var(PATH_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DATA_DIR).join(DATA_FILE))
        .unwrap_or_else(|| PathBuf::from(".").join(DATA_FILE))
}
