//! Encrypted address book storage for Fiber wallet
//!
//! Persists contacts behind one of three security tiers chosen when the
//! book is initialized.
//!
//! ## Security Tiers
//!
//! - **None**: records stored as canonical bytes
//! - **Obfuscation**: records stored as base64 text
//! - **Password**: records sealed with AES-256-GCM; the key is derived with
//!   PBKDF2-HMAC-SHA512 from the password and a BIP-39 entropy seed, and the
//!   password itself is checked against an Argon2id hash

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address_book;
pub mod cipher;
pub mod config;
pub mod database;
pub mod encryption;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod security;
pub mod storage;

pub use address_book::AddressBook;
pub use cipher::ContactCipher;
pub use config::{default_path, AddressBookConfig, PATH_ENV_VAR};
pub use database::SqliteStorage;
pub use encryption::SessionKey;
pub use error::{Error, ErrorCategory, Result};
pub use memory::MemoryStorage;
pub use security::{
    entropy_from_mnemonic, generate_entropy_mnemonic, PasswordHash, PasswordHashParams,
    SecurityConfig, SecurityTier, MIN_KDF_ROUNDS,
};
pub use storage::{ConfigRecord, Storage};
