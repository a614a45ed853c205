//! Encrypted address book
//!
//! Contacts are serialized with [`fiber_core::codec`], passed through the
//! [`ContactCipher`] selected by the book's security tier, and stored as
//! opaque blobs. Uniqueness of names and `(value, coin)` pairs is checked
//! against the decrypted set before every write.

use crate::cipher::ContactCipher;
use crate::config::AddressBookConfig;
use crate::database::SqliteStorage;
use crate::encryption::SessionKey;
use crate::security::{
    generate_entropy_seed, PasswordHash, PasswordHashParams, SecurityConfig, SecurityTier,
};
use crate::storage::Storage;
use crate::{Error, Result};
use fiber_core::{codec, Contact};
use parking_lot::RwLock;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Parameters applied when a book is initialized
#[derive(Debug, Clone, Copy)]
struct InitSettings {
    kdf_rounds: u32,
    mnemonic_words: usize,
    password_hash: PasswordHashParams,
}

impl From<&AddressBookConfig> for InitSettings {
    fn from(config: &AddressBookConfig) -> Self {
        Self {
            kdf_rounds: config.kdf_rounds,
            mnemonic_words: config.mnemonic_words,
            password_hash: config.password_hash,
        }
    }
}

struct Session<S> {
    storage: S,
    cipher: Option<ContactCipher>,
}

impl<S: Storage> Session<S> {
    fn cipher(&self) -> Result<&ContactCipher> {
        if !self.storage.is_open() {
            return Err(Error::NotOpen);
        }
        self.cipher.as_ref().ok_or(Error::NotAuthenticated)
    }

    fn load_security(&self) -> Result<SecurityConfig> {
        if !self.storage.is_open() {
            return Err(Error::NotOpen);
        }
        let record = self.storage.get_config()?.ok_or(Error::NotInitialized)?;
        SecurityConfig::from_record(&record)
    }

    fn seal_record(&self, contact: &Contact) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;
        // The ID lives in the storage key, not in the record
        let mut record = contact.clone();
        record.set_id(0);
        let bytes = Zeroizing::new(codec::encode(&record)?);
        cipher.encrypt(&bytes)
    }

    fn open_record(&self, id: u64, blob: &[u8]) -> Result<Contact> {
        let cipher = self.cipher()?;
        let decoded = cipher.decrypt(blob).and_then(|bytes| {
            let bytes = Zeroizing::new(bytes);
            codec::decode(&bytes).map_err(Error::from)
        });

        match decoded {
            Ok(mut contact) => {
                contact.set_id(id);
                Ok(contact)
            }
            Err(e) => {
                tracing::warn!("Record {} failed integrity check: {}", id, e.category());
                Err(e)
            }
        }
    }

    fn load_contacts(&self) -> Result<Vec<Contact>> {
        self.cipher()?;
        self.storage
            .list_values()?
            .into_iter()
            .map(|(id, blob)| self.open_record(id, &blob))
            .collect()
    }
}

/// Reject contacts whose name or any `(value, coin)` pair is already taken.
///
/// `exclude` names the record being replaced by an update.
fn check_unique(existing: &[Contact], candidate: &Contact, exclude: Option<u64>) -> Result<()> {
    let others = || existing.iter().filter(move |c| Some(c.id) != exclude);

    for address in &candidate.addresses {
        if others().any(|c| c.has_address(address)) {
            return Err(Error::DuplicateAddress {
                value: address.value_lossy(),
                coin: address.coin_lossy(),
            });
        }
    }

    if others().any(|c| c.name == candidate.name) {
        return Err(Error::DuplicateName(candidate.name_lossy()));
    }

    Ok(())
}

/// Cipher for tiers that are usable without credentials
fn credential_free_cipher(tier: SecurityTier) -> Option<ContactCipher> {
    match tier {
        SecurityTier::None => Some(ContactCipher::Plain),
        SecurityTier::Obfuscation => Some(ContactCipher::Obfuscated),
        SecurityTier::Password => None,
    }
}

fn validate_contact(contact: &Contact) -> Result<()> {
    contact.validate()?;
    if let Some(address) = contact.first_repeated_address() {
        return Err(Error::DuplicateAddress {
            value: address.value_lossy(),
            coin: address.coin_lossy(),
        });
    }
    Ok(())
}

/// Address book handle over any [`Storage`]
pub struct AddressBook<S: Storage> {
    session: RwLock<Session<S>>,
    settings: InitSettings,
}

impl AddressBook<SqliteStorage> {
    /// Open the SQLite file named by `config`
    pub fn open(config: &AddressBookConfig) -> Result<Self> {
        config.validate()?;
        let storage = SqliteStorage::open(&config.path)?;
        Self::with_config(storage, config)
    }

    /// Whether the file named by `config` already exists
    pub fn store_exists(config: &AddressBookConfig) -> bool {
        config.store_exists()
    }
}

impl<S: Storage> AddressBook<S> {
    /// Wrap an opened storage with default settings
    pub fn new(storage: S) -> Result<Self> {
        Self::build(storage, InitSettings::from(&AddressBookConfig::default()))
    }

    /// Wrap an opened storage, taking init parameters from `config`
    pub fn with_config(storage: S, config: &AddressBookConfig) -> Result<Self> {
        config.validate()?;
        Self::build(storage, InitSettings::from(config))
    }

    fn build(storage: S, settings: InitSettings) -> Result<Self> {
        let mut session = Session {
            storage,
            cipher: None,
        };

        // Tiers without credentials are usable as soon as they are opened
        if session.storage.is_open() {
            if let Some(record) = session.storage.get_config()? {
                let security = SecurityConfig::from_record(&record)?;
                session.cipher = credential_free_cipher(security.tier);
                tracing::debug!(
                    "Opened address book: tier={}",
                    security.tier.display_name()
                );
            }
        }

        Ok(Self {
            session: RwLock::new(session),
            settings,
        })
    }

    /// Write the security configuration and unlock the book
    pub fn init(&self, tier: SecurityTier, password: &str) -> Result<()> {
        let mut session = self.session.write();
        if !session.storage.is_open() {
            return Err(Error::NotOpen);
        }
        if session.storage.get_config()?.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let (security, cipher) = match tier {
            SecurityTier::None => (SecurityConfig::unprotected(tier), ContactCipher::Plain),
            SecurityTier::Obfuscation => {
                (SecurityConfig::unprotected(tier), ContactCipher::Obfuscated)
            }
            SecurityTier::Password => {
                let hash = PasswordHash::hash(password, &self.settings.password_hash)?;
                let entropy = generate_entropy_seed(self.settings.mnemonic_words)?;
                let key = SessionKey::derive(password, &entropy, self.settings.kdf_rounds)?;
                (
                    SecurityConfig::password(hash, entropy, self.settings.kdf_rounds),
                    ContactCipher::Sealed(key),
                )
            }
        };

        session.storage.insert_config(security.to_record())?;
        session.cipher = Some(cipher);

        tracing::info!("Initialized address book: tier={}", tier.display_name());
        Ok(())
    }

    /// Unlock the book. A no-op for tiers without a password.
    ///
    /// Any held key is dropped first, so a failed attempt always leaves the
    /// book locked.
    pub fn authenticate(&self, password: &str) -> Result<()> {
        let mut session = self.session.write();
        session.cipher = None;
        let security = session.load_security()?;

        if !security.tier.requires_password() {
            session.cipher = credential_free_cipher(security.tier);
            return Ok(());
        }

        let unlocked = security.password_hash().verify(password).and_then(|valid| {
            if !valid {
                return Ok(None);
            }
            SessionKey::derive(password, &security.entropy, security.kdf_rounds).map(Some)
        });

        match unlocked {
            Ok(Some(key)) => {
                session.cipher = Some(ContactCipher::Sealed(key));
                tracing::info!("Address book unlocked");
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("Address book authentication failed");
                Err(Error::AuthenticationFailed)
            }
            Err(e) => {
                tracing::warn!("Address book authentication failed: {}", e.category());
                Err(Error::AuthenticationFailed)
            }
        }
    }

    /// Store a new contact and return its ID
    pub fn insert_contact(&self, contact: &Contact) -> Result<u64> {
        let mut session = self.session.write();
        let existing = session.load_contacts()?;

        validate_contact(contact)?;
        check_unique(&existing, contact, None)?;

        let blob = session.seal_record(contact)?;
        let id = session.storage.insert_value(&blob)?;

        tracing::debug!("Inserted contact {}", id);
        Ok(id)
    }

    /// Fetch one contact
    pub fn get_contact(&self, id: u64) -> Result<Contact> {
        let session = self.session.read();
        session.cipher()?;
        let blob = session.storage.get_value(id)?;
        session.open_record(id, &blob)
    }

    /// All contacts ordered by ID. Fails if any record cannot be read.
    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.session.read().load_contacts()
    }

    /// Replace an existing contact
    pub fn update_contact(&self, id: u64, contact: &Contact) -> Result<()> {
        let mut session = self.session.write();
        let existing = session.load_contacts()?;

        if !existing.iter().any(|c| c.id == id) {
            return Err(Error::NotFound(id));
        }

        validate_contact(contact)?;
        check_unique(&existing, contact, Some(id))?;

        let blob = session.seal_record(contact)?;
        session.storage.update_value(id, &blob)?;

        tracing::debug!("Updated contact {}", id);
        Ok(())
    }

    /// Remove a contact. The record is not decrypted.
    pub fn delete_contact(&self, id: u64) -> Result<()> {
        let mut session = self.session.write();
        session.cipher()?;
        session.storage.delete_value(id)?;

        tracing::debug!("Deleted contact {}", id);
        Ok(())
    }

    /// Contacts whose name or any address value contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let needle = query.to_lowercase();
        let contacts = self.list_contacts()?;

        Ok(contacts
            .into_iter()
            .filter(|c| {
                c.name_lossy().to_lowercase().contains(&needle)
                    || c
                        .addresses
                        .iter()
                        .any(|a| a.value_lossy().to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Contact owning the exact `(value, coin)` pair
    pub fn find_by_address(&self, value: &[u8], coin: &[u8]) -> Result<Option<Contact>> {
        let contacts = self.list_contacts()?;
        Ok(contacts.into_iter().find(|c| {
            c.addresses
                .iter()
                .any(|a| a.value == value && a.coin == coin)
        }))
    }

    /// Number of stored contacts
    pub fn count(&self) -> Result<u64> {
        let session = self.session.read();
        session.cipher()?;
        session.storage.count_values()
    }

    /// Whether a security configuration has been written
    pub fn has_init(&self) -> bool {
        let session = self.session.read();
        session.storage.is_open() && matches!(session.storage.get_config(), Ok(Some(_)))
    }

    /// Whether the underlying storage is open
    pub fn is_open(&self) -> bool {
        self.session.read().storage.is_open()
    }

    /// Whether contact operations are currently permitted
    pub fn is_authenticated(&self) -> bool {
        self.session.read().cipher().is_ok()
    }

    /// Location of the open storage
    pub fn get_path(&self) -> Option<PathBuf> {
        self.session.read().storage.path().map(|p| p.to_path_buf())
    }

    /// Tier recorded at initialization
    pub fn security_tier(&self) -> Result<SecurityTier> {
        Ok(self.session.read().load_security()?.tier)
    }

    /// Drop key material and close the storage. Closing twice is not an error.
    pub fn close(&self) -> Result<()> {
        let mut session = self.session.write();
        session.cipher = None;
        if session.storage.is_open() {
            session.storage.close()?;
            tracing::info!("Address book closed");
        }
        Ok(())
    }

    /// Release the handle and hand back its storage
    pub fn into_storage(self) -> S {
        self.session.into_inner().storage
    }
}
