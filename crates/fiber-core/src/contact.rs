//! Contact records held in the address book
//!
//! A contact is a human-readable name plus any number of typed addresses.
//! Names and address components are opaque byte strings: they are compared
//! byte-for-byte and are not required to be UTF-8.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum name length in bytes
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum number of addresses a single contact may carry
pub const MAX_ADDRESSES_PER_CONTACT: usize = 64;

/// An address together with the coin type it belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    /// Address payload (textual or raw-encoded chain address)
    pub value: Vec<u8>,
    /// Coin type discriminator (e.g. `SKY`, `BTC`)
    pub coin: Vec<u8>,
}

impl Address {
    /// Create a new address
    pub fn new(value: impl Into<Vec<u8>>, coin: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            coin: coin.into(),
        }
    }

    /// Whether this address has the same `(value, coin)` pair as `other`
    pub fn same_as(&self, other: &Address) -> bool {
        self.value == other.value && self.coin == other.coin
    }

    /// Value rendered for messages and logs (lossy for non-UTF-8 bytes)
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    /// Coin type rendered for messages and logs (lossy for non-UTF-8 bytes)
    pub fn coin_lossy(&self) -> String {
        String::from_utf8_lossy(&self.coin).into_owned()
    }
}

/// Address book contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Storage-assigned ID (0 until the contact has been stored)
    pub id: u64,
    /// Display name, unique within an address book
    pub name: Vec<u8>,
    /// Addresses in insertion order
    pub addresses: Vec<Address>,
}

impl Contact {
    /// Create new contact (for insertion)
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        Self {
            id: 0, // Will be set by storage
            name: name.into(),
            addresses: Vec::new(),
        }
    }

    /// Append an address
    pub fn with_address(mut self, value: impl Into<Vec<u8>>, coin: impl Into<Vec<u8>>) -> Self {
        self.addresses.push(Address::new(value, coin));
        self
    }

    /// Replace all addresses
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Set the storage ID
    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    /// Name rendered for display (lossy for non-UTF-8 bytes)
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Whether any of this contact's addresses equals `address`
    pub fn has_address(&self, address: &Address) -> bool {
        self.addresses.iter().any(|a| a.same_as(address))
    }

    /// Check that the contact is well-formed before it is stored.
    ///
    /// The name must be non-empty and at most [`MAX_NAME_LENGTH`] bytes, and
    /// every address needs both a value and a coin type.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidContact("Name cannot be empty".to_string()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidContact(format!(
                "Name too long: {} (max {})",
                self.name.len(),
                MAX_NAME_LENGTH
            )));
        }
        if self.addresses.len() > MAX_ADDRESSES_PER_CONTACT {
            return Err(Error::InvalidContact(format!(
                "Too many addresses: {} (max {})",
                self.addresses.len(),
                MAX_ADDRESSES_PER_CONTACT
            )));
        }
        for (index, address) in self.addresses.iter().enumerate() {
            if address.value.is_empty() {
                return Err(Error::InvalidContact(format!(
                    "Address #{} has an empty value",
                    index
                )));
            }
            if address.coin.is_empty() {
                return Err(Error::InvalidContact(format!(
                    "Address #{} has an empty coin type",
                    index
                )));
            }
        }
        Ok(())
    }

    /// First address that appears more than once within this contact
    pub fn first_repeated_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .enumerate()
            .find(|(i, a)| self.addresses[..*i].iter().any(|prev| prev.same_as(a)))
            .map(|(_, a)| a)
    }
}
