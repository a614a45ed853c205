//! Fiber wallet core
//!
//! Contact records for the wallet address book and their canonical binary
//! encoding. This crate performs no I/O and knows nothing about security
//! tiers; encryption and persistence live in `fiber-storage-sqlite`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod contact;
pub mod error;

pub use codec::{decode, encode, CODEC_VERSION};
pub use contact::{Address, Contact, MAX_ADDRESSES_PER_CONTACT, MAX_NAME_LENGTH};
pub use error::{Error, Result};
