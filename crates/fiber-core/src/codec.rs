//! Canonical binary encoding of contact records
//!
//! Format: `[version(1)][payload_len(4, LE)][payload(variable)]`
//!
//! The payload is a protobuf `Contact { uint64 id = 1; bytes name = 2;
//! repeated Address addresses = 3; }` with `Address { bytes value = 1;
//! bytes coin = 2; }`. Protobuf alone cannot tell a message cut at a field
//! boundary from a shorter one, so the length prefix must match the
//! remaining buffer exactly.

use crate::contact::{Address, Contact};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use prost::Message;
use std::io::Cursor;

/// Current record format version
pub const CODEC_VERSION: u8 = 1;

/// Size of the version byte plus the payload length
pub const HEADER_LEN: usize = 1 + 4;

#[derive(Clone, PartialEq, Message)]
struct AddressMessage {
    #[prost(bytes = "vec", tag = "1")]
    value: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    coin: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
struct ContactMessage {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(bytes = "vec", tag = "2")]
    name: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    addresses: Vec<AddressMessage>,
}

impl From<&Contact> for ContactMessage {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            addresses: contact
                .addresses
                .iter()
                .map(|a| AddressMessage {
                    value: a.value.clone(),
                    coin: a.coin.clone(),
                })
                .collect(),
        }
    }
}

impl From<ContactMessage> for Contact {
    fn from(message: ContactMessage) -> Self {
        Self {
            id: message.id,
            name: message.name,
            addresses: message
                .addresses
                .into_iter()
                .map(|a| Address {
                    value: a.value,
                    coin: a.coin,
                })
                .collect(),
        }
    }
}

/// Encode a contact into its canonical byte form
pub fn encode(contact: &Contact) -> Result<Vec<u8>> {
    let payload = ContactMessage::from(contact).encode_to_vec();
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| Error::Encode(format!("Record too large: {} bytes", payload.len())))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.write_u8(CODEC_VERSION)
        .and_then(|_| out.write_u32::<LittleEndian>(payload_len))
        .map_err(|e| Error::Encode(e.to_string()))?;
    out.extend_from_slice(&payload);

    Ok(out)
}

/// Decode a contact from its canonical byte form
pub fn decode(data: &[u8]) -> Result<Contact> {
    let mut cursor = Cursor::new(data);

    let version = cursor
        .read_u8()
        .map_err(|_| Error::Decode("Empty record".to_string()))?;
    if version != CODEC_VERSION {
        return Err(Error::Decode(format!(
            "Unsupported record version: {}",
            version
        )));
    }

    let payload_len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::Decode("Truncated record header".to_string()))?
        as usize;

    let payload = &data[HEADER_LEN..];
    if payload.len() != payload_len {
        return Err(Error::Decode(format!(
            "Record length mismatch: header says {} bytes, found {}",
            payload_len,
            payload.len()
        )));
    }

    let message = ContactMessage::decode(payload).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(message.into())
}
