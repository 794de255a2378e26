//! Wire formats: how an [`Envelope`] becomes bytes and back.
//!
//! The codec never touches bytes directly. It hands envelopes to a
//! [`WireFormat`], which decides both the encoding and the in-memory payload
//! type that migrations operate on.

use alloc::string::ToString;
use alloc::vec::Vec;

use serde::{de::DeserializeOwned, Serialize};

use crate::envelope::Envelope;
use crate::error::{Error, Result};

/// Encodes and decodes envelopes.
pub trait WireFormat {
    /// The payload representation transforms receive and return.
    type Payload;

    /// Encode `data` tagged with `version`.
    fn encode(&self, version: u32, data: &Self::Payload) -> Result<Vec<u8>>;

    /// Decode an envelope. Fails with [`Error::Decode`] on malformed bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Envelope<Self::Payload>>;

    /// Read only the version tag.
    fn peek_version(&self, bytes: &[u8]) -> Result<u32> {
        self.decode(bytes).map(|envelope| envelope.version)
    }
}

/// A wire format whose payloads convert to and from typed Rust values.
pub trait TypedPayload: WireFormat {
    /// Convert a typed value into a payload.
    fn to_payload<T: Serialize>(&self, value: &T) -> Result<Self::Payload>;

    /// Convert a payload into a typed value.
    fn from_payload<T: DeserializeOwned>(&self, payload: Self::Payload) -> Result<T>;
}

/// JSON envelopes: `{"version": <int>, "data": <value>}`.
///
/// Payloads are [`serde_json::Value`], so transforms can reshape records
/// field by field.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

#[cfg(feature = "json")]
impl WireFormat for Json {
    type Payload = serde_json::Value;

    fn encode(&self, version: u32, data: &Self::Payload) -> Result<Vec<u8>> {
        serde_json::to_vec(&Envelope::new(version, data)).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Envelope<Self::Payload>> {
        serde_json::from_value(json_object(bytes)?).map_err(|e| Error::Decode(e.to_string()))
    }

    fn peek_version(&self, bytes: &[u8]) -> Result<u32> {
        #[derive(serde::Deserialize)]
        struct Header {
            version: u32,
        }

        serde_json::from_value::<Header>(json_object(bytes)?)
            .map(|header| header.version)
            .map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Parse `bytes` as a JSON object. Serde would otherwise also accept the
/// positional `[version, data]` form for a derived struct.
#[cfg(feature = "json")]
fn json_object(bytes: &[u8]) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::Decode("envelope must be a JSON object".to_string()));
    }
    Ok(value)
}

#[cfg(feature = "json")]
impl TypedPayload for Json {
    fn to_payload<T: Serialize>(&self, value: &T) -> Result<Self::Payload> {
        serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn from_payload<T: DeserializeOwned>(&self, payload: Self::Payload) -> Result<T> {
        serde_json::from_value(payload).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Compact binary envelopes encoded with postcard.
///
/// Layout: the version as a varint, then the length-prefixed payload bytes.
/// Payloads are the postcard encoding of the versioned struct, so a transform
/// typically decodes the old struct, builds the new one and re-encodes it.
#[cfg(feature = "postcard")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postcard;

#[cfg(feature = "postcard")]
impl WireFormat for Postcard {
    type Payload = Vec<u8>;

    fn encode(&self, version: u32, data: &Self::Payload) -> Result<Vec<u8>> {
        postcard::to_allocvec(&Envelope::new(version, data)).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Envelope<Self::Payload>> {
        let (envelope, rest) = postcard::take_from_bytes::<Envelope<Vec<u8>>>(bytes)
            .map_err(|e| Error::Decode(e.to_string()))?;
        if !rest.is_empty() {
            return Err(Error::Decode(alloc::format!(
                "{} trailing bytes after envelope",
                rest.len()
            )));
        }
        Ok(envelope)
    }

    fn peek_version(&self, bytes: &[u8]) -> Result<u32> {
        postcard::take_from_bytes::<u32>(bytes)
            .map(|(version, _)| version)
            .map_err(|e| Error::Decode(e.to_string()))
    }
}

#[cfg(feature = "postcard")]
impl TypedPayload for Postcard {
    fn to_payload<T: Serialize>(&self, value: &T) -> Result<Self::Payload> {
        postcard::to_allocvec(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn from_payload<T: DeserializeOwned>(&self, payload: Self::Payload) -> Result<T> {
        postcard::from_bytes(&payload).map_err(|e| Error::Decode(e.to_string()))
    }
}
