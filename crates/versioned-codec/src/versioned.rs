//! Adding versioned persistence to a domain type by composition.
//!
//! A domain type owns a [`VersionedCodec`] and implements [`Versioned`] by
//! returning it; the envelope operations then become plain methods on the
//! domain type. [`VersionedSchema`] describes how such a codec is configured,
//! so every instance builds its own codec from the same declaration instead of
//! sharing a global registry.

use alloc::vec::Vec;

use serde::{de::DeserializeOwned, Serialize};

use crate::codec::VersionedCodec;
use crate::error::Result;
use crate::format::{TypedPayload, WireFormat};
use crate::migrations::Migrations;

/// A type that persists itself through an owned codec.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use versioned_codec::{Json, Versioned, VersionedCodec};
///
/// struct Settings {
///     codec: VersionedCodec<Json>,
/// }
///
/// impl Versioned for Settings {
///     type Format = Json;
///
///     fn codec(&self) -> &VersionedCodec<Json> {
///         &self.codec
///     }
/// }
///
/// let settings = Settings { codec: VersionedCodec::new(1, Json) };
/// let bytes = settings.to_envelope(&json!({"theme": "dark"})).unwrap();
/// assert_eq!(settings.from_envelope(&bytes).unwrap(), json!({"theme": "dark"}));
/// ```
pub trait Versioned {
    /// The wire format of the owned codec.
    type Format: WireFormat;

    /// The owned codec.
    fn codec(&self) -> &VersionedCodec<Self::Format>;

    /// The schema version written by this type.
    fn schema_version(&self) -> u32 {
        self.codec().current_version()
    }

    /// Encode a current-shape payload.
    fn to_envelope(&self, payload: &<Self::Format as WireFormat>::Payload) -> Result<Vec<u8>> {
        self.codec().serialize(payload)
    }

    /// Decode an envelope of any supported version into a current-shape payload.
    fn from_envelope(&self, bytes: &[u8]) -> Result<<Self::Format as WireFormat>::Payload> {
        self.codec().deserialize(bytes)
    }

    /// Encode a typed value.
    fn encode_value<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>
    where
        Self::Format: TypedPayload,
    {
        self.codec().serialize_value(value)
    }

    /// Decode and migrate an envelope into a typed value.
    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>
    where
        Self::Format: TypedPayload,
    {
        self.codec().deserialize_value(bytes)
    }
}

/// The versioning configuration of a logical type.
///
/// `migrations` returns a fresh list on every call, so each codec built from
/// it owns its own transforms.
pub trait VersionedSchema {
    /// The wire format payloads travel in.
    type Wire: WireFormat;

    /// The version current code writes.
    const VERSION: u32;

    /// Every step from version 1 up to [`VERSION`](Self::VERSION), keyed by
    /// the version each produces.
    fn migrations() -> Migrations<<Self::Wire as WireFormat>::Payload>;

    /// Build a codec at [`VERSION`](Self::VERSION) with every declared step.
    fn build_codec(wire: Self::Wire) -> Result<VersionedCodec<Self::Wire>> {
        VersionedCodec::with_migrations(Self::VERSION, wire, Self::migrations())
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::format::Json;
    use serde_json::{json, Value};

    struct Counter;

    impl VersionedSchema for Counter {
        type Wire = Json;
        const VERSION: u32 = 2;

        fn migrations() -> Migrations<Value> {
            Migrations::new().declare(2, |data: Value| json!({ "count": data["n"] }))
        }
    }

    struct CounterStore {
        codec: VersionedCodec<Json>,
    }

    impl Versioned for CounterStore {
        type Format = Json;

        fn codec(&self) -> &VersionedCodec<Json> {
            &self.codec
        }
    }

    fn store() -> CounterStore {
        CounterStore {
            codec: Counter::build_codec(Json).unwrap(),
        }
    }

    #[test]
    fn schema_builds_a_complete_chain() {
        let store = store();
        assert_eq!(store.schema_version(), 2);
        assert!(store.codec().validate_chain(1).is_ok());
    }

    #[test]
    fn delegates_migration_to_the_codec() {
        let store = store();
        let migrated = store
            .from_envelope(br#"{"version":1,"data":{"n":4}}"#)
            .unwrap();
        assert_eq!(migrated, json!({"count": 4}));
    }

    #[test]
    fn instances_do_not_share_codecs() {
        let mut a = store();
        let b = store();

        a.codec.set_current_version(3).unwrap();
        assert_eq!(a.schema_version(), 3);
        assert_eq!(b.schema_version(), 2);

        let stale = a.to_envelope(&json!({})).unwrap();
        assert_eq!(
            b.from_envelope(&stale).unwrap_err(),
            Error::FutureVersion {
                found: 3,
                current: 2
            }
        );
    }

    #[test]
    fn typed_helpers() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Count {
            count: u32,
        }

        let store = store();
        let bytes = store.encode_value(&Count { count: 9 }).unwrap();
        let back: Count = store.decode_value(&bytes).unwrap();
        assert_eq!(back, Count { count: 9 });
    }
}
