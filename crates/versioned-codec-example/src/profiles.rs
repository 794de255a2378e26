//! User profiles persisted as JSON envelopes.
//!
//! Schema history:
//!
//! | Version | Shape |
//! |---------|-------|
//! | 1 | `{ name, age }` |
//! | 2 | `{ firstName, lastName, age }` |
//! | 3 | `{ firstName, lastName, age, email }` |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use versioned_codec::{Json, Migrations, Result, Versioned, VersionedCodec, VersionedSchema};

/// A profile as current code understands it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
}

/// The profile schema: version 3, two steps.
pub struct ProfileSchema;

impl VersionedSchema for ProfileSchema {
    type Wire = Json;
    const VERSION: u32 = 3;

    fn migrations() -> Migrations<Value> {
        Migrations::new()
            .declare(2, split_name)
            .declare(3, derive_email)
    }
}

/// v1 → v2: split `name` on the first space.
fn split_name(mut data: Value) -> Value {
    let name = data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let (first, last) = name.split_once(' ').unwrap_or((name.as_str(), ""));

    if let Some(fields) = data.as_object_mut() {
        fields.remove("name");
        fields.insert("firstName".into(), json!(first));
        fields.insert("lastName".into(), json!(last));
    }
    data
}

/// v2 → v3: derive a lowercased `first.last@example.com` address.
fn derive_email(mut data: Value) -> Value {
    let first = data["firstName"].as_str().unwrap_or_default();
    let last = data["lastName"].as_str().unwrap_or_default();
    let email = format!("{first}.{last}@example.com").to_lowercase();
    data["email"] = json!(email);
    data
}

/// In-memory profile storage that upgrades records as they are read.
pub struct ProfileStore {
    codec: VersionedCodec<Json>,
    records: HashMap<String, Vec<u8>>,
    write_back_on_read: bool,
}

impl Versioned for ProfileStore {
    type Format = Json;

    fn codec(&self) -> &VersionedCodec<Json> {
        &self.codec
    }
}

impl ProfileStore {
    /// An empty store. With `write_back_on_read`, migrated records are
    /// re-encoded at the current version after a successful load.
    pub fn new(write_back_on_read: bool) -> Result<Self> {
        Ok(Self {
            codec: ProfileSchema::build_codec(Json)?,
            records: HashMap::new(),
            write_back_on_read,
        })
    }

    /// Store raw envelope bytes, as if read from disk.
    pub fn put_raw(&mut self, key: &str, bytes: Vec<u8>) {
        self.records.insert(key.to_owned(), bytes);
    }

    /// The raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Save a profile at the current version.
    pub fn save(&mut self, key: &str, profile: &Profile) -> Result<()> {
        let bytes = self.encode_value(profile)?;
        self.records.insert(key.to_owned(), bytes);
        Ok(())
    }

    /// Load a profile, migrating it if it was written by an older version.
    pub fn load(&mut self, key: &str) -> Result<Option<Profile>> {
        let Some(raw) = self.records.get(key) else {
            return Ok(None);
        };

        let stored_version = self.codec.peek_version(raw)?;
        let profile: Profile = self.decode_value(raw)?;

        if self.write_back_on_read && self.codec.needs_migration(stored_version) {
            tracing::info!(key, from = stored_version, "rewriting migrated profile");
            self.save(key, &profile)?;
        }
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1(name: &str, age: u32) -> Vec<u8> {
        serde_json::to_vec(&json!({"version": 1, "data": {"name": name, "age": age}})).unwrap()
    }

    #[test]
    fn loads_v1_as_current_profile() {
        let mut store = ProfileStore::new(false).unwrap();
        store.put_raw("john", v1("John Doe", 30));

        let profile = store.load("john").unwrap().unwrap();

        assert_eq!(
            profile,
            Profile {
                first_name: "John".into(),
                last_name: "Doe".into(),
                age: 30,
                email: "john.doe@example.com".into(),
            }
        );
        assert_eq!(store.codec().peek_version(store.raw("john").unwrap()).unwrap(), 1);
    }

    #[test]
    fn write_back_upgrades_stored_bytes() {
        let mut store = ProfileStore::new(true).unwrap();
        store.put_raw("ada", v1("Ada Lovelace", 36));

        let first = store.load("ada").unwrap().unwrap();
        assert_eq!(store.codec().peek_version(store.raw("ada").unwrap()).unwrap(), 3);

        let second = store.load("ada").unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_word_name_leaves_last_name_empty() {
        let mut store = ProfileStore::new(false).unwrap();
        store.put_raw("cher", v1("Cher", 77));

        let profile = store.load("cher").unwrap().unwrap();
        assert_eq!(profile.first_name, "Cher");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.email, "cher.@example.com");
    }

    #[test]
    fn missing_key_is_none() {
        let mut store = ProfileStore::new(true).unwrap();
        assert_eq!(store.load("nobody").unwrap(), None);
    }
}
