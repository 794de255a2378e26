//! # Profile Migration Example
//!
//! Walks through versioned persistence end to end:
//!
//! 1. **Lazy migration**: a v1 profile loads as v3 on read
//! 2. **Write-back**: migrated records are rewritten at the current version
//! 3. **Rejections**: newer data and broken chains fail loudly
//! 4. **Binary envelopes**: typed structs migrated through postcard
//!
//! Run: `RUST_LOG=versioned_codec=trace cargo run -p versioned-codec-example`

mod profiles;

use profiles::{Profile, ProfileStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use versioned_codec::{Error, Json, Postcard, Versioned, VersionedCodec};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Profile Migration Example ===\n");

    demo_lazy_migration()?;
    demo_write_back()?;
    demo_rejections()?;
    demo_binary_envelopes()?;

    println!("\n=== Done! ===");
    Ok(())
}

// ── Section 1: Lazy migration ─────────────────────────────────────

fn demo_lazy_migration() -> Result<(), Error> {
    println!("1. Loading a v1 profile with a v3 codec...\n");

    let mut store = ProfileStore::new(false)?;
    let v1 = br#"{"version":1,"data":{"name":"John Doe","age":30}}"#;
    store.put_raw("john", v1.to_vec());
    println!("   Stored:   {}", String::from_utf8_lossy(v1));

    let profile = store.load("john")?.unwrap_or_else(|| unreachable!("just stored"));
    println!("   Migrated: {profile:?}");

    assert_eq!(profile.email, "john.doe@example.com");
    println!();
    Ok(())
}

// ── Section 2: Write-back ─────────────────────────────────────────

fn demo_write_back() -> Result<(), Error> {
    println!("2. Rewriting migrated records on read...\n");

    let mut store = ProfileStore::new(true)?;
    let v2 = json!({
        "version": 2,
        "data": {"firstName": "Ada", "lastName": "Lovelace", "age": 36}
    });
    store.put_raw("ada", v2.to_string().into_bytes());

    let loaded = store.load("ada")?;
    let rewritten = store.raw("ada").map(String::from_utf8_lossy);
    println!("   Loaded:    {loaded:?}");
    println!("   Rewritten: {}", rewritten.unwrap_or_default());

    store.save(
        "grace",
        &Profile {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            age: 85,
            email: "grace.hopper@example.com".into(),
        },
    )?;
    println!("   Saved new profile at v3\n");
    Ok(())
}

// ── Section 3: Rejections ─────────────────────────────────────────

fn demo_rejections() -> Result<(), Error> {
    println!("3. Data the codec cannot accept...\n");

    let store = ProfileStore::new(false)?;
    let future = br#"{"version":5,"data":{}}"#;
    match store.from_envelope(future) {
        Err(e @ Error::FutureVersion { .. }) => println!("   v5 record: {e}"),
        other => unreachable!("expected a future-version error, got {other:?}"),
    }

    let mut partial = VersionedCodec::new(3, Json);
    partial.register(2, |data: Value| data)?;
    match partial.deserialize(br#"{"version":1,"data":{}}"#) {
        Err(e @ Error::MissingMigration { .. }) => println!("   broken chain: {e}"),
        other => unreachable!("expected a missing-migration error, got {other:?}"),
    }

    match partial.register(3, |data: Value| data) {
        Err(e @ Error::InvalidMigrationRange { .. }) => println!("   bad registration: {e}"),
        other => unreachable!("expected a range error, got {other:?}"),
    }
    println!();
    Ok(())
}

// ── Section 4: Binary envelopes ───────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct ReadingV1 {
    celsius: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReadingV2 {
    celsius: f32,
    fahrenheit: f32,
}

fn add_fahrenheit(bytes: Vec<u8>) -> Vec<u8> {
    let old: ReadingV1 = postcard::from_bytes(&bytes).expect("v1 reading");
    postcard::to_allocvec(&ReadingV2 {
        celsius: old.celsius,
        fahrenheit: old.celsius * 9.0 / 5.0 + 32.0,
    })
    .expect("v2 reading")
}

fn demo_binary_envelopes() -> Result<(), Error> {
    println!("4. Typed structs in postcard envelopes...\n");

    let old = VersionedCodec::new(1, Postcard).serialize_value(&ReadingV1 { celsius: 25.0 })?;
    println!("   v1 envelope: {} bytes", old.len());

    let codec = VersionedCodec::builder(2, Postcard)
        .migration(2, add_fahrenheit)
        .observer(|from: u32, to: u32| println!("   applied v{from} -> v{to}"))
        .build()?;

    let reading: ReadingV2 = codec.deserialize_value(&old)?;
    println!("   Migrated: {reading:?}");
    assert_eq!(reading.fahrenheit, 77.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_is_derived_from_celsius() {
        let v1 = postcard::to_allocvec(&ReadingV1 { celsius: 25.0 }).unwrap();
        let v2: ReadingV2 = postcard::from_bytes(&add_fahrenheit(v1)).unwrap();
        assert_eq!(v2.celsius, 25.0);
        assert_eq!(v2.fahrenheit, 77.0);
    }

    #[test]
    #[should_panic(expected = "v1 reading")]
    fn malformed_reading_is_not_passed_through() {
        add_fahrenheit(Vec::new());
    }
}
