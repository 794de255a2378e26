//! # versioned-codec
//!
//! Versioned envelopes with transparent, chained schema migrations.
//!
//! Data is written as an envelope `{ version, data }` tagged with the schema
//! version current code understands. When older data is read back, the codec
//! replays the registered migration steps one version at a time until the
//! payload has the current shape.
//!
//! ## How It Works
//!
//! 1. A [`VersionedCodec`] is created with the version current code writes.
//! 2. One pure transform is registered per version step (`v → v + 1`), either
//!    directly or through a declared [`Migrations`] list.
//! 3. [`VersionedCodec::serialize`] stamps payloads with the current version.
//! 4. [`VersionedCodec::deserialize`] decodes an envelope and, if it is older,
//!    runs the chain `stored → … → current`.
//!
//! ## Key Concepts
//!
//! - **Linear chain**: steps run v1→v2→v3→...→current, never skipping one.
//! - **Fail fast**: a missing step fails before any transform runs; data from
//!   a newer version is rejected rather than truncated.
//! - **Swappable encoding**: [`Json`] for self-describing text, [`Postcard`]
//!   for compact binary, or any [`WireFormat`].
//! - **No globals**: each codec owns its registry; configuration is passed in.
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::{json, Value};
//! use versioned_codec::{Json, VersionedCodec};
//!
//! let codec = VersionedCodec::builder(2, Json)
//!     .migration(2, |mut data: Value| {
//!         data["email"] = json!(null);
//!         data
//!     })
//!     .build()
//!     .unwrap();
//!
//! let old = br#"{"version":1,"data":{"name":"Ada"}}"#;
//! assert_eq!(
//!     codec.deserialize(old).unwrap(),
//!     json!({"name": "Ada", "email": null})
//! );
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod codec;
mod envelope;
mod error;
mod format;
mod migrations;
mod observer;
mod registry;
mod versioned;

pub use codec::{CodecBuilder, VersionedCodec};
pub use envelope::Envelope;
pub use error::{Error, Result};
#[cfg(feature = "json")]
pub use format::Json;
#[cfg(feature = "postcard")]
pub use format::Postcard;
pub use format::{TypedPayload, WireFormat};
pub use migrations::Migrations;
pub use observer::MigrationObserver;
pub use registry::{MigrationRegistry, Transform};
pub use versioned::{Versioned, VersionedSchema};
