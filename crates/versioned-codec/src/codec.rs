use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::format::{TypedPayload, WireFormat};
use crate::migrations::Migrations;
use crate::observer::MigrationObserver;
use crate::registry::{MigrationRegistry, Transform};

/// Serializes payloads into versioned envelopes and migrates older envelopes
/// forward on read.
///
/// A codec owns the version it currently writes and the registry of steps
/// that lead up to it. When an envelope at version N is read by a codec at
/// version M (N < M), the steps N→N+1, N+1→N+2, ..., M-1→M run in sequence.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use versioned_codec::{Json, VersionedCodec};
///
/// let mut codec = VersionedCodec::new(2, Json);
/// codec
///     .register(1, |mut data: serde_json::Value| {
///         data["humidity"] = json!(null);
///         data
///     })
///     .unwrap();
///
/// let v1 = br#"{"version":1,"data":{"temperature":22.5}}"#;
/// let v2 = codec.deserialize(v1).unwrap();
/// assert_eq!(v2, json!({"temperature": 22.5, "humidity": null}));
/// ```
pub struct VersionedCodec<F: WireFormat> {
    current_version: u32,
    registry: MigrationRegistry<F::Payload>,
    format: F,
    observer: Option<Box<dyn MigrationObserver>>,
}

impl<F: WireFormat> VersionedCodec<F> {
    /// Create a codec writing `current_version`, with no migrations.
    pub fn new(current_version: u32, format: F) -> Self {
        Self {
            current_version,
            registry: MigrationRegistry::new(),
            format,
            observer: None,
        }
    }

    /// Create a codec and register every declared migration.
    ///
    /// Declarations are replayed in order; the first one out of range aborts
    /// construction.
    pub fn with_migrations(
        current_version: u32,
        format: F,
        migrations: Migrations<F::Payload>,
    ) -> Result<Self> {
        let mut codec = Self::new(current_version, format);
        for (to, transform) in migrations {
            codec.declare_boxed(to, transform)?;
        }
        Ok(codec)
    }

    /// Start a builder for a codec writing `current_version`.
    pub fn builder(current_version: u32, format: F) -> CodecBuilder<F> {
        CodecBuilder {
            current_version,
            format,
            migrations: Migrations::new(),
            observer: None,
        }
    }

    /// The schema version this codec writes.
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Change the version this codec writes.
    ///
    /// Every registered step is checked against `version` first. If any step
    /// would no longer fit, the codec is left unchanged and the lowest
    /// offending step is reported as [`Error::InvalidMigrationRange`].
    pub fn set_current_version(&mut self, version: u32) -> Result<()> {
        self.registry.check_bounds(version)?;
        tracing::debug!(
            from = self.current_version,
            to = version,
            "current schema version changed"
        );
        self.current_version = version;
        Ok(())
    }

    /// Register the step advancing payloads out of version `from`.
    ///
    /// Fails with [`Error::InvalidMigrationRange`] unless
    /// `1 <= from < current_version`. Registering again for the same `from`
    /// replaces the earlier step.
    pub fn register<T>(&mut self, from: u32, transform: T) -> Result<()>
    where
        T: Fn(F::Payload) -> F::Payload + Send + Sync + 'static,
    {
        self.register_boxed(from, Box::new(transform))
    }

    /// Register the step producing version `to`, i.e. the step out of `to - 1`.
    pub fn declare<T>(&mut self, to: u32, transform: T) -> Result<()>
    where
        T: Fn(F::Payload) -> F::Payload + Send + Sync + 'static,
    {
        self.declare_boxed(to, Box::new(transform))
    }

    fn declare_boxed(&mut self, to: u32, transform: Transform<F::Payload>) -> Result<()> {
        let from = to.checked_sub(1).ok_or(Error::InvalidMigrationRange {
            from: 0,
            to,
            current: self.current_version,
        })?;
        self.register_boxed(from, transform)
    }

    fn register_boxed(&mut self, from: u32, transform: Transform<F::Payload>) -> Result<()> {
        self.registry
            .register(self.current_version, from, transform)?;
        tracing::debug!(
            from,
            to = from + 1,
            current = self.current_version,
            "registered migration step"
        );
        Ok(())
    }

    /// Install or replace the observer.
    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: MigrationObserver + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// The registry of steps.
    pub fn registry(&self) -> &MigrationRegistry<F::Payload> {
        &self.registry
    }

    /// The wire format.
    pub fn format(&self) -> &F {
        &self.format
    }

    /// Whether data stored at `stored_version` must be migrated.
    pub fn needs_migration(&self, stored_version: u32) -> bool {
        stored_version != self.current_version
    }

    /// Check that data as old as `min_version` can be migrated to current.
    pub fn validate_chain(&self, min_version: u32) -> Result<()> {
        self.registry
            .validate_chain(min_version, self.current_version)
    }

    /// Wrap `payload` with the current version and encode it.
    ///
    /// The payload's shape is not checked.
    pub fn serialize(&self, payload: &F::Payload) -> Result<Vec<u8>> {
        self.format.encode(self.current_version, payload)
    }

    /// Decode an envelope and migrate its payload to the current version.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<F::Payload> {
        let envelope = self.format.decode(bytes).map_err(|e| self.reject(e))?;
        self.migrate(envelope.version, envelope.data)
    }

    /// Read the version tag of an envelope without migrating it.
    pub fn peek_version(&self, bytes: &[u8]) -> Result<u32> {
        self.format.peek_version(bytes).map_err(|e| self.reject(e))
    }

    /// Migrate a payload stored at `stored_version` to the current version.
    ///
    /// - Equal versions return `payload` untouched without running any step.
    /// - A newer stored version fails with [`Error::FutureVersion`].
    /// - Otherwise the whole chain is resolved before any step runs; the first
    ///   gap fails with [`Error::MissingMigration`] and nothing is applied.
    pub fn migrate(&self, stored_version: u32, payload: F::Payload) -> Result<F::Payload> {
        let current = self.current_version;

        if stored_version == current {
            tracing::trace!(version = current, "payload already current");
            return Ok(payload);
        }

        if stored_version > current {
            return Err(self.reject(Error::FutureVersion {
                found: stored_version,
                current,
            }));
        }

        let steps = self.plan(stored_version).map_err(|e| self.reject(e))?;

        tracing::debug!(
            from = stored_version,
            to = current,
            steps = steps.len(),
            "migrating payload"
        );

        let mut payload = payload;
        for (from, step) in (stored_version..).zip(steps) {
            payload = step(payload);
            tracing::trace!(from, to = from + 1, "applied migration step");
            if let Some(observer) = &self.observer {
                observer.on_step(from, from + 1);
            }
        }

        Ok(payload)
    }

    fn plan(&self, stored_version: u32) -> Result<Vec<&Transform<F::Payload>>> {
        (stored_version..self.current_version)
            .map(|version| {
                self.registry
                    .lookup(version)
                    .ok_or(Error::MissingMigration {
                        version,
                        current: self.current_version,
                    })
            })
            .collect()
    }

    fn reject(&self, error: Error) -> Error {
        tracing::debug!(%error, "envelope rejected");
        if let Some(observer) = &self.observer {
            observer.on_rejected(&error);
        }
        error
    }
}

impl<F: TypedPayload> VersionedCodec<F> {
    /// Serialize a typed value at the current version.
    pub fn serialize_value<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let payload = self.format.to_payload(value)?;
        self.serialize(&payload)
    }

    /// Deserialize, migrate, and convert the payload into `T`.
    pub fn deserialize_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let payload = self.deserialize(bytes)?;
        self.format.from_payload(payload).map_err(|e| self.reject(e))
    }
}

impl<F: WireFormat + fmt::Debug> fmt::Debug for VersionedCodec<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedCodec")
            .field("current_version", &self.current_version)
            .field("registry", &self.registry)
            .field("format", &self.format)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Builder fixing the current version before any migration is registered.
///
/// ```
/// use versioned_codec::{Json, VersionedCodec};
///
/// let codec = VersionedCodec::builder(3, Json)
///     .migration(2, |data| data)
///     .migration(3, |data| data)
///     .build()
///     .unwrap();
///
/// assert!(codec.validate_chain(1).is_ok());
/// ```
pub struct CodecBuilder<F: WireFormat> {
    current_version: u32,
    format: F,
    migrations: Migrations<F::Payload>,
    observer: Option<Box<dyn MigrationObserver>>,
}

impl<F: WireFormat> CodecBuilder<F> {
    /// Declare the transform producing version `to`.
    pub fn migration<T>(mut self, to: u32, transform: T) -> Self
    where
        T: Fn(F::Payload) -> F::Payload + Send + Sync + 'static,
    {
        self.migrations.push(to, transform);
        self
    }

    /// Append a list of declared migrations.
    pub fn migrations(mut self, migrations: Migrations<F::Payload>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Install an observer.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: MigrationObserver + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Build the codec, registering every declared migration.
    pub fn build(self) -> Result<VersionedCodec<F>> {
        let mut codec =
            VersionedCodec::with_migrations(self.current_version, self.format, self.migrations)?;
        codec.observer = self.observer;
        Ok(codec)
    }
}
