use alloc::string::String;

use thiserror::Error;

/// Error raised by registration, encoding, decoding or migration.
///
/// Every variant carries the versions involved so the failure can be acted
/// on without re-reading the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A migration's bounds fall outside `[1, current]` or do not move forward.
    #[error("invalid migration v{from}→v{to}: versions must increase within [1, v{current}]")]
    InvalidMigrationRange { from: u32, to: u32, current: u32 },
    /// The bytes are not a well-formed `{ version, data }` envelope.
    #[error("decode error: {0}")]
    Decode(String),
    /// The wire format could not encode the envelope or payload.
    #[error("encode error: {0}")]
    Encode(String),
    /// The stored version is newer than the codec understands.
    #[error("data version v{found} is newer than current v{current}")]
    FutureVersion { found: u32, current: u32 },
    /// The forward walk needed a transform that was never registered.
    #[error("missing migration step out of v{version} (current v{current})")]
    MissingMigration { version: u32, current: u32 },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_versions() {
        let err = Error::MissingMigration {
            version: 1,
            current: 3,
        };
        assert_eq!(err.to_string(), "missing migration step out of v1 (current v3)");

        let err = Error::FutureVersion {
            found: 5,
            current: 3,
        };
        assert_eq!(err.to_string(), "data version v5 is newer than current v3");

        let err = Error::InvalidMigrationRange {
            from: 3,
            to: 4,
            current: 3,
        };
        assert_eq!(
            err.to_string(),
            "invalid migration v3→v4: versions must increase within [1, v3]"
        );
    }
}
