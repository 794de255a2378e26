use serde::{Deserialize, Serialize};

/// The persisted unit: a payload tagged with the schema version it was
/// written under.
///
/// Encoded with exactly two named fields. The JSON rendition is:
///
/// ```text
/// {"version": 1, "data": {"name": "John Doe", "age": 30}}
/// ```
///
/// # Example
///
/// ```
/// use versioned_codec::Envelope;
///
/// let envelope = Envelope::new(2, "payload");
/// assert_eq!(envelope.version, 2);
/// assert_eq!(envelope.data, "payload");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<P> {
    /// Schema version of `data`.
    pub version: u32,
    /// Payload shaped for `version`.
    pub data: P,
}

impl<P> Envelope<P> {
    /// Create a new envelope.
    pub fn new(version: u32, data: P) -> Self {
        Self { version, data }
    }

    /// Split into `(version, data)`.
    pub fn into_parts(self) -> (u32, P) {
        (self.version, self.data)
    }
}
