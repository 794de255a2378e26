use crate::error::Error;

/// Optional hook notified while a codec migrates payloads.
///
/// Both methods default to doing nothing. Any `Fn(u32, u32)` closure is an
/// observer that only watches applied steps.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use versioned_codec::{Json, VersionedCodec};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let codec = VersionedCodec::builder(2, Json)
///     .migration(2, |data| data)
///     .observer(move |from: u32, to: u32| sink.lock().unwrap().push((from, to)))
///     .build()
///     .unwrap();
///
/// codec.deserialize(br#"{"version":1,"data":null}"#).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![(1, 2)]);
/// ```
pub trait MigrationObserver: Send + Sync {
    /// A transform moved a payload from `from` to `to`.
    fn on_step(&self, from: u32, to: u32) {
        let _ = (from, to);
    }

    /// Decoding or migration failed with `error`.
    fn on_rejected(&self, error: &Error) {
        let _ = error;
    }
}

impl<F> MigrationObserver for F
where
    F: Fn(u32, u32) + Send + Sync,
{
    fn on_step(&self, from: u32, to: u32) {
        self(from, to)
    }
}
