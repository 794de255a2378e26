use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};

/// A migration step advancing a payload from version `v` to `v + 1`.
///
/// Steps must be **pure and deterministic**: two processes migrating the same
/// payload must produce identical results. A step is total over payloads of
/// its source version; a step that cannot convert its input is a bug in the
/// step, not a migration failure.
pub type Transform<P> = Box<dyn Fn(P) -> P + Send + Sync>;

/// Maps a source version to the single transform leaving it.
///
/// At most one transform is kept per source version; registering again for
/// the same version replaces the previous transform.
pub struct MigrationRegistry<P> {
    steps: BTreeMap<u32, Transform<P>>,
}

impl<P> MigrationRegistry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Store `transform` as the step out of `from`, bounded by `current`.
    ///
    /// Fails with [`Error::InvalidMigrationRange`] unless
    /// `1 <= from < from + 1 <= current`.
    pub fn register(&mut self, current: u32, from: u32, transform: Transform<P>) -> Result<()> {
        check_range(from, current)?;
        if self.steps.insert(from, transform).is_some() {
            tracing::debug!(from, "replaced existing migration step");
        }
        Ok(())
    }

    /// The step out of `from`, if one is registered.
    pub fn lookup(&self, from: u32) -> Option<&Transform<P>> {
        self.steps.get(&from)
    }

    /// Whether a step out of `from` is registered.
    pub fn contains(&self, from: u32) -> bool {
        self.steps.contains_key(&from)
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All registered steps as `(from, to)` pairs in ascending order.
    pub fn versions(&self) -> Vec<(u32, u32)> {
        self.steps.keys().map(|&from| (from, from + 1)).collect()
    }

    /// Check that every step from `min_version` up to `current` exists.
    ///
    /// Reports the lowest missing source version.
    pub fn validate_chain(&self, min_version: u32, current: u32) -> Result<()> {
        match (min_version..current).find(|v| !self.contains(*v)) {
            Some(version) => Err(Error::MissingMigration { version, current }),
            None => Ok(()),
        }
    }

    /// Check that every registered step still fits under `current`.
    ///
    /// Reports the lowest offending step.
    pub fn check_bounds(&self, current: u32) -> Result<()> {
        self.steps
            .keys()
            .try_for_each(|&from| check_range(from, current))
    }
}

impl<P> Default for MigrationRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for MigrationRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("steps", &self.versions())
            .finish()
    }
}

fn check_range(from: u32, current: u32) -> Result<()> {
    match from.checked_add(1) {
        Some(to) if from >= 1 && from < current && to <= current => Ok(()),
        _ => Err(Error::InvalidMigrationRange {
            from,
            to: from.saturating_add(1),
            current,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn suffix(s: &'static str) -> Transform<String> {
        Box::new(move |mut data: String| {
            data.push_str(s);
            data
        })
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = MigrationRegistry::new();
        registry.register(3, 1, suffix("+v2")).unwrap();

        let step = registry.lookup(1).unwrap();
        assert_eq!(step(String::from("v1")), "v1+v2");
        assert!(registry.lookup(2).is_none());
    }

    #[test]
    fn bounds_against_current() {
        let mut registry = MigrationRegistry::new();
        assert_eq!(
            registry.register(3, 3, suffix("")).unwrap_err(),
            Error::InvalidMigrationRange {
                from: 3,
                to: 4,
                current: 3
            }
        );
        assert_eq!(
            registry.register(3, 0, suffix("")).unwrap_err(),
            Error::InvalidMigrationRange {
                from: 0,
                to: 1,
                current: 3
            }
        );
        assert!(registry.register(3, 2, suffix("")).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn overflowing_source_is_rejected() {
        let mut registry = MigrationRegistry::new();
        assert!(matches!(
            registry.register(u32::MAX, u32::MAX, suffix("")),
            Err(Error::InvalidMigrationRange { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = MigrationRegistry::new();
        registry.register(2, 1, suffix("+first")).unwrap();
        registry.register(2, 1, suffix("+second")).unwrap();

        assert_eq!(registry.len(), 1);
        let step = registry.lookup(1).unwrap();
        assert_eq!(step(String::new()), "+second");
    }

    #[test]
    fn versions_sorted_by_source() {
        let mut registry = MigrationRegistry::new();
        registry.register(4, 3, suffix("")).unwrap();
        registry.register(4, 1, suffix("")).unwrap();
        registry.register(4, 2, suffix("")).unwrap();

        assert_eq!(registry.versions(), alloc::vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn validate_chain_reports_first_gap() {
        let mut registry = MigrationRegistry::new();
        registry.register(4, 1, suffix("")).unwrap();
        registry.register(4, 3, suffix("")).unwrap();

        assert_eq!(
            registry.validate_chain(1, 4).unwrap_err(),
            Error::MissingMigration {
                version: 2,
                current: 4
            }
        );
        assert!(registry.validate_chain(3, 4).is_ok());
        assert!(registry.validate_chain(4, 4).is_ok());
    }

    #[test]
    fn check_bounds_after_lowering_current() {
        let mut registry = MigrationRegistry::new();
        registry.register(4, 1, suffix("")).unwrap();
        registry.register(4, 3, suffix("")).unwrap();

        assert!(registry.check_bounds(4).is_ok());
        assert!(registry.check_bounds(10).is_ok());
        assert_eq!(
            registry.check_bounds(3).unwrap_err(),
            Error::InvalidMigrationRange {
                from: 3,
                to: 4,
                current: 3
            }
        );
    }
}
