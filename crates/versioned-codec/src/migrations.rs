use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::registry::Transform;

/// An ordered list of declared migrations, keyed by the version they produce.
///
/// This is the configuration value handed to
/// [`VersionedCodec::with_migrations`](crate::VersionedCodec::with_migrations)
/// or a [`CodecBuilder`](crate::CodecBuilder). Each `(to, transform)` pair is
/// replayed into the registry as the step out of `to - 1`.
///
/// # Example
///
/// ```
/// use versioned_codec::{Json, Migrations, VersionedCodec};
/// use serde_json::json;
///
/// let migrations = Migrations::new()
///     .declare(2, |mut data: serde_json::Value| {
///         data["tags"] = json!([]);
///         data
///     });
///
/// let codec = VersionedCodec::with_migrations(2, Json, migrations).unwrap();
/// assert_eq!(codec.registry().versions(), vec![(1, 2)]);
/// ```
pub struct Migrations<P> {
    declared: Vec<(u32, Transform<P>)>,
}

impl<P> Migrations<P> {
    /// An empty list.
    pub fn new() -> Self {
        Self {
            declared: Vec::new(),
        }
    }

    /// Declare the transform producing version `to`.
    pub fn declare<F>(mut self, to: u32, transform: F) -> Self
    where
        F: Fn(P) -> P + Send + Sync + 'static,
    {
        self.push(to, transform);
        self
    }

    /// Declare the transform producing version `to` in place.
    pub fn push<F>(&mut self, to: u32, transform: F)
    where
        F: Fn(P) -> P + Send + Sync + 'static,
    {
        self.declared.push((to, Box::new(transform)));
    }

    /// Append every declaration from `other`, keeping order.
    pub fn extend(&mut self, other: Migrations<P>) {
        self.declared.extend(other.declared);
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Target versions in declaration order.
    pub fn targets(&self) -> Vec<u32> {
        self.declared.iter().map(|(to, _)| *to).collect()
    }
}

impl<P> Default for Migrations<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> IntoIterator for Migrations<P> {
    type Item = (u32, Transform<P>);
    type IntoIter = alloc::vec::IntoIter<(u32, Transform<P>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.declared.into_iter()
    }
}

impl<P> fmt::Debug for Migrations<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrations")
            .field("targets", &self.targets())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let mut migrations = Migrations::new()
            .declare(3, |n: u32| n + 1)
            .declare(2, |n: u32| n * 2);
        migrations.extend(Migrations::new().declare(4, |n: u32| n));

        assert_eq!(migrations.len(), 3);
        assert_eq!(migrations.targets(), alloc::vec![3, 2, 4]);
    }

    #[test]
    fn yields_boxed_transforms() {
        let migrations = Migrations::new().declare(2, |n: u32| n * 10);
        let (to, transform) = migrations.into_iter().next().unwrap();
        assert_eq!(to, 2);
        assert_eq!(transform(4), 40);
    }
}
