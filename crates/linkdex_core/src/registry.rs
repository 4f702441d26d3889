//! Registry of indices by type and attribute.

use crate::index::{normalize_field, Index};
use std::collections::HashMap;

/// Indices registered for one attribute, in registration order.
#[derive(Debug)]
pub struct FieldIndices {
    field: String,
    indices: Vec<Box<dyn Index>>,
}

impl FieldIndices {
    /// Attribute name in its normalised routing form.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Indices bound to the attribute.
    #[must_use]
    pub fn indices(&self) -> &[Box<dyn Index>] {
        &self.indices
    }
}

/// Two-level mapping `type name -> attribute -> indices`.
///
/// Populated at configuration time through `&mut self`; afterwards it is only
/// read. Attributes keep registration order so fan-out is deterministic.
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<String, Vec<FieldIndices>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `index` to the bucket for its type and attribute.
    ///
    /// Attribute names are matched in normalised form, so `"email"` and
    /// `"Email"` share a bucket.
    pub fn register(&mut self, index: Box<dyn Index>) {
        let field = normalize_field(index.index_by());
        let fields = self.types.entry(index.type_name().to_string()).or_default();
        match fields.iter_mut().find(|f| f.field == field) {
            Some(bucket) => bucket.indices.push(index),
            None => fields.push(FieldIndices {
                field,
                indices: vec![index],
            }),
        }
    }

    /// Indices for a type and attribute. Empty if none are registered.
    #[must_use]
    pub fn get(&self, type_name: &str, field: &str) -> &[Box<dyn Index>] {
        let field = normalize_field(field);
        self.types
            .get(type_name)
            .and_then(|fields| fields.iter().find(|f| f.field == field))
            .map(|f| f.indices.as_slice())
            .unwrap_or(&[])
    }

    /// Every attribute registered for a type.
    #[must_use]
    pub fn fields(&self, type_name: &str) -> &[FieldIndices] {
        self.types.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over every registered index.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Index> {
        self.types
            .values()
            .flatten()
            .flat_map(|f| f.indices.iter())
            .map(|idx| idx.as_ref())
    }

    /// Total number of registered indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexKind, IndexSpec, NonUniqueIndex, UniqueIndex};
    use std::path::Path;

    fn spec(type_name: &str, field: &str) -> IndexSpec {
        IndexSpec::new(type_name, field, "/files", Path::new("/index"))
    }

    #[test]
    fn routing() {
        let mut registry = Registry::new();
        registry.register(Box::new(UniqueIndex::new(spec("User", "Email"))));
        registry.register(Box::new(NonUniqueIndex::new(spec("User", "DisplayName"))));
        registry.register(Box::new(NonUniqueIndex::new(spec("Pet", "Color"))));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.type_names(), vec!["Pet", "User"]);
        assert_eq!(registry.get("User", "Email")[0].kind(), IndexKind::Unique);
        assert!(registry.get("User", "Color").is_empty());
        assert!(registry.get("Group", "Email").is_empty());

        let fields: Vec<_> = registry.fields("User").iter().map(|f| f.field()).collect();
        assert_eq!(fields, vec!["Email", "DisplayName"]);
    }

    #[test]
    fn same_field_appends() {
        let mut registry = Registry::new();
        registry.register(Box::new(UniqueIndex::new(spec("User", "Email"))));
        registry.register(Box::new(NonUniqueIndex::new(spec("User", "email"))));

        let indices = registry.get("User", "Email");
        assert_eq!(indices.len(), 2);
        assert_eq!(indices[1].kind(), IndexKind::NonUnique);
        assert_eq!(indices[1].index_by(), "email");
        assert_eq!(registry.fields("User").len(), 1);
        assert_eq!(registry.get("User", "email").len(), 2);
    }

    #[test]
    fn clear() {
        let mut registry = Registry::new();
        registry.register(Box::new(UniqueIndex::new(spec("User", "Email"))));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
