//! Indexer facade over multiple indices.
//!
//! The [`Indexer`] owns the registry and the root paths. Documents are stored
//! elsewhere; after persisting one, the caller hands it to [`Indexer::add`]
//! which links it into every index registered for its type:
//!
//! ```text
//! <data_dir>/<entity_dir>/<primary key>                 # owned by the caller
//! <data_dir>/<index_root>/<Type>By<Attr>/...            # owned by the indexer
//! ```
//!
//! Writers for one type are serialised by a named lock; readers of the same
//! type share it.

use crate::config::{IndexDefinition, IndexerConfig};
use crate::document::Document;
use crate::error::{IndexError, IndexResult};
use crate::index::{self, normalize_field, Bound, Index, IndexKind, IndexSpec};
use crate::registry::{FieldIndices, Registry};
use crate::sync::NamedLocks;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of linking one attribute in [`Indexer::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAddResult {
    /// Attribute that was indexed.
    pub field: String,
    /// Value as stored (case-folded, or the assigned autoincrement number).
    pub value: String,
    /// Created symlink.
    pub path: PathBuf,
}

/// An attribute name and value to query by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Attribute name.
    pub name: String,
    /// Value to match.
    pub value: String,
}

impl Field {
    /// Creates a query field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Facade to configure and query multiple indices.
#[derive(Debug)]
pub struct Indexer {
    data_dir: PathBuf,
    index_root: PathBuf,
    registry: Registry,
    locks: NamedLocks,
}

impl Indexer {
    /// Creates an indexer with no indices.
    ///
    /// Index trees live in `data_dir/index_root_dir_name`.
    pub fn new(data_dir: impl Into<PathBuf>, index_root_dir_name: &str) -> Self {
        let data_dir = data_dir.into();
        let index_root = data_dir.join(index_root_dir_name);
        Self {
            data_dir,
            index_root,
            registry: Registry::new(),
            locks: NamedLocks::new(),
        }
    }

    /// Creates an indexer and initialises every index in `config`, in order.
    pub fn from_config(config: &IndexerConfig) -> IndexResult<Self> {
        config.validate()?;
        let mut indexer = Self::new(&config.data_dir, &config.index_root_dir_name);
        for definition in &config.indices {
            indexer.add_index(definition)?;
        }
        Ok(indexer)
    }

    /// Root directory holding documents and index trees.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the index trees.
    #[must_use]
    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    /// Registered indices.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds, initialises and registers an index.
    ///
    /// Nothing is registered if initialisation fails.
    pub fn add_index(&mut self, definition: &IndexDefinition) -> IndexResult<()> {
        definition.validate()?;
        let mut spec = IndexSpec::new(
            definition.type_name.as_str(),
            &definition.index_by,
            self.data_dir.join(&definition.entity_dir),
            &self.index_root,
        );
        if definition.case_insensitive {
            spec = spec.case_insensitive();
        }
        let index = index::build(definition.kind, spec, definition.bound);
        self.register(index)
    }

    /// Initialises and registers an already built index.
    pub fn register(&mut self, index: Box<dyn Index>) -> IndexResult<()> {
        index.init()?;
        debug!(
            type_name = index.type_name(),
            index_by = index.index_by(),
            kind = %index.kind(),
            root = %index.index_root_dir().display(),
            "index registered"
        );
        self.registry.register(index);
        Ok(())
    }

    /// Adds a unique index on `index_by` for documents in `entity_dir`.
    pub fn add_unique_index(
        &mut self,
        type_name: &str,
        index_by: &str,
        entity_dir: &str,
    ) -> IndexResult<()> {
        self.add_index(&IndexDefinition::new(
            type_name,
            index_by,
            entity_dir,
            IndexKind::Unique,
        ))
    }

    /// Adds a non-unique index on `index_by` for documents in `entity_dir`.
    pub fn add_non_unique_index(
        &mut self,
        type_name: &str,
        index_by: &str,
        entity_dir: &str,
    ) -> IndexResult<()> {
        self.add_index(&IndexDefinition::new(
            type_name,
            index_by,
            entity_dir,
            IndexKind::NonUnique,
        ))
    }

    /// Adds an autoincrement index on `index_by` for documents in `entity_dir`.
    pub fn add_autoincrement_index(
        &mut self,
        type_name: &str,
        index_by: &str,
        entity_dir: &str,
        bound: Option<Bound>,
    ) -> IndexResult<()> {
        let mut definition =
            IndexDefinition::new(type_name, index_by, entity_dir, IndexKind::Autoincrement);
        definition.bound = bound;
        self.add_index(&definition)
    }

    /// Indices registered for a type and attribute.
    pub fn indices(&self, type_name: &str, key: &str) -> IndexResult<&[Box<dyn Index>]> {
        let key = normalize_field(key);
        let indices = self.registry.get(type_name, &key);
        if indices.is_empty() {
            return Err(IndexError::NoIndex {
                type_name: type_name.to_string(),
                key,
            });
        }
        Ok(indices)
    }

    /// Links `entity` under `primary_key` into every index of its type.
    ///
    /// Stops at the first failing index. Links created before the failure
    /// stay in place; reconciling them is up to the caller.
    pub fn add<D: Document + ?Sized>(
        &self,
        primary_key: &str,
        entity: &D,
    ) -> IndexResult<Vec<IndexAddResult>> {
        let type_name = entity.type_name();
        self.locks.write(type_name, || {
            let mut results = Vec::new();
            for field in self.registry.fields(type_name) {
                let value = attribute(entity, field)?;
                for idx in field.indices() {
                    if let Some(entry) = idx.add(primary_key, &value)? {
                        results.push(IndexAddResult {
                            field: field.field().to_string(),
                            value: entry.value,
                            path: entry.path,
                        });
                    }
                }
            }
            debug!(type_name, primary_key, links = results.len(), "document indexed");
            Ok(results)
        })
    }

    /// Returns the primary key stored for `value` under `key`.
    ///
    /// Indices registered for `(type_name, key)` are tried in order; the first
    /// hit wins. `Ok(None)` means every index reported the value missing,
    /// `Err(NoIndex)` that nothing is registered to ask.
    pub fn find(&self, type_name: &str, key: &str, value: &str) -> IndexResult<Option<String>> {
        let indices = self.indices(type_name, key)?;
        self.locks.read(type_name, || {
            for idx in indices {
                match idx.lookup(value) {
                    Ok(ids) => {
                        if let Some(id) = ids.into_iter().next() {
                            return Ok(Some(id));
                        }
                    }
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(None)
        })
    }

    /// Primary keys matching any of `fields`, de-duplicated and sorted.
    pub fn find_by(&self, type_name: &str, fields: &[Field]) -> IndexResult<Vec<String>> {
        let mut found = BTreeSet::new();
        for field in fields {
            let indices = self.indices(type_name, &field.name)?;
            self.locks.read(type_name, || -> IndexResult<()> {
                for idx in indices {
                    match idx.lookup(&field.value) {
                        Ok(ids) => found.extend(ids),
                        Err(e) if e.is_not_found() => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            })?;
        }
        Ok(found.into_iter().collect())
    }

    /// Primary keys whose `key` value matches the glob `pattern`.
    pub fn find_by_partial(
        &self,
        type_name: &str,
        key: &str,
        pattern: &str,
    ) -> IndexResult<Vec<String>> {
        let indices = self.indices(type_name, key)?;
        self.locks.read(type_name, || {
            let mut found = BTreeSet::new();
            for idx in indices {
                match idx.search(pattern) {
                    Ok(paths) => found.extend(paths.iter().map(|p| index::file_name(p))),
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(found.into_iter().collect())
        })
    }

    /// Moves the links of `primary_key` from the values in `from` to those in
    /// `to`.
    ///
    /// Unchanged attributes are skipped, an attribute gaining a value is
    /// added, one losing its value is removed.
    pub fn update<D: Document + ?Sized>(
        &self,
        primary_key: &str,
        from: &D,
        to: &D,
    ) -> IndexResult<()> {
        let type_name = from.type_name();
        if type_name != to.type_name() {
            return Err(IndexError::TypeMismatch {
                from: type_name.to_string(),
                to: to.type_name().to_string(),
            });
        }
        self.locks.write(type_name, || {
            for field in self.registry.fields(type_name) {
                let old_value = attribute(from, field)?;
                let new_value = attribute(to, field)?;
                if old_value == new_value {
                    continue;
                }
                for idx in field.indices() {
                    if old_value.is_empty() {
                        idx.add(primary_key, &new_value)?;
                    } else if new_value.is_empty() {
                        idx.remove(primary_key, &old_value)?;
                    } else {
                        idx.update(primary_key, &old_value, &new_value)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Removes the links of `entity` under `primary_key` from every index of
    /// its type.
    pub fn delete<D: Document + ?Sized>(&self, primary_key: &str, entity: &D) -> IndexResult<()> {
        let type_name = entity.type_name();
        self.locks.write(type_name, || {
            for field in self.registry.fields(type_name) {
                let value = attribute(entity, field)?;
                for idx in field.indices() {
                    idx.remove(primary_key, &value)?;
                }
            }
            Ok(())
        })
    }

    /// Removes every link of `primary_key` from every index of `type_name`
    /// without knowing the indexed values. Returns how many links went.
    pub fn delete_by_key(&self, type_name: &str, primary_key: &str) -> IndexResult<usize> {
        self.locks.write(type_name, || {
            let mut removed = 0;
            for field in self.registry.fields(type_name) {
                for idx in field.indices() {
                    removed += idx.purge(primary_key)?;
                }
            }
            debug!(type_name, primary_key, removed, "document unindexed");
            Ok(removed)
        })
    }

    /// Deletes every index tree and forgets every registration.
    pub fn reset(&mut self) -> IndexResult<()> {
        for idx in self.registry.iter() {
            idx.delete()?;
        }
        self.registry.clear();
        Ok(())
    }
}

/// Extracts the value for `field`, trying each index's registered name before
/// the normalised one.
fn attribute<D: Document + ?Sized>(entity: &D, field: &FieldIndices) -> IndexResult<String> {
    field
        .indices()
        .iter()
        .map(|idx| idx.index_by())
        .chain(std::iter::once(field.field()))
        .find_map(|name| entity.attribute(name))
        .ok_or_else(|| IndexError::UnknownAttribute {
            type_name: entity.type_name().to_string(),
            key: field.field().to_string(),
        })
}
