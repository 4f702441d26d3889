//! Index contract and per-index specification.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// On-disk representation of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// One symlink per value.
    Unique,
    /// One directory per value, one symlink per document inside it.
    NonUnique,
    /// Unique numeric values, assigned on demand.
    Autoincrement,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unique => "unique",
            Self::NonUnique => "non_unique",
            Self::Autoincrement => "autoincrement",
        };
        f.write_str(s)
    }
}

/// Normalises an attribute name for routing, so `"email"` and `"Email"`
/// address the same index.
///
/// The first letter and every letter following `_`, `-` or a space are
/// upper-cased and the separators dropped. Everything else is kept, so
/// acronyms such as `"ID"` or `"GIDNumber"` survive unchanged.
#[must_use]
pub fn normalize_field(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if matches!(c, '_' | '-' | ' ') {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Binding of one index to a type, an attribute and two directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Entity type the index belongs to.
    pub type_name: String,
    /// Attribute the index is keyed by, as registered.
    pub index_by: String,
    /// Directory holding the documents, one entry per primary key.
    pub files_dir: PathBuf,
    /// Root of this index's symlink tree, `<root>/<Type>By<Attr>`.
    pub index_root_dir: PathBuf,
    /// Whether values are lower-cased before touching the filesystem.
    pub case_insensitive: bool,
}

impl IndexSpec {
    /// Creates a spec whose tree lives under `index_root`.
    ///
    /// The directory name keeps `index_by` exactly as given.
    pub fn new(
        type_name: impl Into<String>,
        index_by: impl Into<String>,
        files_dir: impl Into<PathBuf>,
        index_root: &Path,
    ) -> Self {
        let type_name = type_name.into();
        let index_by = index_by.into();
        let index_root_dir = index_root.join(format!("{type_name}By{index_by}"));
        Self {
            type_name,
            index_by,
            files_dir: files_dir.into(),
            index_root_dir,
            case_insensitive: false,
        }
    }

    /// Makes this index case-insensitive.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Applies case folding if configured.
    #[must_use]
    pub fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(value.to_lowercase())
        } else {
            Cow::Borrowed(value)
        }
    }

    /// Path a document symlink points at.
    #[must_use]
    pub fn target(&self, id: &str) -> PathBuf {
        self.files_dir.join(id)
    }

    pub(crate) fn already_exists(&self, value: &str) -> IndexError {
        IndexError::already_exists(&self.type_name, &self.index_by, value)
    }

    pub(crate) fn not_found(&self, value: &str) -> IndexError {
        IndexError::not_found(&self.type_name, &self.index_by, value)
    }
}

/// A mapping created by [`Index::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Stored value (after case folding or autoincrement assignment).
    pub value: String,
    /// Path of the created symlink.
    pub path: PathBuf,
}

/// Symlink index contract.
///
/// Every implementation is bound to one [`IndexSpec`]. Methods take `&self`;
/// implementations serialise their own compound operations.
pub trait Index: Send + Sync + fmt::Debug {
    /// Returns the index specification.
    fn spec(&self) -> &IndexSpec;

    /// Returns the on-disk representation.
    fn kind(&self) -> IndexKind;

    /// Verifies the files directory and creates the index root. Idempotent.
    fn init(&self) -> IndexResult<()>;

    /// Returns the primary keys stored for `value`.
    ///
    /// Fails with `NotFound` when there are none.
    fn lookup(&self, value: &str) -> IndexResult<Vec<String>>;

    /// Maps `value` to `id`.
    ///
    /// Returns `None` when the value is empty and nothing was indexed.
    fn add(&self, id: &str, value: &str) -> IndexResult<Option<IndexEntry>>;

    /// Removes the mapping for `id` under `value`. Absent mappings are ignored.
    fn remove(&self, id: &str, value: &str) -> IndexResult<()>;

    /// Moves `id` from `old_value` to `new_value`.
    fn update(&self, id: &str, old_value: &str, new_value: &str) -> IndexResult<()>;

    /// Glob search over values. Every returned path has `id` as its file name.
    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>>;

    /// Lists every `(value, id)` pair in the tree.
    fn entries(&self) -> IndexResult<Vec<(String, String)>>;

    /// Removes every mapping for `id` regardless of value. Returns how many went.
    fn purge(&self, id: &str) -> IndexResult<usize> {
        let mut removed = 0;
        for (value, owner) in self.entries()? {
            if owner == id {
                self.remove(id, &value)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Deletes the whole index tree.
    fn delete(&self) -> IndexResult<()>;

    /// Attribute the index is keyed by.
    fn index_by(&self) -> &str {
        &self.spec().index_by
    }

    /// Entity type the index belongs to.
    fn type_name(&self) -> &str {
        &self.spec().type_name
    }

    /// Directory holding the documents.
    fn files_dir(&self) -> &Path {
        &self.spec().files_dir
    }

    /// Root of the symlink tree.
    fn index_root_dir(&self) -> &Path {
        &self.spec().index_root_dir
    }
}
