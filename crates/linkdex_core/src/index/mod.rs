//! Symlink index implementations.
//!
//! An index maps the values of one attribute of one entity type to the
//! primary keys of the documents carrying them. The index *is* its directory
//! tree: there is no separate index file to keep in sync, and single-syscall
//! primitives (symlink, rename, unlink) keep individual operations crash-safe.
//!
//! # Index Types
//!
//! - [`UniqueIndex`]: one symlink per value
//! - [`NonUniqueIndex`]: one directory per value, one symlink per document
//! - [`AutoincrementIndex`]: unique numeric values, assigned on demand
//!
//! # Warning
//!
//! Indexing one entity on two attributes is two independent filesystem
//! operations. Nothing rolls the first back if the second fails.

mod autoincrement;
mod link;
mod non_unique;
mod traits;
mod unique;

pub use autoincrement::{AutoincrementIndex, Bound};
pub use non_unique::NonUniqueIndex;
pub use traits::{normalize_field, Index, IndexEntry, IndexKind, IndexSpec};
pub use unique::UniqueIndex;

/// Builds an index of the given kind. `bound` is only used by autoincrement.
#[must_use]
pub fn build(kind: IndexKind, spec: IndexSpec, bound: Option<Bound>) -> Box<dyn Index> {
    match kind {
        IndexKind::Unique => Box::new(UniqueIndex::new(spec)),
        IndexKind::NonUnique => Box::new(NonUniqueIndex::new(spec)),
        IndexKind::Autoincrement => Box::new(AutoincrementIndex::new(spec, bound)),
    }
}

pub(crate) use link::file_name;
