//! # Linkdex Core
//!
//! Filesystem-native secondary indices for document directories.
//!
//! Documents live in per-type directories owned by the caller, one entry per
//! primary key. Linkdex maintains trees of symlinks that map attribute values
//! back to those entries, so a document can be found by e-mail address or
//! colour without a database.
//!
//! This crate provides:
//! - Index implementations (unique, non-unique, autoincrement)
//! - A registry routing `(type, attribute)` pairs to indices
//! - The [`Indexer`] facade fanning documents out to every index of their type
//! - Configuration for building an indexer from a declaration

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod error;
pub mod index;
mod indexer;
mod registry;
mod sync;

pub use config::{IndexDefinition, IndexerConfig, DEFAULT_INDEX_ROOT};
pub use document::{Document, Record};
pub use error::{is_already_exists, is_not_found, IndexError, IndexResult};
pub use index::{
    AutoincrementIndex, Bound, Index, IndexEntry, IndexKind, IndexSpec, NonUniqueIndex,
    UniqueIndex,
};
pub use indexer::{Field, IndexAddResult, Indexer};
pub use registry::{FieldIndices, Registry};
pub use sync::NamedLocks;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
