//! Error types for linkdex.
//!
//! Only two conditions carry domain meaning: a mapping that already exists and
//! a mapping that could not be found. Both carry the `(type_name, key, value)`
//! triple of the index that raised them and are classified through
//! [`IndexError::is_already_exists`] and [`IndexError::is_not_found`]. Every
//! other failure (permissions, full disks, broken configuration) passes
//! through as its own variant.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur in linkdex operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The mapping (or, for unique indices, any mapping for the value) exists.
    #[error("value '{value}' for {type_name}.{key} already exists")]
    AlreadyExists {
        /// Type the index is bound to.
        type_name: String,
        /// Attribute the index is bound to.
        key: String,
        /// Offending value.
        value: String,
    },

    /// No mapping exists for the value.
    #[error("value '{value}' for {type_name}.{key} not found")]
    NotFound {
        /// Type the index is bound to.
        type_name: String,
        /// Attribute the index is bound to.
        key: String,
        /// Value that was looked up.
        value: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A search pattern could not be parsed.
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The documents directory an index points into does not exist.
    #[error("files directory {} is not accessible: {source}", path.display())]
    FilesDirMissing {
        /// Configured files directory.
        path: PathBuf,
        /// Underlying stat failure.
        source: io::Error,
    },

    /// An entry inside an index tree is not a symlink.
    #[error("{} is not a valid symlink", path.display())]
    NotASymlink {
        /// Offending path.
        path: PathBuf,
    },

    /// A value or primary key cannot be used as a single path component.
    #[error("'{value}' cannot be stored in an index")]
    InvalidValue {
        /// Offending value.
        value: String,
    },

    /// No index is registered for the type and attribute.
    #[error("no index registered for {type_name}.{key}")]
    NoIndex {
        /// Requested type.
        type_name: String,
        /// Requested attribute.
        key: String,
    },

    /// The entity does not expose an attribute an index is bound to.
    #[error("{type_name} has no attribute '{key}'")]
    UnknownAttribute {
        /// Entity type.
        type_name: String,
        /// Missing attribute.
        key: String,
    },

    /// An update was attempted between entities of different types.
    #[error("update types do not match: from {from} to {to}")]
    TypeMismatch {
        /// Type of the old entity.
        from: String,
        /// Type of the new entity.
        to: String,
    },

    /// An autoincrement index ran past its upper bound.
    #[error("autoincrement {type_name}.{key} exceeded upper bound {upper}")]
    BoundExceeded {
        /// Type the index is bound to.
        type_name: String,
        /// Attribute the index is bound to.
        key: String,
        /// Configured upper bound.
        upper: u64,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl IndexError {
    /// Creates an already-exists error.
    pub fn already_exists(
        type_name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            type_name: type_name.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(
        type_name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if this error reports an existing mapping.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns true if this error reports a missing mapping.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Returns true if `err` reports an existing mapping.
#[must_use]
pub fn is_already_exists(err: &IndexError) -> bool {
    err.is_already_exists()
}

/// Returns true if `err` reports a missing mapping.
#[must_use]
pub fn is_not_found(err: &IndexError) -> bool {
    err.is_not_found()
}
