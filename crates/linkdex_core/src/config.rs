//! Indexer configuration.

use crate::error::{IndexError, IndexResult};
use crate::index::{Bound, IndexKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default name of the directory holding every index tree.
pub const DEFAULT_INDEX_ROOT: &str = "index.disk";

/// Declaration of a single index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Entity type the index belongs to.
    pub type_name: String,
    /// Attribute the index is keyed by.
    pub index_by: String,
    /// Directory (below the data directory) holding the documents.
    pub entity_dir: String,
    /// On-disk representation.
    pub kind: IndexKind,
    /// Whether values are compared case-insensitively.
    #[serde(default)]
    pub case_insensitive: bool,
    /// Assignment range for autoincrement indices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Bound>,
}

impl IndexDefinition {
    /// Creates a definition.
    pub fn new(
        type_name: impl Into<String>,
        index_by: impl Into<String>,
        entity_dir: impl Into<String>,
        kind: IndexKind,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            index_by: index_by.into(),
            entity_dir: entity_dir.into(),
            kind,
            case_insensitive: false,
            bound: None,
        }
    }

    /// Makes the index case-insensitive.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Sets the autoincrement bound.
    #[must_use]
    pub fn with_bound(mut self, lower: u64, upper: u64) -> Self {
        self.bound = Some(Bound { lower, upper });
        self
    }

    /// Checks the definition for obvious mistakes.
    pub fn validate(&self) -> IndexResult<()> {
        if self.type_name.is_empty() || self.index_by.is_empty() || self.entity_dir.is_empty() {
            return Err(IndexError::invalid_config(format!(
                "index {}.{} needs a type name, an attribute and an entity directory",
                self.type_name, self.index_by
            )));
        }
        if let Some(bound) = self.bound {
            if self.kind != IndexKind::Autoincrement {
                return Err(IndexError::invalid_config(format!(
                    "bound set on {} index {}.{}",
                    self.kind, self.type_name, self.index_by
                )));
            }
            if bound.lower > bound.upper {
                return Err(IndexError::invalid_config(format!(
                    "inverted bound {}..{} on {}.{}",
                    bound.lower, bound.upper, self.type_name, self.index_by
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for an [`Indexer`](crate::Indexer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Root directory holding documents and index trees.
    pub data_dir: PathBuf,
    /// Name of the directory below `data_dir` holding the index trees.
    #[serde(default = "default_index_root")]
    pub index_root_dir_name: String,
    /// Indices to create, in order.
    #[serde(default)]
    pub indices: Vec<IndexDefinition>,
}

fn default_index_root() -> String {
    DEFAULT_INDEX_ROOT.to_string()
}

impl IndexerConfig {
    /// Creates a configuration with no indices.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            index_root_dir_name: default_index_root(),
            indices: Vec::new(),
        }
    }

    /// Sets the index root directory name.
    #[must_use]
    pub fn with_index_root(mut self, name: impl Into<String>) -> Self {
        self.index_root_dir_name = name.into();
        self
    }

    /// Adds an index definition.
    #[must_use]
    pub fn with_index(mut self, definition: IndexDefinition) -> Self {
        self.indices.push(definition);
        self
    }

    /// Checks the configuration and every index definition.
    pub fn validate(&self) -> IndexResult<()> {
        if self.index_root_dir_name.is_empty() {
            return Err(IndexError::invalid_config("empty index root directory name"));
        }
        self.indices.iter().try_for_each(IndexDefinition::validate)
    }
}
