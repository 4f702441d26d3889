//! Autoincrement index.

use crate::error::{IndexError, IndexResult};
use crate::index::link;
use crate::index::traits::{Index, IndexEntry, IndexKind, IndexSpec};
use crate::index::unique::UniqueIndex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Lock name guarding next-value assignment. Never a valid numeric value.
const NEXT_LOCK: &str = "next";

/// Inclusive range of values an autoincrement index may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    /// First value handed out.
    pub lower: u64,
    /// Largest value that may be handed out.
    pub upper: u64,
}

impl Default for Bound {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: u64::MAX,
        }
    }
}

/// Unique index over numbers, assigning the next one when none is given.
///
/// Layout is that of [`UniqueIndex`] with decimal value names:
///
/// ```text
/// <root>/AccountByUidNumber/20001 -> <files_dir>/u1
/// ```
#[derive(Debug)]
pub struct AutoincrementIndex {
    inner: UniqueIndex,
    bound: Bound,
}

impl AutoincrementIndex {
    /// Creates an autoincrement index. Call [`Index::init`] before use.
    #[must_use]
    pub fn new(spec: IndexSpec, bound: Option<Bound>) -> Self {
        Self {
            inner: UniqueIndex::new(spec),
            bound: bound.unwrap_or_default(),
        }
    }

    /// Returns the configured bound.
    #[must_use]
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Next value to assign: one past the largest stored value, never below
    /// the lower bound.
    fn next_value(&self) -> IndexResult<u64> {
        let latest = link::list_dir(&self.inner.spec().index_root_dir)?
            .unwrap_or_default()
            .iter()
            .filter_map(|name| name.parse::<u64>().ok())
            .max();
        let next = match latest {
            Some(latest) => latest.saturating_add(1).max(self.bound.lower),
            None => self.bound.lower,
        };
        if next > self.bound.upper || latest == Some(u64::MAX) {
            let spec = self.inner.spec();
            return Err(IndexError::BoundExceeded {
                type_name: spec.type_name.clone(),
                key: spec.index_by.clone(),
                upper: self.bound.upper,
            });
        }
        Ok(next)
    }

    /// Accepts explicit values only if they are numbers inside the bound.
    fn check_value(&self, value: &str) -> IndexResult<()> {
        match value.parse::<u64>() {
            Ok(n) if (self.bound.lower..=self.bound.upper).contains(&n) => Ok(()),
            _ => Err(IndexError::InvalidValue {
                value: value.to_string(),
            }),
        }
    }
}

impl Index for AutoincrementIndex {
    fn spec(&self) -> &IndexSpec {
        self.inner.spec()
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Autoincrement
    }

    fn init(&self) -> IndexResult<()> {
        self.inner.init()
    }

    fn lookup(&self, value: &str) -> IndexResult<Vec<String>> {
        self.inner.lookup(value)
    }

    fn add(&self, id: &str, value: &str) -> IndexResult<Option<IndexEntry>> {
        if !value.is_empty() {
            self.check_value(value)?;
            return self.inner.add(id, value);
        }

        let entry = self.inner.locks().write(NEXT_LOCK, || {
            let value = self.next_value()?.to_string();
            self.inner
                .locks()
                .write(&value, || self.inner.link(id, &value))
        })?;
        debug!(
            type_name = %self.spec().type_name,
            index_by = %self.spec().index_by,
            id,
            value = %entry.value,
            "assigned"
        );
        Ok(Some(entry))
    }

    fn remove(&self, id: &str, value: &str) -> IndexResult<()> {
        self.inner.remove(id, value)
    }

    fn update(&self, id: &str, old_value: &str, new_value: &str) -> IndexResult<()> {
        self.check_value(new_value)?;
        self.inner.update(id, old_value, new_value)
    }

    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>> {
        self.inner.search(pattern)
    }

    fn entries(&self) -> IndexResult<Vec<(String, String)>> {
        self.inner.entries()
    }

    fn delete(&self) -> IndexResult<()> {
        self.inner.delete()
    }
}
