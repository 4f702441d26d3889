//! Unique symlink index.

use crate::error::IndexResult;
use crate::index::link;
use crate::index::traits::{Index, IndexEntry, IndexKind, IndexSpec};
use crate::sync::NamedLocks;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::trace;

/// Index allowing at most one document per value.
///
/// Each value is a single symlink directly below the index root:
///
/// ```text
/// <root>/UserByEmail/a@x.com -> <files_dir>/u1
/// ```
///
/// Creating the symlink is the uniqueness check: the filesystem refuses a
/// second link with the same name.
#[derive(Debug)]
pub struct UniqueIndex {
    spec: IndexSpec,
    locks: NamedLocks,
}

impl UniqueIndex {
    /// Creates a unique index. Call [`Index::init`] before use.
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            locks: NamedLocks::new(),
        }
    }

    fn link_path(&self, value: &str) -> PathBuf {
        self.spec.index_root_dir.join(value)
    }

    /// Creates the value symlink. The caller holds the value's lock.
    pub(crate) fn link(&self, id: &str, value: &str) -> IndexResult<IndexEntry> {
        link::check_component(id)?;
        link::check_component(value)?;
        let path = self.link_path(value);
        match link::symlink(&self.spec.target(id), &path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(self.spec.already_exists(value));
            }
            Err(e) => return Err(e.into()),
        }
        trace!(index = %self.spec.index_root_dir.display(), id, value, "linked");
        Ok(IndexEntry {
            value: value.to_string(),
            path,
        })
    }

    pub(crate) fn locks(&self) -> &NamedLocks {
        &self.locks
    }
}

impl Index for UniqueIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Unique
    }

    fn init(&self) -> IndexResult<()> {
        link::init_dirs(&self.spec.files_dir, &self.spec.index_root_dir)
    }

    fn lookup(&self, value: &str) -> IndexResult<Vec<String>> {
        let value = self.spec.normalize(value);
        if link::check_component(&value).is_err() {
            return Err(self.spec.not_found(&value));
        }
        match link::owner(&self.link_path(&value))? {
            Some(id) => Ok(vec![id]),
            None => Err(self.spec.not_found(&value)),
        }
    }

    fn add(&self, id: &str, value: &str) -> IndexResult<Option<IndexEntry>> {
        let value = self.spec.normalize(value);
        if value.is_empty() {
            return Ok(None);
        }
        self.locks.write(&value, || self.link(id, &value)).map(Some)
    }

    fn remove(&self, id: &str, value: &str) -> IndexResult<()> {
        let value = self.spec.normalize(value);
        if link::check_component(&value).is_err() {
            return Ok(());
        }
        let path = self.link_path(&value);
        self.locks.write(&value, || {
            // Leave values claimed by another document alone.
            if link::owner(&path)?.as_deref() == Some(id) {
                link::remove_link(&path)?;
                trace!(index = %self.spec.index_root_dir.display(), id, %value, "unlinked");
            }
            Ok(())
        })
    }

    fn update(&self, id: &str, old_value: &str, new_value: &str) -> IndexResult<()> {
        let old_value = self.spec.normalize(old_value);
        let new_value = self.spec.normalize(new_value);
        if link::check_component(&old_value).is_err() {
            return Err(self.spec.not_found(&old_value));
        }
        link::check_component(&new_value)?;

        let old_path = self.link_path(&old_value);
        let new_path = self.link_path(&new_value);

        self.locks.write_pair(&old_value, &new_value, || {
            if link::owner(&old_path)?.as_deref() != Some(id) {
                return Err(self.spec.not_found(&old_value));
            }
            if old_value == new_value {
                return Ok(());
            }
            match link::owner(&new_path)? {
                Some(owner) if owner != id => {
                    return Err(self.spec.already_exists(&new_value));
                }
                Some(_) => {
                    link::remove_link(&old_path)?;
                }
                None => fs::rename(&old_path, &new_path)?,
            }
            trace!(
                index = %self.spec.index_root_dir.display(),
                id,
                from = %old_value,
                to = %new_value,
                "moved"
            );
            Ok(())
        })
    }

    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>> {
        let pattern = self.spec.normalize(pattern);
        if link::check_component(&pattern).is_err() {
            return Err(self.spec.not_found(&pattern));
        }
        let mut targets = Vec::new();
        for path in link::glob_under(&self.spec.index_root_dir, &pattern)? {
            if link::owner(&path)?.is_some() {
                targets.push(fs::read_link(&path)?);
            }
        }
        if targets.is_empty() {
            return Err(self.spec.not_found(&pattern));
        }
        Ok(targets)
    }

    fn entries(&self) -> IndexResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for value in link::list_dir(&self.spec.index_root_dir)?.unwrap_or_default() {
            if let Some(id) = link::owner(&self.link_path(&value))? {
                entries.push((value, id));
            }
        }
        Ok(entries)
    }

    fn delete(&self) -> IndexResult<()> {
        link::remove_tree(&self.spec.index_root_dir)?;
        Ok(())
    }
}
