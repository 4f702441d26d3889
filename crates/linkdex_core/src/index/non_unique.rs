//! Non-unique symlink index.

use crate::error::IndexResult;
use crate::index::link;
use crate::index::traits::{Index, IndexEntry, IndexKind, IndexSpec};
use crate::sync::NamedLocks;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Index allowing many documents per value.
///
/// Each value is a directory (the value bucket) holding one symlink per
/// document:
///
/// ```text
/// <root>/PetByColor/Green/goefe-789 -> <files_dir>/goefe-789
/// <root>/PetByColor/Green/xadaf-189 -> <files_dir>/xadaf-189
/// ```
///
/// A bucket is pruned as soon as its last link leaves. Every operation that
/// touches a bucket holds that bucket's lock, so an `add` can never land in a
/// bucket between another operation's emptiness check and its removal.
#[derive(Debug)]
pub struct NonUniqueIndex {
    spec: IndexSpec,
    locks: NamedLocks,
}

impl NonUniqueIndex {
    /// Creates a non-unique index. Call [`Index::init`] before use.
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            locks: NamedLocks::new(),
        }
    }

    fn bucket(&self, value: &str) -> PathBuf {
        self.spec.index_root_dir.join(value)
    }

    /// Removes one link and prunes its bucket. The caller holds the bucket lock.
    fn unlink(&self, path: &Path) -> IndexResult<bool> {
        let removed = link::remove_link(path)?;
        if let Some(bucket) = path.parent() {
            if link::prune_if_empty(bucket)? {
                trace!(bucket = %bucket.display(), "pruned");
            }
        }
        Ok(removed)
    }

    /// Removes every link named `id`, in whichever bucket it lives.
    fn unlink_everywhere(&self, id: &str) -> IndexResult<usize> {
        if link::check_component(id).is_err() {
            return Ok(0);
        }
        let pattern = format!("*/{}", glob::Pattern::escape(id));
        let mut removed = 0;
        for path in link::glob_under(&self.spec.index_root_dir, &pattern)? {
            let value = path
                .parent()
                .map(link::file_name)
                .unwrap_or_default();
            if self.locks.write(&value, || self.unlink(&path))? {
                trace!(index = %self.spec.index_root_dir.display(), id, %value, "unlinked");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl Index for NonUniqueIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn kind(&self) -> IndexKind {
        IndexKind::NonUnique
    }

    fn init(&self) -> IndexResult<()> {
        link::init_dirs(&self.spec.files_dir, &self.spec.index_root_dir)
    }

    fn lookup(&self, value: &str) -> IndexResult<Vec<String>> {
        let value = self.spec.normalize(value);
        if link::check_component(&value).is_err() {
            return Err(self.spec.not_found(&value));
        }
        match link::list_dir(&self.bucket(&value))? {
            Some(ids) if !ids.is_empty() => Ok(ids),
            _ => Err(self.spec.not_found(&value)),
        }
    }

    fn add(&self, id: &str, value: &str) -> IndexResult<Option<IndexEntry>> {
        let value = self.spec.normalize(value);
        if value.is_empty() {
            return Ok(None);
        }
        link::check_component(id)?;
        link::check_component(&value)?;

        let bucket = self.bucket(&value);
        let path = bucket.join(id);
        self.locks.write(&value, || {
            link::create_dir_all(&bucket)?;
            match link::symlink(&self.spec.target(id), &path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    Err(self.spec.already_exists(&value))
                }
                Err(e) => Err(e.into()),
            }
        })?;
        trace!(index = %self.spec.index_root_dir.display(), id, %value, "linked");
        Ok(Some(IndexEntry {
            value: value.into_owned(),
            path,
        }))
    }

    /// Removes `id` from every bucket; `value` is not consulted, so stale
    /// mappings go too.
    fn remove(&self, id: &str, _value: &str) -> IndexResult<()> {
        self.unlink_everywhere(id)?;
        Ok(())
    }

    fn update(&self, id: &str, old_value: &str, new_value: &str) -> IndexResult<()> {
        let old_value = self.spec.normalize(old_value);
        let new_value = self.spec.normalize(new_value);
        if link::check_component(&old_value).is_err() || link::check_component(id).is_err() {
            return Err(self.spec.not_found(&old_value));
        }
        link::check_component(&new_value)?;

        let old_bucket = self.bucket(&old_value);
        let new_bucket = self.bucket(&new_value);
        let old_path = old_bucket.join(id);
        let new_path = new_bucket.join(id);

        self.locks.write_pair(&old_value, &new_value, || {
            if !link::exists(&old_path)? {
                return Err(self.spec.not_found(&old_value));
            }
            if old_value == new_value {
                return Ok(());
            }
            link::create_dir_all(&new_bucket)?;
            if let Err(e) = fs::rename(&old_path, &new_path) {
                link::prune_if_empty(&new_bucket)?;
                return Err(e.into());
            }
            if link::prune_if_empty(&old_bucket)? {
                trace!(bucket = %old_bucket.display(), "pruned");
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
        let paths = link::glob_under(&self.spec.index_root_dir, &format!("{pattern}/*"))?;
        if paths.is_empty() {
            return Err(self.spec.not_found(&pattern));
        }
        Ok(paths)
    }

    fn entries(&self) -> IndexResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for value in link::list_dir(&self.spec.index_root_dir)?.unwrap_or_default() {
            for id in link::list_dir(&self.bucket(&value))?.unwrap_or_default() {
                entries.push((value.clone(), id));
            }
        }
        Ok(entries)
    }

    fn purge(&self, id: &str) -> IndexResult<usize> {
        self.unlink_everywhere(id)
    }

    fn delete(&self) -> IndexResult<()> {
        link::remove_tree(&self.spec.index_root_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use std::sync::Arc;
    use std::thread;
    use tempfile::{tempdir, TempDir};

    fn pet_by_color(temp: &TempDir) -> NonUniqueIndex {
        let files = temp.path().join("pets");
        fs::create_dir_all(&files).unwrap();
        let spec = IndexSpec::new("Pet", "Color", files, &temp.path().join("index.disk"));
        let index = NonUniqueIndex::new(spec);
        index.init().unwrap();
        index
    }

    #[test]
    fn init_requires_files_dir() {
        let temp = tempdir().unwrap();
        let spec = IndexSpec::new(
            "Pet",
            "Color",
            temp.path().join("nope"),
            &temp.path().join("index.disk"),
        );
        let index = NonUniqueIndex::new(spec);
        assert!(index.init().is_err());
        assert!(!temp.path().join("index.disk").exists());
    }

    #[test]
    fn add_creates_bucket_and_link() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        let entry = index.add("rebef-123", "Brown").unwrap().unwrap();
        assert_eq!(
            entry.path,
            temp.path().join("index.disk/PetByColor/Brown/rebef-123")
        );
        assert_eq!(
            fs::read_link(&entry.path).unwrap(),
            temp.path().join("pets/rebef-123")
        );
        assert_eq!(index.lookup("Brown").unwrap(), vec!["rebef-123"]);
    }

    #[test]
    fn duplicate_pair_rejected() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        index.add("rebef-123", "Brown").unwrap();
        let err = index.add("rebef-123", "Brown").unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(index.lookup("Brown").unwrap(), vec!["rebef-123"]);
    }

    #[test]
    fn many_ids_per_value() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        index.add("goefe-789", "Green").unwrap();
        index.add("xadaf-189", "Green").unwrap();

        let mut ids = index.lookup("Green").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["goefe-789", "xadaf-189"]);
    }

    #[test]
    fn empty_value_skipped() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        assert_eq!(index.add("rebef-123", "").unwrap(), None);
        assert!(index.entries().unwrap().is_empty());
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        assert!(index.add("rebef-123", "a/b").is_err());
        assert!(!temp.path().join("index.disk/PetByColor/a").exists());
    }

    #[test]
    fn remove_prunes_last_entry() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("goefe-789", "Green").unwrap();
        index.add("xadaf-189", "Green").unwrap();

        index.remove("xadaf-189", "Green").unwrap();
        assert_eq!(index.lookup("Green").unwrap(), vec!["goefe-789"]);

        index.remove("goefe-789", "Green").unwrap();
        assert!(!index.bucket("Green").exists());
        assert!(index.lookup("Green").unwrap_err().is_not_found());
        assert!(index.search("Green").unwrap_err().is_not_found());
    }

    #[test]
    fn remove_ignores_value() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("rebef-123", "Brown").unwrap();

        // Stale caller view of the value still removes the mapping.
        index.remove("rebef-123", "Black").unwrap();
        assert!(index.lookup("Brown").unwrap_err().is_not_found());

        // Nothing left to remove.
        index.remove("rebef-123", "Brown").unwrap();
    }

    #[test]
    fn update_moves_and_prunes() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("rebef-123", "Brown").unwrap();

        index.update("rebef-123", "Brown", "Black").unwrap();
        assert!(index.lookup("Brown").unwrap_err().is_not_found());
        assert!(!index.bucket("Brown").exists());
        assert_eq!(index.lookup("Black").unwrap(), vec!["rebef-123"]);
    }

    #[test]
    fn update_keeps_other_members() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("goefe-789", "Green").unwrap();
        index.add("xadaf-189", "Green").unwrap();

        index.update("xadaf-189", "Green", "Grey").unwrap();
        assert_eq!(index.lookup("Green").unwrap(), vec!["goefe-789"]);
        assert_eq!(index.lookup("Grey").unwrap(), vec!["xadaf-189"]);
    }

    #[test]
    fn update_requires_old_mapping() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);

        let err = index.update("rebef-123", "Brown", "Black").unwrap_err();
        assert!(err.is_not_found());
        assert!(!index.bucket("Black").exists());
    }

    #[test]
    fn search_one_level_below_buckets() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("rebef-123", "Brown").unwrap();
        index.add("goefe-789", "Green").unwrap();
        index.add("xadaf-189", "Green").unwrap();
        index.add("wefwe-456", "Grey").unwrap();

        let mut ids: Vec<_> = index
            .search("G*")
            .unwrap()
            .iter()
            .map(|p| link::file_name(p))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["goefe-789", "wefwe-456", "xadaf-189"]);

        assert!(index.search("Z*").unwrap_err().is_not_found());
    }

    #[test]
    fn locks_released_after_use() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        for i in 0..2000 {
            let value = format!("v{i}");
            index.add("p", &value).unwrap();
            index.update("p", &value, "moved").unwrap();
            index.remove("p", "moved").unwrap();
        }
        assert!(index.entries().unwrap().is_empty());
        assert!(index.locks.is_empty());
    }

    #[test]
    fn search_stays_inside_root() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("rebef-123", "Brown").unwrap();
        let sibling = temp.path().join("index.disk/UserByEmail");
        fs::create_dir_all(&sibling).unwrap();
        link::symlink(&temp.path().join("users/u1"), &sibling.join("a@x.com")).unwrap();

        for pattern in ["..", ".", "../UserByEmail", "../*", "Brown/..", "*/*"] {
            assert!(
                index.search(pattern).unwrap_err().is_not_found(),
                "{pattern}"
            );
        }
        assert_eq!(index.search("B*").unwrap().len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_move_leaves_no_new_bucket() {
        let temp = tempdir().unwrap();
        let mut deep = temp.path().to_path_buf();
        while deep.as_os_str().len() < 3690 {
            deep.push("d".repeat(100));
        }
        let files = deep.join("pets");
        fs::create_dir_all(&files).unwrap();
        let index = NonUniqueIndex::new(IndexSpec::new("Pet", "Color", files, &deep.join("i")));
        index.init().unwrap();

        // The new bucket fits in PATH_MAX but the link inside it does not.
        let id = "p".repeat(200);
        let new_value = "n".repeat(250);
        index.add(&id, "a").unwrap();

        let err = index.update(&id, "a", &new_value).unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
        assert!(!link::exists(&index.bucket(&new_value)).unwrap());
        assert_eq!(index.lookup("a").unwrap(), vec![id]);
    }

    #[test]
    fn entries_and_purge() {
        let temp = tempdir().unwrap();
        let index = pet_by_color(&temp);
        index.add("rebef-123", "Brown").unwrap();
        index.add("goefe-789", "Green").unwrap();

        assert_eq!(
            index.entries().unwrap(),
            vec![
                ("Brown".to_string(), "rebef-123".to_string()),
                ("Green".to_string(), "goefe-789".to_string()),
            ]
        );

        assert_eq!(index.purge("goefe-789").unwrap(), 1);
        assert_eq!(index.purge("goefe-789").unwrap(), 0);
        assert_eq!(index.entries().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_updates_leave_no_empty_buckets() {
        let temp = tempdir().unwrap();
        let index = Arc::new(pet_by_color(&temp));
        for i in 0..16 {
            index.add(&format!("pet-{i}"), "Green").unwrap();
        }

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let id = format!("pet-{i}");
                    index.update(&id, "Green", "Grey").unwrap();
                    index.add(&format!("new-{i}"), "Green").unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(index.lookup("Grey").unwrap().len(), 16);
        assert_eq!(index.lookup("Green").unwrap().len(), 16);

        for i in 0..16 {
            index.remove(&format!("new-{i}"), "Green").unwrap();
        }
        assert!(!index.bucket("Green").exists());
    }
}
