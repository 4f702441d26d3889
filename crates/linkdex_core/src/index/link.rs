//! Filesystem primitives shared by the index implementations.

use crate::error::{IndexError, IndexResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Verifies `files_dir` exists and creates `root` (and parents) if needed.
pub(crate) fn init_dirs(files_dir: &Path, root: &Path) -> IndexResult<()> {
    if let Err(source) = fs::metadata(files_dir) {
        return Err(IndexError::FilesDirMissing {
            path: files_dir.to_path_buf(),
            source,
        });
    }
    create_dir_all(root)?;
    Ok(())
}

/// Recursive mkdir with a permissive mode, subject to umask.
pub(crate) fn create_dir_all(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder.create(path)
}

/// Creates `link` pointing at `target`.
#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Creates `link` pointing at `target`. Documents are directories.
#[cfg(windows)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Rejects values that would not stay a single component below the index root.
pub(crate) fn check_component(value: &str) -> IndexResult<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');
    if bad {
        return Err(IndexError::InvalidValue {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Reads the primary key a symlink points at.
///
/// Returns `None` if nothing exists at `link`, and fails if the entry is not a
/// symlink.
pub(crate) fn owner(link: &Path) -> IndexResult<Option<String>> {
    let meta = match fs::symlink_metadata(link) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !meta.file_type().is_symlink() {
        return Err(IndexError::NotASymlink {
            path: link.to_path_buf(),
        });
    }
    let target = fs::read_link(link)?;
    Ok(Some(file_name(&target)))
}

/// Returns true if a directory entry exists at `path` without following links.
pub(crate) fn exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes a file or symlink, ignoring a missing entry.
pub(crate) fn remove_link(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes `dir` if it is empty. Returns true if it was removed.
pub(crate) fn prune_if_empty(dir: &Path) -> io::Result<bool> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    match fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lists entry names in `dir`, sorted. A missing directory yields `None`.
pub(crate) fn list_dir(dir: &Path) -> io::Result<Option<Vec<String>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in entries {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(Some(names))
}

/// Removes a whole tree, ignoring a missing root.
pub(crate) fn remove_tree(root: &Path) -> io::Result<()> {
    match fs::remove_dir_all(root) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Expands `pattern` below `root`. The root itself is escaped; callers keep
/// `pattern` from leaving it.
pub(crate) fn glob_under(root: &Path, pattern: &str) -> IndexResult<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let full = format!("{base}/{pattern}");
    let mut matches = Vec::new();
    for entry in glob::glob(&full)? {
        matches.push(entry.map_err(io::Error::from)?);
    }
    Ok(matches)
}

/// Last path component as an owned string.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
