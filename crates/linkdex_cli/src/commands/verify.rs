//! Verify command implementation.

use linkdex_core::{Index, IndexKind, Indexer};
use std::fs;
use std::path::PathBuf;

/// Problems found in one index tree.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of mappings checked.
    pub entries_checked: usize,
    /// Links whose target document is missing.
    pub dangling: Vec<PathBuf>,
    /// Value buckets with no links left in them.
    pub empty_buckets: Vec<PathBuf>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.dangling.is_empty() && self.empty_buckets.is_empty()
    }
}

/// Checks a single index.
pub fn verify_index(index: &dyn Index) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::default();

    for (_, id) in index.entries()? {
        result.entries_checked += 1;
        let target = index.files_dir().join(&id);
        if fs::metadata(&target).is_err() {
            result.dangling.push(target);
        }
    }

    if index.kind() == IndexKind::NonUnique {
        if let Ok(buckets) = fs::read_dir(index.index_root_dir()) {
            for bucket in buckets {
                let path = bucket?.path();
                if path.is_dir() && fs::read_dir(&path)?.next().is_none() {
                    result.empty_buckets.push(path);
                }
            }
        }
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(indexer: &Indexer) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying indices under {:?}", indexer.index_root());
    println!();

    let mut failed = false;
    for index in indexer.registry().iter() {
        let result = verify_index(index)?;
        print_result(index, &result);
        failed |= !result.is_ok();
    }

    if failed {
        return Err("Verification found problems".into());
    }
    println!("All indices OK");
    Ok(())
}

fn print_result(index: &dyn Index, result: &VerifyResult) {
    println!(
        "{}By{}: {} entries checked",
        index.type_name(),
        index.index_by(),
        result.entries_checked
    );
    for path in &result.dangling {
        println!("  dangling link to {:?}", path);
    }
    for path in &result.empty_buckets {
        println!("  empty bucket {:?}", path);
    }
}
