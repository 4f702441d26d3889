//! Inspect command implementation.

use linkdex_core::{Index, Indexer};
use serde::Serialize;
use std::collections::BTreeSet;

/// Inspection result for one index.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    /// Entity type.
    pub type_name: String,
    /// Indexed attribute.
    pub index_by: String,
    /// Index kind.
    pub kind: String,
    /// Root of the symlink tree.
    pub root: String,
    /// Directory the links point into.
    pub files_dir: String,
    /// Number of distinct values.
    pub value_count: usize,
    /// Number of value to primary key mappings.
    pub entry_count: usize,
}

impl IndexStats {
    /// Collects statistics for one index.
    pub fn collect(index: &dyn Index) -> Result<Self, Box<dyn std::error::Error>> {
        let entries = index.entries()?;
        let values: BTreeSet<_> = entries.iter().map(|(value, _)| value.as_str()).collect();
        Ok(Self {
            type_name: index.type_name().to_string(),
            index_by: index.index_by().to_string(),
            kind: index.kind().to_string(),
            root: index.index_root_dir().display().to_string(),
            files_dir: index.files_dir().display().to_string(),
            value_count: values.len(),
            entry_count: entries.len(),
        })
    }
}

/// Runs the inspect command.
pub fn run(indexer: &Indexer, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = indexer.registry();
    let mut stats = Vec::new();
    for type_name in registry.type_names() {
        for field in registry.fields(type_name) {
            for index in field.indices() {
                stats.push(IndexStats::collect(index.as_ref())?);
            }
        }
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => {
            print_text_output(indexer, &stats);
        }
    }

    Ok(())
}

fn print_text_output(indexer: &Indexer, stats: &[IndexStats]) {
    println!("Index root: {}", indexer.index_root().display());
    println!();
    if stats.is_empty() {
        println!("No indices configured");
        return;
    }
    for s in stats {
        println!("{}By{} ({})", s.type_name, s.index_by, s.kind);
        println!("  Root:      {}", s.root);
        println!("  Files:     {}", s.files_dir);
        println!("  Values:    {}", s.value_count);
        println!("  Entries:   {}", s.entry_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn counts_values_and_entries() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pets")).unwrap();
        let mut indexer = Indexer::new(temp.path(), "index.disk");
        indexer.add_non_unique_index("Pet", "Color", "pets").unwrap();

        let index = &indexer.indices("Pet", "Color").unwrap()[0];
        index.add("goefe-789", "Green").unwrap();
        index.add("xadaf-189", "Green").unwrap();
        index.add("rebef-123", "Brown").unwrap();

        let stats = IndexStats::collect(index.as_ref()).unwrap();
        assert_eq!(stats.kind, "non_unique");
        assert_eq!(stats.value_count, 2);
        assert_eq!(stats.entry_count, 3);
    }
}
