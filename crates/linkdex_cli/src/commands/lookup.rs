//! Lookup and search commands.

use linkdex_core::Indexer;
use tracing::info;

/// Prints the primary keys stored for `value`.
pub fn lookup(
    indexer: &Indexer,
    type_name: &str,
    field: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ids = indexer.find_by(type_name, &[linkdex_core::Field::new(field, value)])?;
    if ids.is_empty() {
        info!("No {}.{} entry for {:?}", type_name, field, value);
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

/// Prints the primary keys whose value matches `pattern`.
pub fn search(
    indexer: &Indexer,
    type_name: &str,
    field: &str,
    pattern: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ids = indexer.find_by_partial(type_name, field, pattern)?;
    if ids.is_empty() {
        info!("No {}.{} entry matches {:?}", type_name, field, pattern);
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}
