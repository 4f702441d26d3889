//! Single-mapping repair commands.

use linkdex_core::Indexer;
use tracing::info;

/// Maps `value` to `id` in every index registered for the attribute.
pub fn link(
    indexer: &Indexer,
    type_name: &str,
    field: &str,
    id: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    for index in indexer.indices(type_name, field)? {
        match index.add(id, value)? {
            Some(entry) => info!("Linked {:?} -> {:?}", entry.path, index.files_dir().join(id)),
            None => info!("Empty value, nothing linked in {:?}", index.index_root_dir()),
        }
    }
    Ok(())
}

/// Removes the mapping of `id` under `value` from every index registered for
/// the attribute.
pub fn unlink(
    indexer: &Indexer,
    type_name: &str,
    field: &str,
    id: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    for index in indexer.indices(type_name, field)? {
        index.remove(id, value)?;
        info!("Unlinked {:?} from {:?}", id, index.index_root_dir());
    }
    Ok(())
}
