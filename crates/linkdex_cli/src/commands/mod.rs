//! CLI command implementations.

pub mod inspect;
pub mod lookup;
pub mod repair;
pub mod verify;

use linkdex_core::IndexerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the indexer configuration, applying a data directory override.
pub fn load_config(
    path: &Path,
    data_dir: Option<PathBuf>,
) -> Result<IndexerConfig, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read configuration {:?}: {}", path, e))?;
    let mut config: IndexerConfig = serde_json::from_str(&raw)?;
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    debug!(
        "Loaded configuration from {:?}: {} indices under {:?}",
        path,
        config.indices.len(),
        config.data_dir
    );
    Ok(config)
}
