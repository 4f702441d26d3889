//! Linkdex CLI
//!
//! Command-line tools for inspecting and repairing linkdex index trees.
//!
//! # Commands
//!
//! - `inspect` - List configured indices with value and entry counts
//! - `verify` - Report dangling links and empty value buckets
//! - `lookup` - Resolve a value to primary keys
//! - `search` - Resolve a glob pattern to primary keys
//! - `link` / `unlink` - Add or remove a single mapping

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Linkdex command-line index tools.
#[derive(Parser)]
#[command(name = "linkdex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the indexer configuration (JSON)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(global = true, short, long, env = "LINKDEX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured indices with value and entry counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report dangling links and empty value buckets
    Verify,

    /// Print the primary keys stored for a value
    Lookup {
        /// Entity type
        type_name: String,
        /// Indexed attribute
        field: String,
        /// Value to resolve
        value: String,
    },

    /// Print the primary keys whose value matches a glob pattern
    Search {
        /// Entity type
        type_name: String,
        /// Indexed attribute
        field: String,
        /// Glob pattern (`*`, `?`, `[...]`)
        pattern: String,
    },

    /// Map a value to a primary key in every index for the attribute
    Link {
        /// Entity type
        type_name: String,
        /// Indexed attribute
        field: String,
        /// Primary key
        id: String,
        /// Value
        value: String,
    },

    /// Remove a value mapping from every index for the attribute
    Unlink {
        /// Entity type
        type_name: String,
        /// Indexed attribute
        field: String,
        /// Primary key
        id: String,
        /// Value
        value: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("Linkdex CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Linkdex Core v{}", linkdex_core::VERSION);
        return Ok(());
    }

    let config_path = cli.config.ok_or("Configuration file required (--config)")?;
    let config = commands::load_config(&config_path, cli.data_dir)?;
    let indexer = linkdex_core::Indexer::from_config(&config)?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&indexer, &format)?,
        Commands::Verify => commands::verify::run(&indexer)?,
        Commands::Lookup {
            type_name,
            field,
            value,
        } => commands::lookup::lookup(&indexer, &type_name, &field, &value)?,
        Commands::Search {
            type_name,
            field,
            pattern,
        } => commands::lookup::search(&indexer, &type_name, &field, &pattern)?,
        Commands::Link {
            type_name,
            field,
            id,
            value,
        } => commands::repair::link(&indexer, &type_name, &field, &id, &value)?,
        Commands::Unlink {
            type_name,
            field,
            id,
            value,
        } => commands::repair::unlink(&indexer, &type_name, &field, &id, &value)?,
        Commands::Version => {}
    }

    Ok(())
}
