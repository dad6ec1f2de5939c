//! Command-line configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relmap_core::config::DEFAULT_PRIMARY_KEY_NAME;
use relmap_core::CatalogConfig;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "relmap")]
#[command(version, about = "Compile a relmap schema into SQL", long_about = None)]
pub struct Args {
    /// Path to the JSON schema description.
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Field name that marks an implicit primary key.
    #[arg(long, default_value = DEFAULT_PRIMARY_KEY_NAME)]
    pub primary_key_name: String,

    /// Match the implicit primary key name case-sensitively.
    #[arg(long)]
    pub case_sensitive_keys: bool,

    /// What to compile.
    #[command(subcommand)]
    pub command: Command,
}

/// Statements the CLI can compile.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CREATE TABLE statements.
    Create {
        /// Entities to include (all when omitted).
        entities: Vec<String>,
    },
    /// DROP TABLE statements.
    Drop {
        /// Entities to include (all when omitted).
        entities: Vec<String>,
    },
    /// A SELECT over one entity.
    Select {
        /// Entity to query.
        entity: String,
        /// Equality filter as `field=value`, repeatable.
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,
        /// Maximum number of rows (0 = unbounded).
        #[arg(long, default_value_t = 0)]
        limit: u64,
        /// Rows to skip.
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// A SELECT count(*) over one entity.
    Count {
        /// Entity to query.
        entity: String,
        /// Equality filter as `field=value`, repeatable.
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,
    },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path to the JSON schema description.
    pub schema_path: PathBuf,
    /// Catalog configuration.
    pub catalog: CatalogConfig,
    /// Command to run.
    pub command: Command,
}

impl Args {
    /// Convert command-line arguments to CLI configuration.
    pub fn into_config(self) -> CliConfig {
        let mut catalog = CatalogConfig::new().with_primary_key_name(self.primary_key_name);
        if self.case_sensitive_keys {
            catalog = catalog.case_sensitive();
        }

        CliConfig {
            schema_path: self.schema,
            catalog,
            command: self.command,
        }
    }
}
