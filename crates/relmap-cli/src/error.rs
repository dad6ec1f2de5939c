//! CLI errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The schema file could not be read.
    #[error("failed to read schema '{path}': {source}")]
    Io {
        /// Schema path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not a valid schema description.
    #[error("invalid schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// A `--where` filter could not be parsed.
    #[error("invalid filter '{filter}': {reason}")]
    Filter {
        /// The filter as given.
        filter: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Catalog or compiler failure.
    #[error(transparent)]
    Core(#[from] relmap_core::Error),
}
