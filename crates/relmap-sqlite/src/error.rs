//! SQLite session errors.

use thiserror::Error;

/// Errors raised by the SQLite storage session.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Error reported by SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A text column did not hold valid UTF-8.
    #[error("column {column} holds invalid UTF-8: {source}")]
    InvalidText {
        /// Column index.
        column: usize,
        /// Decoding error.
        #[source]
        source: std::str::Utf8Error,
    },
}

impl From<SqliteError> for relmap_core::Error {
    fn from(err: SqliteError) -> Self {
        relmap_core::Error::Storage(err.to_string())
    }
}
