//! SQLite storage session for relmap.
//!
//! Implements the [`relmap_core::StorageSession`] collaborator over
//! `rusqlite`, so criteria queries and compiled DDL run against a real
//! database.

mod error;
mod session;

pub use error::SqliteError;
pub use session::{SqliteCursor, SqliteSession, DEFAULT_STATEMENT_CACHE_CAPACITY};
