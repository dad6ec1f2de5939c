//! Storage session over a SQLite connection.

use std::path::Path;

use relmap_core::{Cursor, Error, Result, StorageSession, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};
use tracing::debug;

use crate::error::SqliteError;

/// Default number of prepared statements kept for cacheable queries.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

/// A storage session backed by one SQLite connection.
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> std::result::Result<Self, SqliteError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, SqliteError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> std::result::Result<Self, SqliteError> {
        conn.set_prepared_statement_cache_capacity(DEFAULT_STATEMENT_CACHE_CAPACITY);
        Ok(Self { conn })
    }

    /// Set how many prepared statements are kept for cacheable queries.
    pub fn with_statement_cache_capacity(self, capacity: usize) -> Self {
        self.conn.set_prepared_statement_cache_capacity(capacity);
        self
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StorageSession for SqliteSession {
    type Cursor = SqliteCursor;

    fn execute_for_result(&mut self, sql: &str, cacheable: bool) -> Result<SqliteCursor> {
        debug!(sql, cacheable, "sqlite query");
        let (columns, rows) = if cacheable {
            let mut stmt = self.conn.prepare_cached(sql).map_err(SqliteError::from)?;
            collect_rows(&mut stmt)?
        } else {
            let mut stmt = self.conn.prepare(sql).map_err(SqliteError::from)?;
            collect_rows(&mut stmt)?
        };
        Ok(SqliteCursor::new(columns, rows))
    }

    fn execute(&mut self, sql: &str) -> Result<usize> {
        debug!(sql, "sqlite execute");
        Ok(self.conn.execute(sql, []).map_err(SqliteError::from)?)
    }
}

fn collect_rows(
    stmt: &mut Statement<'_>,
) -> std::result::Result<(Vec<String>, Vec<Vec<Value>>), SqliteError> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(to_value(row.get_ref(idx)?, idx)?);
        }
        out.push(values);
    }
    Ok((columns, out))
}

fn to_value(value: ValueRef<'_>, column: usize) -> std::result::Result<Value, SqliteError> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(|source| SqliteError::InvalidText { column, source })?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

/// Forward-only cursor over a fully read result set.
#[derive(Debug)]
pub struct SqliteCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    closed: bool,
}

impl SqliteCursor {
    fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
            closed: false,
        }
    }

    /// Check if the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Cursor for SqliteCursor {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn move_to_next(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p.saturating_add(1));
        self.position = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    fn move_to_first(&mut self) -> bool {
        self.position = Some(0);
        !self.rows.is_empty()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    fn value(&self, index: usize) -> Result<Value> {
        if self.closed {
            return Err(Error::Storage("cursor is closed".to_string()));
        }
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| Error::Storage("cursor is not positioned on a row".to_string()))?;
        row.get(index)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("column index {} out of range", index)))
    }

    fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }
}
