//! Storage collaborator contracts: sessions, cursors and model factories.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::catalog::ClassMetadata;
use crate::error::{Error, Result};
use crate::model::{Entity, Record};
use crate::value::Value;

/// A forward-only handle over result rows.
///
/// Cursors start before the first row and must be closed exactly once.
pub trait Cursor {
    /// Number of rows in the result.
    fn count(&self) -> usize;

    /// Advance to the next row. Returns false once past the last row.
    fn move_to_next(&mut self) -> bool;

    /// Move to the first row. Returns false if there are no rows.
    fn move_to_first(&mut self) -> bool;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Name of a column.
    fn column_name(&self, index: usize) -> Option<&str>;

    /// Value of a column in the current row.
    fn value(&self, index: usize) -> Result<Value>;

    /// Release the underlying resources.
    fn close(&mut self);

    /// Index of a column by name.
    fn column_index(&self, name: &str) -> Option<usize> {
        (0..self.column_count()).find(|&idx| self.column_name(idx) == Some(name))
    }

    /// Value of a column in the current row as an integer.
    fn get_long(&self, index: usize) -> Result<i64> {
        let value = self.value(index)?;
        value.as_i64().ok_or_else(|| {
            Error::Materialization(format!("column {} is not an integer: {:?}", index, value))
        })
    }
}

/// Executes SQL against a storage engine.
pub trait StorageSession {
    /// Cursor type returned by queries.
    type Cursor: Cursor;

    /// Run a query and return a cursor over its rows.
    ///
    /// `cacheable` hints that the statement will be run again and may be
    /// prepared once.
    fn execute_for_result(&mut self, sql: &str, cacheable: bool) -> Result<Self::Cursor>;

    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&mut self, sql: &str) -> Result<usize>;
}

/// Turns the current cursor row into a domain instance.
pub trait ModelFactory {
    /// Instance type produced.
    type Model: Entity + Clone;

    /// Materialize the current row of `cursor` as an instance of `meta`'s entity.
    fn create_from_cursor(&self, cursor: &dyn Cursor, meta: &ClassMetadata) -> Result<Self::Model>;
}

/// Materializes rows as [`Record`]s.
///
/// Every column-backed field is read by column name and narrowed to its
/// declared scalar type. Columns missing from the row become `Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFactory;

impl ModelFactory for RecordFactory {
    type Model = Record;

    fn create_from_cursor(&self, cursor: &dyn Cursor, meta: &ClassMetadata) -> Result<Record> {
        let mut record = Record::new(meta.entity());
        for field in meta.column_fields() {
            let value = match cursor.column_index(field.column_name()) {
                Some(idx) => cursor.value(idx)?,
                None => Value::Null,
            };
            let value = match field.field_type.scalar_type() {
                Some(scalar) => value.coerce(scalar),
                None => value,
            };
            record.set(field.name.clone(), value);
        }
        trace!(entity = meta.entity(), "materialized record");
        Ok(record)
    }
}

/// Closes the wrapped cursor when dropped, on every exit path.
pub(crate) struct ScopedCursor<C: Cursor> {
    inner: C,
}

impl<C: Cursor> ScopedCursor<C> {
    pub(crate) fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: Cursor> Deref for ScopedCursor<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C: Cursor> DerefMut for ScopedCursor<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C: Cursor> Drop for ScopedCursor<C> {
    fn drop(&mut self) {
        self.inner.close();
    }
}
