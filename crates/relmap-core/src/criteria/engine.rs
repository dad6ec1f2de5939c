//! Criteria query execution.

use tracing::{debug, trace};

use super::{CriteriaQuery, Criterion};
use crate::error::{Error, Result};
use crate::session::{Cursor, ModelFactory, ScopedCursor, Session, StorageSession};
use crate::sql::SqlCompiler;

/// A criteria query bound to a session.
///
/// Built with [`Session::criteria`]; criteria are combined with AND in the
/// order they are added.
pub struct Criteria<'s, 'c, S: StorageSession, F: ModelFactory> {
    session: &'s mut Session<'c, S, F>,
    query: CriteriaQuery,
}

impl<'s, 'c, S: StorageSession, F: ModelFactory> Criteria<'s, 'c, S, F> {
    pub(crate) fn new(session: &'s mut Session<'c, S, F>, entity: impl Into<String>) -> Self {
        Self {
            session,
            query: CriteriaQuery::new(entity),
        }
    }

    /// Append a criterion.
    pub fn add(mut self, criterion: Criterion) -> Self {
        self.query.criteria.push(criterion);
        self
    }

    /// Limit the number of rows. 0 means unbounded.
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = limit;
        self
    }

    /// Skip rows. Only applies together with a limit.
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = offset;
        self
    }

    /// The underlying query.
    pub fn query(&self) -> &CriteriaQuery {
        &self.query
    }

    /// The SELECT statement this query runs.
    pub fn to_sql(&self) -> Result<String> {
        SqlCompiler::new(self.session.catalog).select(&self.query)
    }

    /// Run the query and materialize every row.
    ///
    /// Materialized instances are added to the session cache.
    pub fn list(&mut self) -> Result<Vec<F::Model>> {
        let catalog = self.session.catalog;
        let meta = catalog.metadata(&self.query.entity)?;
        let sql = SqlCompiler::new(catalog).select(&self.query)?;

        let mut models = Vec::new();
        {
            let mut cursor =
                ScopedCursor::new(self.session.storage.execute_for_result(&sql, true)?);
            let rows = cursor.count();
            if rows > 0 {
                models.reserve(rows);
                while cursor.move_to_next() {
                    let model = self.session.factory.create_from_cursor(&*cursor, &meta)?;
                    trace!(entity = meta.entity(), "row materialized");
                    models.push(model);
                }
            }
        }

        for model in &models {
            self.session.cache(model.clone())?;
        }
        debug!(entity = meta.entity(), rows = models.len(), "criteria list");
        Ok(models)
    }

    /// Run the query expecting at most one row.
    ///
    /// Fails with [`Error::NonUniqueResult`] when more than one row matches.
    pub fn unique(&mut self) -> Result<Option<F::Model>> {
        let catalog = self.session.catalog;
        let meta = catalog.metadata(&self.query.entity)?;
        let sql = SqlCompiler::new(catalog).select(&self.query)?;

        let model = {
            let mut cursor =
                ScopedCursor::new(self.session.storage.execute_for_result(&sql, true)?);
            match cursor.count() {
                0 => None,
                1 => {
                    cursor.move_to_first();
                    Some(self.session.factory.create_from_cursor(&*cursor, &meta)?)
                }
                count => {
                    return Err(Error::NonUniqueResult {
                        entity: self.query.entity.clone(),
                        count,
                    })
                }
            }
        };

        if let Some(model) = &model {
            self.session.cache(model.clone())?;
        }
        debug!(entity = meta.entity(), found = model.is_some(), "criteria unique");
        Ok(model)
    }

    /// Count the rows matching the query.
    pub fn count(&mut self) -> Result<u64> {
        let sql = SqlCompiler::new(self.session.catalog).count(&self.query)?;
        let mut cursor = ScopedCursor::new(self.session.storage.execute_for_result(&sql, false)?);

        if !cursor.move_to_first() {
            return Ok(0);
        }
        let count = cursor.get_long(0)?;
        debug!(entity = %self.query.entity, count, "criteria count");
        u64::try_from(count)
            .map_err(|_| Error::Materialization(format!("negative row count {}", count)))
    }
}
