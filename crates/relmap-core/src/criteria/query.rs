//! Criteria query structure.

use super::Criterion;

/// An ordered list of criteria plus limit and offset.
///
/// A limit of 0 means unbounded; the offset only applies with a positive limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriteriaQuery {
    /// Target entity.
    pub entity: String,
    /// Criteria, combined with AND in insertion order.
    pub criteria: Vec<Criterion>,
    /// Maximum number of rows, 0 for no limit.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

impl CriteriaQuery {
    /// Create a query over all rows of an entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Append a criterion.
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Set the row limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the row offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}
