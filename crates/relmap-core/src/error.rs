//! Core error types.

use thiserror::Error;

/// Errors raised by the catalog, the SQL compiler and the criteria engine.
///
/// Metadata failures are static mapping defects and are never retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Static mapping defect: missing or duplicate primary key, unknown entity,
    /// unresolvable relationship participant.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A criterion references a field that is not persistent on the target entity.
    #[error("invalid criteria: '{field}' is not a persistent field of '{entity}'")]
    InvalidCriteria {
        /// Entity the query targets.
        entity: String,
        /// Field name that failed to resolve.
        field: String,
    },

    /// An entity was used with a relationship it does not participate in.
    #[error("relationship '{relationship}' does not include '{entity}'")]
    RelationshipMismatch {
        /// Relationship name.
        relationship: String,
        /// Entity that is not a participant.
        entity: String,
    },

    /// A relationship of the wrong cardinality was supplied.
    #[error("relationship '{relationship}' is {actual}, expected {expected}")]
    WrongRelationshipKind {
        /// Relationship name.
        relationship: String,
        /// Kind that was supplied.
        actual: &'static str,
        /// Kind the operation requires.
        expected: &'static str,
    },

    /// `unique()` matched more than one row.
    #[error("expected at most one result for '{entity}', found {count}")]
    NonUniqueResult {
        /// Entity the query targets.
        entity: String,
        /// Number of matching rows.
        count: usize,
    },

    /// Failure reported by the storage session collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// A row could not be turned into a model instance.
    #[error("materialization error: {0}")]
    Materialization(String),
}

/// Result alias used throughout relmap.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Check if this error is a static configuration defect.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
