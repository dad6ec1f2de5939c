//! Criteria queries: predicates, query structure and execution.

mod criterion;
mod engine;
mod query;

pub use criterion::{CompareOp, Criterion};
pub use engine::Criteria;
pub use query::CriteriaQuery;
