//! relmap core - metadata catalog, SQL compiler, criteria queries and session cache.
//!
//! A [`Catalog`] is built once from a declarative [`SchemaBundle`]. The
//! [`SqlCompiler`] turns catalog metadata, relationships and criteria into SQL
//! text, and a [`Session`] runs criteria queries through a storage
//! collaborator, caching materialized instances by identity hash.

pub mod catalog;
pub mod config;
pub mod criteria;
pub mod error;
pub mod model;
pub mod session;
pub mod sql;
pub mod value;

pub use catalog::{
    Association, Cardinality, Catalog, ClassMetadata, EntityDef, FieldDef, FieldType,
    Participant, PersistenceMode, Relationship, RelationshipKind, ScalarType, SchemaBundle,
};
pub use config::{CatalogConfig, FullCachePolicy, SessionConfig};
pub use criteria::{CompareOp, Criteria, CriteriaQuery, Criterion};
pub use error::{Error, Result};
pub use model::{Entity, Lazy, Record};
pub use session::{
    CacheStats, Cursor, ModelFactory, RecordFactory, Session, SessionCache, StorageSession,
};
pub use sql::{Dialect, SqlCompiler, SqlType, SqliteDialect};
pub use value::Value;
