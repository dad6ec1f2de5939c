//! Metadata catalog for relmap.
//!
//! The catalog turns a declarative [`SchemaBundle`] into resolved per-entity
//! metadata and relationship descriptors.

mod catalog;
mod entity;
mod field;
mod metadata;
mod relation;
mod schema;
mod types;

pub use catalog::Catalog;
pub use entity::EntityDef;
pub use field::FieldDef;
pub use metadata::ClassMetadata;
pub use relation::{Cardinality, Participant, Relationship, RelationshipKind};
pub use schema::SchemaBundle;
pub use types::{Association, FieldType, PersistenceMode, ScalarType};
