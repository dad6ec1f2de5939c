//! Field definitions for entities.

use super::types::{Association, FieldType, PersistenceMode, ScalarType};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Column name override. Defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    /// Explicitly declared primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Primary key values are generated by storage.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether the column accepts NULL.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether the column carries a unique constraint.
    #[serde(default)]
    pub unique: bool,
    /// Persistence mode.
    #[serde(default)]
    pub persistence: PersistenceMode,
}

impl FieldDef {
    /// Create a new nullable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            column: None,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            persistence: PersistenceMode::Persistent,
        }
    }

    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar))
    }

    /// Create a field that is part of a relationship.
    pub fn association(name: impl Into<String>, association: Association) -> Self {
        Self::new(name, FieldType::Association(association))
    }

    /// Map the field to a specific column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Mark as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as an auto-incrementing primary key.
    pub fn auto_increment(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self
    }

    /// Mark as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Exclude from persistence.
    pub fn transient(mut self) -> Self {
        self.persistence = PersistenceMode::Transient;
        self
    }

    /// Check if the field is persistent.
    pub fn is_persistent(&self) -> bool {
        self.persistence == PersistenceMode::Persistent
    }

    /// Column this field maps to.
    ///
    /// A one-to-one association stores its foreign key under the column the
    /// association names unless an explicit override is set.
    pub fn column_name(&self) -> &str {
        if let Some(column) = &self.column {
            return column;
        }
        match &self.field_type {
            FieldType::Association(Association::OneToOne { column, .. }) => column,
            _ => &self.name,
        }
    }

    /// Association, if this field is part of a relationship.
    pub fn as_association(&self) -> Option<&Association> {
        self.field_type.association()
    }

    /// Check if the field occupies a column in the owning table.
    ///
    /// Collection associations live in other tables.
    pub fn has_column(&self) -> bool {
        match &self.field_type {
            FieldType::Scalar(_) => true,
            FieldType::Association(a) => a.has_local_column(),
        }
    }
}
