//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};

/// Scalar data types a field can be mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
}

/// Whether a class or field takes part in persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PersistenceMode {
    /// Mapped to storage.
    #[default]
    Persistent,
    /// Ignored by the catalog.
    Transient,
}

/// An association declared on a field.
///
/// The declaring entity is always the "first" participant of the resulting
/// relationship and `target` the "second".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Association {
    /// One-to-one: the foreign key `column` lives in the declaring table.
    OneToOne {
        /// Relationship name.
        name: String,
        /// Target entity name.
        target: String,
        /// Foreign key column in the declaring table.
        column: String,
    },
    /// One-to-many: the foreign key `column` lives in the target table.
    OneToMany {
        /// Relationship name.
        name: String,
        /// Target entity name (the "many" side).
        target: String,
        /// Foreign key column in the target table.
        column: String,
    },
    /// Many-to-many through a join table.
    ManyToMany {
        /// Relationship name.
        name: String,
        /// Target entity name.
        target: String,
        /// Join table name.
        table: String,
        /// Field on the declaring entity whose value is stored in the join table.
        key_field: String,
        /// Field on the target entity whose value is stored in the join table.
        foreign_field: String,
    },
}

/// Field types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar column.
    Scalar(ScalarType),
    /// A field that is part of a relationship.
    Association(Association),
}

impl ScalarType {
    /// Check if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, ScalarType::Int32 | ScalarType::Int64)
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float32 | ScalarType::Float64
        )
    }
}

impl Association {
    /// Relationship name.
    pub fn name(&self) -> &str {
        match self {
            Association::OneToOne { name, .. }
            | Association::OneToMany { name, .. }
            | Association::ManyToMany { name, .. } => name,
        }
    }

    /// Target entity name.
    pub fn target(&self) -> &str {
        match self {
            Association::OneToOne { target, .. }
            | Association::OneToMany { target, .. }
            | Association::ManyToMany { target, .. } => target,
        }
    }

    /// Check if the association stores a column in the declaring table.
    pub fn has_local_column(&self) -> bool {
        matches!(self, Association::OneToOne { .. })
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Get the scalar type if this is a scalar field.
    pub fn scalar_type(&self) -> Option<&ScalarType> {
        match self {
            FieldType::Scalar(s) => Some(s),
            FieldType::Association(_) => None,
        }
    }

    /// Get the association if this field is part of a relationship.
    pub fn association(&self) -> Option<&Association> {
        match self {
            FieldType::Association(a) => Some(a),
            FieldType::Scalar(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_checks() {
        assert!(ScalarType::Int32.is_integer());
        assert!(ScalarType::Int64.is_integer());
        assert!(!ScalarType::Float64.is_integer());
        assert!(ScalarType::Float64.is_numeric());
        assert!(!ScalarType::String.is_numeric());
    }

    #[test]
    fn test_association_accessors() {
        let assoc = Association::ManyToMany {
            name: "user_tags".into(),
            target: "Tag".into(),
            table: "user_tag".into(),
            key_field: "id".into(),
            foreign_field: "id".into(),
        };
        assert_eq!(assoc.name(), "user_tags");
        assert_eq!(assoc.target(), "Tag");
        assert!(!assoc.has_local_column());

        let field_type = FieldType::Association(assoc);
        assert!(field_type.scalar_type().is_none());
        assert!(field_type.association().is_some());
    }

    #[test]
    fn test_association_json_shape() {
        let assoc: Association = serde_json::from_str(
            r#"{"OneToOne":{"name":"profile","target":"Profile","column":"profile_id"}}"#,
        )
        .unwrap();
        assert!(assoc.has_local_column());
        assert_eq!(assoc.target(), "Profile");
    }
}
