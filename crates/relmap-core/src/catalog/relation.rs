//! Relationship descriptors derived from association fields.

use super::{Association, ClassMetadata, FieldDef};
use crate::error::{Error, Result};

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// One-to-one relationship (foreign key in the first table).
    OneToOne,
    /// One-to-many relationship (foreign key in the second table).
    OneToMany,
    /// Many-to-many relationship (join table).
    ManyToMany,
}

impl Cardinality {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

/// Variant data carried by a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Foreign key `column` lives in the first participant's table.
    OneToOne {
        /// Foreign key column.
        column: String,
    },
    /// Foreign key `column` lives in the second participant's table.
    OneToMany {
        /// Foreign key column.
        column: String,
    },
    /// Rows are linked through a join table.
    ManyToMany {
        /// Join table name.
        table: String,
    },
}

/// One side of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Entity name.
    pub entity: String,
    /// Table of the entity.
    pub table: String,
    /// Field on the entity that takes part in the relationship.
    pub field: String,
    /// Column used when joining this side.
    pub column: String,
}

impl Participant {
    fn new(meta: &ClassMetadata, field: &str, column: &str) -> Self {
        Self {
            entity: meta.entity().to_string(),
            table: meta.table_name().to_string(),
            field: field.to_string(),
            column: column.to_string(),
        }
    }

    /// Column naming this side inside a join table: `<table>_<column>`.
    pub fn join_column(&self) -> String {
        format!("{}_{}", self.table, self.column)
    }
}

/// A relationship between two entities.
///
/// The entity declaring the association is always `first`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship name.
    pub name: String,
    /// Variant data.
    pub kind: RelationshipKind,
    /// Declaring participant.
    pub first: Participant,
    /// Target participant.
    pub second: Participant,
}

impl Relationship {
    /// Build the descriptor for an association field declared on `owner`.
    pub(crate) fn from_field(
        owner: &ClassMetadata,
        field: &FieldDef,
        target: &ClassMetadata,
    ) -> Result<Self> {
        let association = field.as_association().ok_or_else(|| {
            Error::config(format!(
                "field '{}.{}' is not part of a relationship",
                owner.entity(),
                field.name
            ))
        })?;

        let relationship = match association {
            Association::OneToOne { name, column, .. } => {
                let target_pk = target.primary_key_field();
                Relationship {
                    name: name.clone(),
                    kind: RelationshipKind::OneToOne {
                        column: column.clone(),
                    },
                    first: Participant::new(owner, &field.name, field.column_name()),
                    second: Participant::new(target, &target_pk.name, target_pk.column_name()),
                }
            }
            Association::OneToMany { name, column, .. } => {
                let fk = target.field_for_column(column).ok_or_else(|| {
                    Error::config(format!(
                        "relationship '{}': entity '{}' has no field mapped to column '{}'",
                        name,
                        target.entity(),
                        column
                    ))
                })?;
                Relationship {
                    name: name.clone(),
                    kind: RelationshipKind::OneToMany {
                        column: column.clone(),
                    },
                    first: Participant::new(owner, &field.name, owner.primary_key_column()),
                    second: Participant::new(target, &fk.name, column),
                }
            }
            Association::ManyToMany {
                name,
                table,
                key_field,
                foreign_field,
                ..
            } => {
                let key = side_column(owner, name, key_field)?;
                let foreign = side_column(target, name, foreign_field)?;
                let first = Participant::new(owner, key_field, &key);
                let second = Participant::new(target, foreign_field, &foreign);
                // Both sides share the join table, so their columns must differ.
                if first.join_column() == second.join_column() {
                    return Err(Error::config(format!(
                        "relationship '{}': both sides map to join column '{}' in '{}'",
                        name,
                        first.join_column(),
                        table
                    )));
                }
                Relationship {
                    name: name.clone(),
                    kind: RelationshipKind::ManyToMany {
                        table: table.clone(),
                    },
                    first,
                    second,
                }
            }
        };

        Ok(relationship)
    }

    /// Cardinality of this relationship.
    pub fn cardinality(&self) -> Cardinality {
        match self.kind {
            RelationshipKind::OneToOne { .. } => Cardinality::OneToOne,
            RelationshipKind::OneToMany { .. } => Cardinality::OneToMany,
            RelationshipKind::ManyToMany { .. } => Cardinality::ManyToMany,
        }
    }

    /// Check if this is a many-to-many relationship.
    pub fn is_many_to_many(&self) -> bool {
        matches!(self.kind, RelationshipKind::ManyToMany { .. })
    }

    /// Join table for many-to-many relationships.
    pub fn join_table(&self) -> Option<&str> {
        match &self.kind {
            RelationshipKind::ManyToMany { table } => Some(table),
            _ => None,
        }
    }

    /// Foreign key column for one-to-one and one-to-many relationships.
    pub fn foreign_key_column(&self) -> Option<&str> {
        match &self.kind {
            RelationshipKind::OneToOne { column } | RelationshipKind::OneToMany { column } => {
                Some(column)
            }
            RelationshipKind::ManyToMany { .. } => None,
        }
    }

    /// Check if the entity is one of the two participants.
    pub fn contains(&self, entity: &str) -> bool {
        self.first.entity == entity || self.second.entity == entity
    }

    /// Split into `(own side, other side)` for the given entity.
    ///
    /// The first participant is preferred when both sides are the same entity.
    pub fn sides(&self, entity: &str) -> Result<(&Participant, &Participant)> {
        if self.first.entity == entity {
            Ok((&self.first, &self.second))
        } else if self.second.entity == entity {
            Ok((&self.second, &self.first))
        } else {
            Err(self.mismatch(entity))
        }
    }

    /// Fail unless this relationship has the expected cardinality.
    pub fn expect(&self, expected: Cardinality) -> Result<()> {
        if self.cardinality() == expected {
            Ok(())
        } else {
            Err(Error::WrongRelationshipKind {
                relationship: self.name.clone(),
                actual: self.cardinality().as_str(),
                expected: expected.as_str(),
            })
        }
    }

    pub(crate) fn mismatch(&self, entity: &str) -> Error {
        Error::RelationshipMismatch {
            relationship: self.name.clone(),
            entity: entity.to_string(),
        }
    }
}

fn side_column(meta: &ClassMetadata, relationship: &str, field: &str) -> Result<String> {
    match meta.field(field) {
        Some(f) if f.has_column() => Ok(f.column_name().to_string()),
        _ => Err(Error::config(format!(
            "relationship '{}': '{}.{}' is not a persistent column",
            relationship,
            meta.entity(),
            field
        ))),
    }
}
