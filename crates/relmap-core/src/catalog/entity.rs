//! Entity definitions.

use super::field::FieldDef;
use super::types::PersistenceMode;
use serde::{Deserialize, Serialize};

/// An entity definition: the declarative description of one domain class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within the schema). Acts as the class identity.
    pub name: String,
    /// Table name override. Defaults to the lower-cased entity name.
    #[serde(default)]
    pub table: Option<String>,
    /// Field definitions in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Related instances are loaded on demand.
    #[serde(default)]
    pub lazy: bool,
    /// Saves and deletes cascade through relationships.
    #[serde(default)]
    pub cascading: bool,
    /// Persistence mode.
    #[serde(default)]
    pub persistence: PersistenceMode,
}

impl EntityDef {
    /// Create a new persistent entity definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            lazy: false,
            cascading: false,
            persistence: PersistenceMode::Persistent,
        }
    }

    /// Map the entity to a specific table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Enable lazy loading.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Enable cascading.
    pub fn cascading(mut self) -> Self {
        self.cascading = true;
        self
    }

    /// Exclude the entity from persistence.
    pub fn transient(mut self) -> Self {
        self.persistence = PersistenceMode::Transient;
        self
    }

    /// Check if the entity is persistent.
    pub fn is_persistent(&self) -> bool {
        self.persistence == PersistenceMode::Persistent
    }

    /// Table this entity maps to.
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Persistent fields in declaration order.
    pub fn persistent_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_persistent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    #[test]
    fn test_entity_builder() {
        let entity = EntityDef::new("User")
            .with_field(FieldDef::scalar("id", ScalarType::Int64).primary_key())
            .with_field(FieldDef::scalar("name", ScalarType::String))
            .with_field(FieldDef::scalar("scratch", ScalarType::String).transient())
            .lazy();

        assert_eq!(entity.name, "User");
        assert_eq!(entity.fields.len(), 3);
        assert_eq!(entity.persistent_fields().count(), 2);
        assert!(entity.lazy);
        assert!(!entity.cascading);
    }

    #[test]
    fn test_table_name() {
        assert_eq!(EntityDef::new("BlogPost").table_name(), "blogpost");
        assert_eq!(
            EntityDef::new("BlogPost").with_table("posts").table_name(),
            "posts"
        );
    }

    #[test]
    fn test_get_field() {
        let entity = EntityDef::new("User")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("name", ScalarType::String));

        assert!(entity.get_field("id").is_some());
        assert!(entity.get_field("nonexistent").is_none());
    }
}
