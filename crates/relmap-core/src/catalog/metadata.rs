//! Resolved per-entity persistence metadata.

use std::collections::HashMap;

use super::{EntityDef, FieldDef};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// Persistence metadata for one entity, resolved once and then shared.
#[derive(Debug, Clone)]
pub struct ClassMetadata {
    entity: String,
    table: String,
    fields: Vec<FieldDef>,
    primary_key: usize,
    by_name: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
    lazy: bool,
    cascading: bool,
}

impl ClassMetadata {
    /// Resolve metadata for a persistent entity definition.
    ///
    /// Fails with a configuration error when the primary key cannot be
    /// resolved to exactly one scalar field.
    pub fn resolve(def: &EntityDef, config: &CatalogConfig) -> Result<Self> {
        if !def.is_persistent() {
            return Err(Error::config(format!(
                "entity '{}' is not persistent",
                def.name
            )));
        }

        let fields: Vec<FieldDef> = def.persistent_fields().cloned().collect();
        if fields.is_empty() {
            return Err(Error::config(format!(
                "entity '{}' has no persistent fields",
                def.name
            )));
        }

        let primary_key = resolve_primary_key(&def.name, &fields, config)?;

        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_column = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(Error::config(format!(
                    "entity '{}' declares field '{}' twice",
                    def.name, field.name
                )));
            }
            if field.has_column() {
                by_column.insert(field.column_name().to_string(), idx);
            }
        }

        Ok(Self {
            entity: def.name.clone(),
            table: def.table_name(),
            fields,
            primary_key,
            by_name,
            by_column,
            lazy: def.lazy,
            cascading: def.cascading,
        })
    }

    /// Entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Persistent fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Persistent fields that occupy a column in this table.
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.has_column())
    }

    /// Look up a persistent field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    /// Look up the persistent field mapped to a column.
    pub fn field_for_column(&self, column: &str) -> Option<&FieldDef> {
        self.by_column.get(column).map(|&idx| &self.fields[idx])
    }

    /// Column a persistent field maps to.
    pub fn column_name(&self, field: &str) -> Option<&str> {
        self.field(field).map(FieldDef::column_name)
    }

    /// The primary key field.
    pub fn primary_key_field(&self) -> &FieldDef {
        &self.fields[self.primary_key]
    }

    /// Column of the primary key.
    pub fn primary_key_column(&self) -> &str {
        self.primary_key_field().column_name()
    }

    /// Check if a field is the primary key.
    pub fn is_primary_key(&self, field: &str) -> bool {
        self.by_name.get(field) == Some(&self.primary_key)
    }

    /// Check if a field accepts NULL. The primary key never does.
    pub fn is_nullable(&self, field: &str) -> bool {
        !self.is_primary_key(field) && self.field(field).is_some_and(|f| f.nullable)
    }

    /// Check if a field carries a unique constraint.
    pub fn is_unique(&self, field: &str) -> bool {
        self.field(field).is_some_and(|f| f.unique)
    }

    /// Fields carrying a unique constraint.
    pub fn unique_fields(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.unique).collect()
    }

    /// Check if related instances are loaded on demand.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Check if saves and deletes cascade through relationships.
    pub fn is_cascading(&self) -> bool {
        self.cascading
    }
}

/// An explicit primary key wins; otherwise a single field matching the
/// configured implicit name is used.
fn resolve_primary_key(entity: &str, fields: &[FieldDef], config: &CatalogConfig) -> Result<usize> {
    let explicit: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.primary_key)
        .map(|(idx, _)| idx)
        .collect();

    let idx = match explicit.as_slice() {
        [idx] => *idx,
        [] => {
            let inferred: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|(_, f)| config.is_implicit_primary_key(&f.name))
                .map(|(idx, _)| idx)
                .collect();
            match inferred.as_slice() {
                [idx] => *idx,
                [] => {
                    return Err(Error::config(format!(
                        "entity '{}' has no primary key field",
                        entity
                    )))
                }
                _ => {
                    return Err(Error::config(format!(
                        "entity '{}' has {} fields matching the implicit primary key '{}'",
                        entity,
                        inferred.len(),
                        config.primary_key_name
                    )))
                }
            }
        }
        _ => {
            return Err(Error::config(format!(
                "entity '{}' declares {} primary key fields",
                entity,
                explicit.len()
            )))
        }
    };

    if fields[idx].field_type.scalar_type().is_none() {
        return Err(Error::config(format!(
            "primary key '{}' of entity '{}' must be a scalar field",
            fields[idx].name, entity
        )));
    }

    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    fn user() -> EntityDef {
        EntityDef::new("User")
            .with_table("users")
            .with_field(FieldDef::scalar("ID", ScalarType::Int64))
            .with_field(FieldDef::scalar("email", ScalarType::String).unique().not_null())
            .with_field(FieldDef::scalar("nickname", ScalarType::String).with_column("nick"))
            .with_field(FieldDef::scalar("scratch", ScalarType::String).transient())
    }

    #[test]
    fn test_resolve_inferred_primary_key() {
        let meta = ClassMetadata::resolve(&user(), &CatalogConfig::default()).unwrap();

        assert_eq!(meta.table_name(), "users");
        assert_eq!(meta.primary_key_field().name, "ID");
        assert_eq!(meta.fields().len(), 3);
        assert!(meta.field("scratch").is_none());
    }

    #[test]
    fn test_explicit_primary_key_wins() {
        let def = EntityDef::new("Tag")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("slug", ScalarType::String).primary_key());
        let meta = ClassMetadata::resolve(&def, &CatalogConfig::default()).unwrap();

        assert_eq!(meta.primary_key_field().name, "slug");
        assert!(meta.is_primary_key("slug"));
        assert!(!meta.is_primary_key("id"));
    }

    #[test]
    fn test_duplicate_primary_key_is_configuration_error() {
        let def = EntityDef::new("Tag")
            .with_field(FieldDef::scalar("a", ScalarType::Int64).primary_key())
            .with_field(FieldDef::scalar("b", ScalarType::Int64).primary_key());
        let err = ClassMetadata::resolve(&def, &CatalogConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_primary_key_is_configuration_error() {
        let def = EntityDef::new("Tag").with_field(FieldDef::scalar("slug", ScalarType::String));
        let err = ClassMetadata::resolve(&def, &CatalogConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_case_sensitive_inference() {
        let config = CatalogConfig::default().case_sensitive();
        let err = ClassMetadata::resolve(&user(), &config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_column_lookups() {
        let meta = ClassMetadata::resolve(&user(), &CatalogConfig::default()).unwrap();

        assert_eq!(meta.column_name("nickname"), Some("nick"));
        assert_eq!(meta.field_for_column("nick").unwrap().name, "nickname");
        assert!(meta.is_unique("email"));
        assert!(!meta.is_nullable("email"));
        assert!(meta.is_nullable("nickname"));
        assert!(!meta.is_nullable("ID"));
        assert_eq!(meta.unique_fields().len(), 1);
    }
}
