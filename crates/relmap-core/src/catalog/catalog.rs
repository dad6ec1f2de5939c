//! Catalog: metadata resolution and memoization over a schema bundle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{Cardinality, ClassMetadata, EntityDef, FieldDef, FieldType, Relationship, SchemaBundle};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::model::Entity;
use crate::sql::{Dialect, SqlType, SqliteDialect};
use crate::value::{string_hash, Value};

/// Seed of the identity hash.
const HASH_SEED: i32 = 7;
/// Multiplier of the identity hash.
const HASH_PRIME: i32 = 31;

/// The metadata catalog.
///
/// Owns the schema bundle and lazily resolves per-entity metadata and
/// relationship descriptors. Resolved values are never invalidated.
pub struct Catalog {
    config: CatalogConfig,
    schema: SchemaBundle,
    dialect: Box<dyn Dialect>,
    metadata: RwLock<HashMap<String, Arc<ClassMetadata>>>,
    relationships: RwLock<HashMap<(String, String), Arc<Relationship>>>,
}

impl Catalog {
    /// Create a catalog with the default configuration and SQLite dialect.
    pub fn new(schema: SchemaBundle) -> Self {
        Self::with_config(schema, CatalogConfig::default())
    }

    /// Create a catalog with a specific configuration.
    pub fn with_config(schema: SchemaBundle, config: CatalogConfig) -> Self {
        Self {
            config,
            schema,
            dialect: Box::new(SqliteDialect),
            metadata: RwLock::new(HashMap::new()),
            relationships: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the SQL dialect.
    pub fn with_dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    /// Catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The schema bundle.
    pub fn schema(&self) -> &SchemaBundle {
        &self.schema
    }

    /// The SQL dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Check if the entity is registered as persistent.
    pub fn is_persistent(&self, entity: &str) -> bool {
        self.schema
            .get_entity(entity)
            .is_some_and(EntityDef::is_persistent)
    }

    /// Resolved metadata for an entity.
    pub fn metadata(&self, entity: &str) -> Result<Arc<ClassMetadata>> {
        if let Some(meta) = self.metadata.read().get(entity) {
            return Ok(Arc::clone(meta));
        }

        let def = self
            .schema
            .get_entity(entity)
            .ok_or_else(|| Error::config(format!("unknown entity '{}'", entity)))?;
        let meta = Arc::new(ClassMetadata::resolve(def, &self.config)?);
        debug!(
            entity,
            table = meta.table_name(),
            primary_key = %meta.primary_key_field().name,
            "resolved class metadata"
        );

        let mut cache = self.metadata.write();
        Ok(Arc::clone(
            cache.entry(entity.to_string()).or_insert(meta),
        ))
    }

    /// Table an entity maps to.
    pub fn table_name(&self, entity: &str) -> Result<String> {
        Ok(self.metadata(entity)?.table_name().to_string())
    }

    /// Persistent fields in declaration order.
    pub fn persistent_fields(&self, entity: &str) -> Result<Vec<FieldDef>> {
        Ok(self.metadata(entity)?.fields().to_vec())
    }

    /// Find a persistent field by name.
    pub fn find_field(&self, entity: &str, name: &str) -> Result<Option<FieldDef>> {
        Ok(self.metadata(entity)?.field(name).cloned())
    }

    /// The primary key field of an entity.
    pub fn primary_key_field(&self, entity: &str) -> Result<FieldDef> {
        Ok(self.metadata(entity)?.primary_key_field().clone())
    }

    /// Column a field maps to.
    pub fn column_name(&self, entity: &str, field: &str) -> Result<String> {
        self.metadata(entity)?
            .column_name(field)
            .map(str::to_string)
            .ok_or_else(|| unknown_field(entity, field))
    }

    /// Check if a field accepts NULL.
    pub fn is_nullable(&self, entity: &str, field: &str) -> Result<bool> {
        let meta = self.metadata(entity)?;
        meta.field(field).ok_or_else(|| unknown_field(entity, field))?;
        Ok(meta.is_nullable(field))
    }

    /// Check if a field carries a unique constraint.
    pub fn is_unique(&self, entity: &str, field: &str) -> Result<bool> {
        let meta = self.metadata(entity)?;
        meta.field(field).ok_or_else(|| unknown_field(entity, field))?;
        Ok(meta.is_unique(field))
    }

    /// Fields carrying a unique constraint.
    pub fn unique_fields(&self, entity: &str) -> Result<Vec<FieldDef>> {
        Ok(self
            .metadata(entity)?
            .unique_fields()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Check if related instances of the entity are loaded on demand.
    pub fn is_lazy(&self, entity: &str) -> Result<bool> {
        Ok(self.metadata(entity)?.is_lazy())
    }

    /// Check if relationship operations cascade for the entity.
    pub fn is_cascading(&self, entity: &str) -> Result<bool> {
        Ok(self.metadata(entity)?.is_cascading())
    }

    /// Check if a field is the primary key.
    pub fn is_primary_key(&self, entity: &str, field: &str) -> Result<bool> {
        Ok(self.metadata(entity)?.is_primary_key(field))
    }

    /// Check if a field is an auto-incrementing primary key.
    ///
    /// Fails when auto-increment is declared on a non-integer key.
    pub fn is_auto_increment(&self, entity: &str, field: &str) -> Result<bool> {
        let meta = self.metadata(entity)?;
        let def = meta.field(field).ok_or_else(|| unknown_field(entity, field))?;
        if !def.auto_increment || !meta.is_primary_key(field) {
            return Ok(false);
        }
        match def.field_type.scalar_type() {
            Some(scalar) if scalar.is_integer() => Ok(true),
            _ => Err(Error::config(format!(
                "auto-increment primary key '{}.{}' must be an integer",
                entity, field
            ))),
        }
    }

    /// Storage type of a field.
    ///
    /// Association fields take the storage type of the target's primary key.
    pub fn sql_type(&self, entity: &str, field: &str) -> Result<SqlType> {
        let meta = self.metadata(entity)?;
        let def = meta.field(field).ok_or_else(|| unknown_field(entity, field))?;
        match &def.field_type {
            FieldType::Scalar(scalar) => Ok(self.dialect.storage_type(scalar)),
            FieldType::Association(association) => {
                let target = self.metadata(association.target())?;
                let pk = target.primary_key_field();
                self.sql_type(target.entity(), &pk.name)
            }
        }
    }

    /// Primary key value of an instance, read through its field accessor.
    pub fn primary_key_value(&self, instance: &dyn Entity) -> Result<Value> {
        let meta = self.metadata(instance.entity_name())?;
        Ok(instance
            .field_value(&meta.primary_key_field().name)
            .unwrap_or(Value::Null))
    }

    /// Check if an instance has no primary key yet.
    pub fn is_pk_null_or_zero(&self, instance: &dyn Entity) -> Result<bool> {
        let pk = self.primary_key_value(instance)?;
        Ok(pk.is_null() || pk.is_zero())
    }

    /// Identity hash of an instance, used as the session cache key.
    pub fn compute_hash(&self, instance: &dyn Entity) -> Result<i32> {
        let pk = self.primary_key_value(instance)?;
        Ok(self.hash_key(instance.entity_name(), &pk))
    }

    /// Identity hash for an entity and primary key value.
    pub fn hash_key(&self, entity: &str, pk: &Value) -> i32 {
        let hash = HASH_PRIME
            .wrapping_mul(HASH_SEED)
            .wrapping_add(string_hash(entity));
        if pk.is_null() {
            hash
        } else {
            hash.wrapping_mul(HASH_PRIME)
                .wrapping_add(pk.identity_hash())
        }
    }

    /// Check if an instance is the one identified by `entity` and `pk`.
    ///
    /// Identity hashes collide, so a cache hit is confirmed with this before
    /// it is handed out. Integer keys compare by numeric value.
    pub fn has_identity(&self, instance: &dyn Entity, entity: &str, pk: &Value) -> bool {
        if instance.entity_name() != entity {
            return false;
        }
        match self.primary_key_value(instance) {
            Ok(own) => match (own.as_i64(), pk.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => own == *pk,
            },
            Err(_) => false,
        }
    }

    /// Check if a field is part of a relationship.
    pub fn is_relationship(&self, entity: &str, field: &str) -> Result<bool> {
        let meta = self.metadata(entity)?;
        let def = meta.field(field).ok_or_else(|| unknown_field(entity, field))?;
        Ok(def.as_association().is_some())
    }

    /// Relationship descriptor for an association field.
    pub fn relationship(&self, entity: &str, field: &str) -> Result<Arc<Relationship>> {
        let key = (entity.to_string(), field.to_string());
        if let Some(rel) = self.relationships.read().get(&key) {
            return Ok(Arc::clone(rel));
        }

        let owner = self.metadata(entity)?;
        let def = owner.field(field).ok_or_else(|| unknown_field(entity, field))?;
        let target_name = def
            .as_association()
            .map(|a| a.target())
            .ok_or_else(|| {
                Error::config(format!(
                    "field '{}.{}' is not part of a relationship",
                    entity, field
                ))
            })?;
        let target = self.metadata(target_name).map_err(|e| {
            Error::config(format!(
                "relationship on '{}.{}' targets an unresolvable entity: {}",
                entity, field, e
            ))
        })?;

        let rel = Arc::new(Relationship::from_field(&owner, def, &target)?);
        debug!(
            relationship = %rel.name,
            kind = rel.cardinality().as_str(),
            first = %rel.first.entity,
            second = %rel.second.entity,
            "resolved relationship"
        );

        let mut cache = self.relationships.write();
        Ok(Arc::clone(cache.entry(key).or_insert(rel)))
    }

    /// Field through which an entity takes part in a relationship.
    pub fn find_relationship_field(
        &self,
        entity: &str,
        relationship: &Relationship,
    ) -> Result<FieldDef> {
        let (own, _) = relationship.sides(entity)?;
        self.metadata(entity)?
            .field(&own.field)
            .cloned()
            .ok_or_else(|| unknown_field(entity, &own.field))
    }

    /// All relationships declared by an entity.
    pub fn declared_relationships(&self, entity: &str) -> Result<Vec<Arc<Relationship>>> {
        let meta = self.metadata(entity)?;
        meta.fields()
            .iter()
            .filter(|f| f.as_association().is_some())
            .map(|f| self.relationship(entity, &f.name))
            .collect()
    }

    /// Many-to-many relationships that include the entity, from either side.
    pub fn many_to_many_relationships(&self, entity: &str) -> Result<Vec<Arc<Relationship>>> {
        Ok(self
            .all_many_to_many()?
            .into_iter()
            .filter(|rel| rel.contains(entity))
            .collect())
    }

    /// All many-to-many relationships in the schema, one per join table.
    pub fn all_many_to_many(&self) -> Result<Vec<Arc<Relationship>>> {
        let names: Vec<String> = self
            .schema
            .entities
            .iter()
            .filter(|e| e.is_persistent())
            .map(|e| e.name.clone())
            .collect();
        self.many_to_many_among(&names)
    }

    /// Many-to-many relationships declared by the given entities, one per join table.
    pub(crate) fn many_to_many_among(&self, entities: &[String]) -> Result<Vec<Arc<Relationship>>> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for entity in entities {
            for rel in self.declared_relationships(entity)? {
                if rel.cardinality() != Cardinality::ManyToMany {
                    continue;
                }
                let table = rel.join_table().unwrap_or_default().to_string();
                if !seen.contains(&table) {
                    seen.push(table);
                    out.push(rel);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .field("entities", &self.schema.entity_names())
            .field("dialect", &self.dialect.name())
            .finish()
    }
}

fn unknown_field(entity: &str, field: &str) -> Error {
    Error::config(format!(
        "'{}' is not a persistent field of '{}'",
        field, entity
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Association, ScalarType};
    use crate::model::Record;

    fn schema() -> SchemaBundle {
        SchemaBundle::new()
            .with_entity(
                EntityDef::new("User")
                    .with_table("users")
                    .with_field(FieldDef::scalar("id", ScalarType::Int64).auto_increment())
                    .with_field(FieldDef::scalar("name", ScalarType::String).unique())
                    .with_field(FieldDef::association(
                        "groups",
                        Association::ManyToMany {
                            name: "user_groups".into(),
                            target: "Group".into(),
                            table: "user_group".into(),
                            key_field: "id".into(),
                            foreign_field: "id".into(),
                        },
                    ))
                    .cascading(),
            )
            .with_entity(
                EntityDef::new("Group")
                    .with_table("groups")
                    .with_field(FieldDef::scalar("id", ScalarType::String))
                    .with_field(FieldDef::association(
                        "members",
                        Association::ManyToMany {
                            name: "group_users".into(),
                            target: "User".into(),
                            table: "user_group".into(),
                            key_field: "id".into(),
                            foreign_field: "id".into(),
                        },
                    ))
                    .lazy(),
            )
    }

    #[test]
    fn test_metadata_is_memoized() {
        let catalog = Catalog::new(schema());
        let a = catalog.metadata("User").unwrap();
        let b = catalog.metadata("User").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_entity_is_configuration_error() {
        let catalog = Catalog::new(schema());
        assert!(!catalog.is_persistent("Missing"));
        assert!(catalog.table_name("Missing").unwrap_err().is_configuration());
    }

    #[test]
    fn test_flags() {
        let catalog = Catalog::new(schema());
        assert!(catalog.is_cascading("User").unwrap());
        assert!(!catalog.is_lazy("User").unwrap());
        assert!(catalog.is_lazy("Group").unwrap());
        assert!(catalog.is_unique("User", "name").unwrap());
        assert!(catalog.is_auto_increment("User", "id").unwrap());
        assert!(!catalog.is_auto_increment("User", "name").unwrap());
        assert!(catalog.is_relationship("User", "groups").unwrap());
        assert!(!catalog.is_relationship("User", "name").unwrap());
    }

    #[test]
    fn test_auto_increment_requires_integer_key() {
        let catalog = Catalog::new(SchemaBundle::new().with_entity(
            EntityDef::new("Slug").with_field(FieldDef::scalar("id", ScalarType::String).auto_increment()),
        ));
        assert!(catalog
            .is_auto_increment("Slug", "id")
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_sql_type_of_association_follows_target_key() {
        let catalog = Catalog::new(schema());
        assert_eq!(catalog.sql_type("User", "id").unwrap(), SqlType::Integer);
        assert_eq!(catalog.sql_type("User", "groups").unwrap(), SqlType::Text);
    }

    #[test]
    fn test_compute_hash() {
        let catalog = Catalog::new(schema());
        let user = Record::new("User").with("id", 42i64).with("name", "ada");

        let base = 31i32
            .wrapping_mul(7)
            .wrapping_add(string_hash("User"));
        let expected = base.wrapping_mul(31).wrapping_add(42);

        assert_eq!(catalog.compute_hash(&user).unwrap(), expected);
        assert_eq!(catalog.compute_hash(&user).unwrap(), expected);

        // Same identity regardless of the integer width the key was read as.
        let narrow = Record::new("User").with("id", 42i32);
        assert_eq!(catalog.compute_hash(&narrow).unwrap(), expected);

        let unsaved = Record::new("User").with("name", "ada");
        assert_eq!(catalog.compute_hash(&unsaved).unwrap(), base);
        assert!(catalog.is_pk_null_or_zero(&unsaved).unwrap());
    }

    #[test]
    fn test_has_identity_tells_colliding_keys_apart() {
        let catalog = Catalog::new(schema());
        let small = Record::new("User").with("id", 1i64);
        let big = Record::new("User").with("id", 1i64 << 32);

        assert_eq!(
            catalog.compute_hash(&small).unwrap(),
            catalog.compute_hash(&big).unwrap()
        );
        assert!(catalog.has_identity(&small, "User", &Value::Int32(1)));
        assert!(!catalog.has_identity(&big, "User", &Value::Int32(1)));
        assert!(!catalog.has_identity(&small, "Group", &Value::Int64(1)));
    }

    #[test]
    fn test_many_to_many_is_distinct_by_join_table() {
        let catalog = Catalog::new(schema());

        let all = catalog.all_many_to_many().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].join_table(), Some("user_group"));

        assert_eq!(catalog.many_to_many_relationships("Group").unwrap().len(), 1);
    }

    #[test]
    fn test_find_relationship_field() {
        let catalog = Catalog::new(schema());
        let rel = catalog.relationship("User", "groups").unwrap();

        assert_eq!(catalog.find_relationship_field("User", &rel).unwrap().name, "id");
        assert!(matches!(
            catalog.find_relationship_field("Post", &rel),
            Err(Error::RelationshipMismatch { .. })
        ));
    }

    #[test]
    fn test_unresolvable_relationship_target() {
        let catalog = Catalog::new(SchemaBundle::new().with_entity(
            EntityDef::new("User")
                .with_field(FieldDef::scalar("id", ScalarType::Int64))
                .with_field(FieldDef::association(
                    "ghost",
                    Association::OneToOne {
                        name: "user_ghost".into(),
                        target: "Ghost".into(),
                        column: "ghost_id".into(),
                    },
                )),
        ));
        assert!(catalog
            .relationship("User", "ghost")
            .unwrap_err()
            .is_configuration());
    }
}
