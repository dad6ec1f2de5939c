//! Session: storage collaborator, model factory and object cache over a catalog.

use tracing::{debug, info};

use super::cache::{CacheStats, SessionCache};
use super::storage::{Cursor, ModelFactory, ScopedCursor, StorageSession};
use crate::catalog::{Cardinality, Catalog};
use crate::config::SessionConfig;
use crate::criteria::{Criteria, Criterion};
use crate::error::Result;
use crate::model::{Entity, Lazy};
use crate::sql::SqlCompiler;
use crate::value::Value;

/// A unit of work against one storage session.
///
/// Single caller: the session is driven by one logical thread end to end.
pub struct Session<'c, S: StorageSession, F: ModelFactory> {
    pub(crate) catalog: &'c Catalog,
    pub(crate) storage: S,
    pub(crate) factory: F,
    cache: SessionCache<F::Model>,
}

impl<'c, S: StorageSession, F: ModelFactory> Session<'c, S, F> {
    /// Create a session with the default configuration.
    pub fn new(catalog: &'c Catalog, storage: S, factory: F) -> Self {
        Self::with_config(catalog, storage, factory, SessionConfig::default())
    }

    /// Create a session with a specific configuration.
    pub fn with_config(catalog: &'c Catalog, storage: S, factory: F, config: SessionConfig) -> Self {
        Self {
            catalog,
            storage,
            factory,
            cache: SessionCache::new(config.cache_capacity, config.full_cache_policy),
        }
    }

    /// The catalog this session resolves metadata through.
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// The storage collaborator.
    pub fn storage(&mut self) -> &mut S {
        &mut self.storage
    }

    /// A compiler over this session's catalog.
    pub fn compiler(&self) -> SqlCompiler<'c> {
        SqlCompiler::new(self.catalog)
    }

    /// Start a criteria query over an entity.
    pub fn criteria(&mut self, entity: impl Into<String>) -> Criteria<'_, 'c, S, F> {
        Criteria::new(self, entity)
    }

    /// Load an instance by primary key, consulting the cache first.
    pub fn load(&mut self, entity: &str, pk: impl Into<Value>) -> Result<Option<F::Model>> {
        let pk = pk.into();
        let key = self.catalog.hash_key(entity, &pk);
        let catalog = self.catalog;
        if let Some(hit) = self.cache.get(key) {
            if catalog.has_identity(hit, entity, &pk) {
                debug!(entity, key, "session cache hit");
                return Ok(Some(hit.clone()));
            }
            debug!(entity, key, "session cache hash collision");
        }

        let pk_field = self.catalog.primary_key_field(entity)?.name;
        self.criteria(entity)
            .add(Criterion::eq(pk_field, pk))
            .unique()
    }

    /// Materialize a deferred instance through this session.
    pub fn load_lazy<'l>(&mut self, lazy: &'l mut Lazy<F::Model>) -> Result<Option<&'l F::Model>> {
        lazy.load(|entity, key| self.load(entity, key.clone()))
    }

    /// Instances on the other side of a many-to-many relationship.
    pub fn many_to_many_related(&mut self, entity: &dyn Entity, field: &str) -> Result<Vec<F::Model>> {
        let rel = self.catalog.relationship(entity.entity_name(), field)?;
        rel.expect(Cardinality::ManyToMany)?;
        let (own, other) = rel.sides(entity.entity_name())?;
        let key = entity.field_value(&own.field).unwrap_or(Value::Null);
        let sql = self.compiler().many_to_many_join(&rel, &key, &other.entity)?;
        let meta = self.catalog.metadata(&other.entity)?;

        let mut models = Vec::new();
        {
            let mut cursor = ScopedCursor::new(self.storage.execute_for_result(&sql, true)?);
            while cursor.move_to_next() {
                models.push(self.factory.create_from_cursor(&*cursor, &meta)?);
            }
        }
        for model in &models {
            self.cache(model.clone())?;
        }
        Ok(models)
    }

    /// Add an instance to the session cache.
    ///
    /// Returns false if the cache refused it.
    pub fn cache(&mut self, instance: F::Model) -> Result<bool> {
        let key = self.catalog.compute_hash(&instance)?;
        let cached = self.cache.insert(key, instance);
        debug!(key, cached, "session cache insert");
        Ok(cached)
    }

    /// Check if an instance with the same identity is cached.
    pub fn is_cached(&self, instance: &dyn Entity) -> Result<bool> {
        Ok(self.cache.contains(self.catalog.compute_hash(instance)?))
    }

    /// Get the cached instance of an entity with the given primary key.
    pub fn get_cached(&mut self, entity: &str, pk: &Value) -> Option<&F::Model> {
        let key = self.catalog.hash_key(entity, pk);
        let catalog = self.catalog;
        self.cache
            .get(key)
            .filter(|hit| catalog.has_identity(*hit, entity, pk))
    }

    /// Drop every cached instance.
    pub fn clear_cache(&mut self) {
        debug!(entries = self.cache.len(), "session cache cleared");
        self.cache.clear();
    }

    /// Number of cached instances.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Session cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Create tables for every persistent entity. Returns the statement count.
    pub fn create_tables(&mut self) -> Result<usize> {
        let entities = self.catalog.schema().entity_names();
        let statements = self.compiler().create_tables(&entities)?;
        self.execute_all(&statements)?;
        info!(statements = statements.len(), "created tables");
        Ok(statements.len())
    }

    /// Drop tables for every persistent entity. Returns the statement count.
    pub fn drop_tables(&mut self) -> Result<usize> {
        let entities = self.catalog.schema().entity_names();
        let statements = self.compiler().drop_tables(&entities)?;
        self.execute_all(&statements)?;
        info!(statements = statements.len(), "dropped tables");
        Ok(statements.len())
    }

    /// Run a statement that returns no rows.
    pub fn execute(&mut self, sql: &str) -> Result<usize> {
        debug!(sql, "execute");
        self.storage.execute(sql)
    }

    /// Insert an instance. Instances with a known key are cached.
    pub fn save(&mut self, instance: &F::Model) -> Result<usize> {
        let sql = self.compiler().insert(instance)?;
        let rows = self.execute(&sql)?;
        if !self.catalog.is_pk_null_or_zero(instance)? {
            self.cache(instance.clone())?;
        }
        Ok(rows)
    }

    /// Update an instance's row and refresh its cache entry.
    ///
    /// Nothing is executed when the primary key is the only column.
    pub fn update(&mut self, instance: &F::Model) -> Result<usize> {
        let rows = match self.compiler().update(instance)? {
            Some(sql) => self.execute(&sql)?,
            None => 0,
        };
        self.cache(instance.clone())?;
        Ok(rows)
    }

    /// Delete an instance's row and its many-to-many links.
    pub fn delete(&mut self, instance: &F::Model) -> Result<usize> {
        let entity = instance.entity_name().to_string();
        for rel in self.catalog.many_to_many_relationships(&entity)? {
            let sql = self.compiler().many_to_many_delete(instance, &rel)?;
            self.execute(&sql)?;
        }

        let sql = self.compiler().delete(instance)?;
        let rows = self.execute(&sql)?;
        let key = self.catalog.compute_hash(instance)?;
        self.cache.remove(key);
        Ok(rows)
    }

    /// Point the foreign key of the related rows of a one-to-many field at `owner`.
    pub fn link_one_to_many(
        &mut self,
        owner: &dyn Entity,
        field: &str,
        related_keys: &[Value],
    ) -> Result<usize> {
        let rel = self.catalog.relationship(owner.entity_name(), field)?;
        match self.compiler().update_foreign_key(&rel, owner, related_keys)? {
            Some(sql) => self.execute(&sql),
            None => Ok(0),
        }
    }

    /// Point the one-to-one foreign key of `owner` at `related`.
    pub fn link_one_to_one(
        &mut self,
        owner: &dyn Entity,
        field: &str,
        related: &dyn Entity,
    ) -> Result<usize> {
        let rel = self.catalog.relationship(owner.entity_name(), field)?;
        let sql = self
            .compiler()
            .update_one_to_one_foreign_key(&rel, owner, related)?;
        self.execute(&sql)
    }

    /// Make the join table rows of `entity` match exactly `related_keys`.
    ///
    /// Returns the number of rows removed plus rows added.
    pub fn reconcile_many_to_many(
        &mut self,
        entity: &dyn Entity,
        field: &str,
        related_keys: &[Value],
    ) -> Result<usize> {
        let rel = self.catalog.relationship(entity.entity_name(), field)?;
        let compiler = self.compiler();

        let mut rows = self.execute(&compiler.delete_stale_relationships(&rel, entity, related_keys)?)?;
        for key in related_keys {
            rows += self.execute(&compiler.many_to_many_insert(&rel, entity, key)?)?;
        }
        debug!(relationship = %rel.name, rows, "reconciled many-to-many links");
        Ok(rows)
    }

    fn execute_all(&mut self, statements: &[String]) -> Result<()> {
        for sql in statements {
            self.execute(sql)?;
        }
        Ok(())
    }
}

impl<'c, S: StorageSession, F: ModelFactory> std::fmt::Debug for Session<'c, S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cached", &self.cache.len())
            .field("capacity", &self.cache.capacity())
            .finish()
    }
}
