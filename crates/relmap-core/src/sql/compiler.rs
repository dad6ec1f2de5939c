//! SQL compiler: turns catalog metadata, relationships and criteria queries
//! into SQL text.

use tracing::debug;

use super::literal::{render, render_list, render_own};
use crate::catalog::{Cardinality, Catalog, ClassMetadata, Relationship};
use crate::criteria::CriteriaQuery;
use crate::error::{Error, Result};
use crate::model::Entity;
use crate::value::Value;

/// Compiles SQL statements against a catalog.
///
/// All functions are pure string generation; nothing is executed.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'a> {
    catalog: &'a Catalog,
}

impl<'a> SqlCompiler<'a> {
    /// Create a compiler over a catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// CREATE TABLE statements for the given entities.
    ///
    /// One statement per persistent entity, followed by one per distinct
    /// many-to-many join table. Transient entities are skipped.
    pub fn create_tables(&self, entities: &[&str]) -> Result<Vec<String>> {
        let persistent = self.persistent(entities)?;
        let mut statements = Vec::new();

        for entity in &persistent {
            let meta = self.catalog.metadata(entity)?;
            let columns = meta
                .column_fields()
                .map(|field| self.column_definition(&meta, &field.name))
                .collect::<Result<Vec<_>>>()?;
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                meta.table_name(),
                columns.join(", ")
            ));
        }

        for rel in self.catalog.many_to_many_among(&persistent)? {
            let first = rel.first.join_column();
            let second = rel.second.join_column();
            let dialect = self.catalog.dialect();
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} ({} {}, {} {}, PRIMARY KEY ({}, {}))",
                rel.join_table().unwrap_or_default(),
                first,
                dialect.type_name(self.catalog.sql_type(&rel.first.entity, &rel.first.field)?),
                second,
                dialect.type_name(self.catalog.sql_type(&rel.second.entity, &rel.second.field)?),
                first,
                second
            ));
        }

        debug!(count = statements.len(), "compiled create tables");
        Ok(statements)
    }

    /// DROP TABLE statements mirroring [`SqlCompiler::create_tables`].
    pub fn drop_tables(&self, entities: &[&str]) -> Result<Vec<String>> {
        let persistent = self.persistent(entities)?;
        let mut statements = Vec::new();

        for entity in &persistent {
            statements.push(format!(
                "DROP TABLE IF EXISTS {}",
                self.catalog.table_name(entity)?
            ));
        }
        for rel in self.catalog.many_to_many_among(&persistent)? {
            statements.push(format!(
                "DROP TABLE IF EXISTS {}",
                rel.join_table().unwrap_or_default()
            ));
        }

        debug!(count = statements.len(), "compiled drop tables");
        Ok(statements)
    }

    /// `SELECT * FROM <table> [WHERE ...] [LIMIT n OFFSET m]`.
    pub fn select(&self, query: &CriteriaQuery) -> Result<String> {
        let meta = self.catalog.metadata(&query.entity)?;
        let sql = format!(
            "SELECT * FROM {}{}",
            meta.table_name(),
            self.query_tail(&meta, query)?
        );
        debug!(sql = %sql, "compiled select");
        Ok(sql)
    }

    /// `SELECT count(*) FROM <table> [WHERE ...] [LIMIT n OFFSET m]`.
    pub fn count(&self, query: &CriteriaQuery) -> Result<String> {
        let meta = self.catalog.metadata(&query.entity)?;
        let sql = format!(
            "SELECT count(*) FROM {}{}",
            meta.table_name(),
            self.query_tail(&meta, query)?
        );
        debug!(sql = %sql, "compiled count");
        Ok(sql)
    }

    /// Select the `queried` side of a many-to-many relationship linked to the
    /// other side's row with key `id`.
    pub fn many_to_many_join(
        &self,
        relationship: &Relationship,
        id: &Value,
        queried: &str,
    ) -> Result<String> {
        relationship.expect(Cardinality::ManyToMany)?;
        let join = relationship.join_table().unwrap_or_default();
        let (first, second) = (&relationship.first, &relationship.second);

        let sql = if first.entity == queried {
            format!(
                "SELECT x.* FROM {} x, {} y, {} z WHERE z.{} = x.{} AND z.{} = y.{} AND y.{} = {}",
                first.table,
                second.table,
                join,
                first.join_column(),
                first.column,
                second.join_column(),
                second.column,
                second.column,
                render_own(id)
            )
        } else if second.entity == queried {
            format!(
                "SELECT x.* FROM {} y, {} x, {} z WHERE z.{} = x.{} AND z.{} = y.{} AND y.{} = {}",
                first.table,
                second.table,
                join,
                second.join_column(),
                second.column,
                first.join_column(),
                first.column,
                first.column,
                render_own(id)
            )
        } else {
            return Err(relationship.mismatch(queried));
        };

        debug!(sql = %sql, relationship = %relationship.name, "compiled many-to-many join");
        Ok(sql)
    }

    /// Delete join rows of `entity` whose counterpart key is not in `keep_keys`.
    ///
    /// With no keys to keep, every join row of the entity is deleted.
    pub fn delete_stale_relationships(
        &self,
        relationship: &Relationship,
        entity: &dyn Entity,
        keep_keys: &[Value],
    ) -> Result<String> {
        relationship.expect(Cardinality::ManyToMany)?;
        let (own, other) = relationship.sides(entity.entity_name())?;
        let owner_key = entity.field_value(&own.field).unwrap_or(Value::Null);
        let owner_type = self.catalog.sql_type(&own.entity, &own.field)?;

        let mut sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            relationship.join_table().unwrap_or_default(),
            own.join_column(),
            render(&owner_key, owner_type)
        );
        if !keep_keys.is_empty() {
            let keys: Vec<String> = keep_keys.iter().map(render_own).collect();
            sql.push_str(&format!(
                " AND {} NOT IN ({})",
                other.join_column(),
                keys.join(", ")
            ));
        }

        debug!(sql = %sql, relationship = %relationship.name, "compiled stale relationship delete");
        Ok(sql)
    }

    /// Point the foreign key of every related row at `owner`.
    ///
    /// Returns `None` when there are no related keys.
    pub fn update_foreign_key(
        &self,
        relationship: &Relationship,
        owner: &dyn Entity,
        related_keys: &[Value],
    ) -> Result<Option<String>> {
        relationship.expect(Cardinality::OneToMany)?;
        let column = relationship.foreign_key_column().unwrap_or_default();
        if relationship.first.entity != owner.entity_name() {
            return Err(relationship.mismatch(owner.entity_name()));
        }

        if related_keys.is_empty() {
            return Ok(None);
        }

        let many = self.catalog.metadata(&relationship.second.entity)?;
        let many_pk = many.primary_key_field();
        let many_pk_type = self.catalog.sql_type(many.entity(), &many_pk.name)?;

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} IN ({})",
            many.table_name(),
            column,
            self.primary_key_literal(owner)?,
            many_pk.column_name(),
            render_list(related_keys, many_pk_type)
        );

        debug!(sql = %sql, relationship = %relationship.name, "compiled foreign key update");
        Ok(Some(sql))
    }

    /// Point the owner's one-to-one foreign key at `related`.
    pub fn update_one_to_one_foreign_key(
        &self,
        relationship: &Relationship,
        owner: &dyn Entity,
        related: &dyn Entity,
    ) -> Result<String> {
        relationship.expect(Cardinality::OneToOne)?;
        if relationship.first.entity != owner.entity_name() {
            return Err(relationship.mismatch(owner.entity_name()));
        }
        if relationship.second.entity != related.entity_name() {
            return Err(relationship.mismatch(related.entity_name()));
        }

        let meta = self.catalog.metadata(owner.entity_name())?;
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            meta.table_name(),
            relationship.first.column,
            self.primary_key_literal(related)?,
            meta.primary_key_column(),
            self.primary_key_literal(owner)?
        );

        debug!(sql = %sql, relationship = %relationship.name, "compiled one-to-one update");
        Ok(sql)
    }

    /// Delete every join row of `entity` in a many-to-many relationship.
    pub fn many_to_many_delete(
        &self,
        entity: &dyn Entity,
        relationship: &Relationship,
    ) -> Result<String> {
        relationship.expect(Cardinality::ManyToMany)?;
        let (own, _) = relationship.sides(entity.entity_name())?;
        let key = entity.field_value(&own.field).unwrap_or(Value::Null);
        let key_type = self.catalog.sql_type(&own.entity, &own.field)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            relationship.join_table().unwrap_or_default(),
            own.join_column(),
            render(&key, key_type)
        );

        debug!(sql = %sql, relationship = %relationship.name, "compiled many-to-many delete");
        Ok(sql)
    }

    /// Link `entity` to the counterpart keyed `related_key` in a join table.
    ///
    /// Existing links are left untouched.
    pub fn many_to_many_insert(
        &self,
        relationship: &Relationship,
        entity: &dyn Entity,
        related_key: &Value,
    ) -> Result<String> {
        relationship.expect(Cardinality::ManyToMany)?;
        let (own, other) = relationship.sides(entity.entity_name())?;
        let key = entity.field_value(&own.field).unwrap_or(Value::Null);

        let sql = format!(
            "{} {} ({}, {}) VALUES ({}, {})",
            self.catalog.dialect().insert_or_ignore(),
            relationship.join_table().unwrap_or_default(),
            own.join_column(),
            other.join_column(),
            render(&key, self.catalog.sql_type(&own.entity, &own.field)?),
            render(related_key, self.catalog.sql_type(&other.entity, &other.field)?)
        );

        debug!(sql = %sql, relationship = %relationship.name, "compiled many-to-many insert");
        Ok(sql)
    }

    /// Store `related`'s primary key in `column` of `entity`'s row.
    pub fn update_column(
        &self,
        entity: &dyn Entity,
        related: &dyn Entity,
        column: &str,
    ) -> Result<String> {
        let meta = self.catalog.metadata(entity.entity_name())?;
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            meta.table_name(),
            column,
            self.primary_key_literal(related)?,
            meta.primary_key_column(),
            self.primary_key_literal(entity)?
        );

        debug!(sql = %sql, "compiled column update");
        Ok(sql)
    }

    /// `INSERT INTO <table> (<columns>) VALUES (<values>)`.
    ///
    /// An auto-increment primary key without a value is left to storage.
    pub fn insert(&self, entity: &dyn Entity) -> Result<String> {
        let meta = self.catalog.metadata(entity.entity_name())?;
        let skip_pk = self.catalog.is_pk_null_or_zero(entity)?
            && self
                .catalog
                .is_auto_increment(meta.entity(), &meta.primary_key_field().name)?;

        let mut columns = Vec::new();
        let mut values = Vec::new();
        for field in meta.column_fields() {
            if skip_pk && meta.is_primary_key(&field.name) {
                continue;
            }
            columns.push(field.column_name().to_string());
            values.push(self.field_literal(&meta, entity, &field.name)?);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            meta.table_name(),
            columns.join(", "),
            values.join(", ")
        );
        debug!(sql = %sql, "compiled insert");
        Ok(sql)
    }

    /// `UPDATE <table> SET <column> = <value>, ... WHERE <pk> = <key>`.
    ///
    /// Returns `None` when the primary key is the only column.
    pub fn update(&self, entity: &dyn Entity) -> Result<Option<String>> {
        let meta = self.catalog.metadata(entity.entity_name())?;

        let mut assignments = Vec::new();
        for field in meta.column_fields() {
            if meta.is_primary_key(&field.name) {
                continue;
            }
            assignments.push(format!(
                "{} = {}",
                field.column_name(),
                self.field_literal(&meta, entity, &field.name)?
            ));
        }

        if assignments.is_empty() {
            debug!(entity = meta.entity(), "nothing to update");
            return Ok(None);
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            meta.table_name(),
            assignments.join(", "),
            meta.primary_key_column(),
            self.primary_key_literal(entity)?
        );
        debug!(sql = %sql, "compiled update");
        Ok(Some(sql))
    }

    /// `DELETE FROM <table> WHERE <pk> = <key>`.
    pub fn delete(&self, entity: &dyn Entity) -> Result<String> {
        let meta = self.catalog.metadata(entity.entity_name())?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            meta.table_name(),
            meta.primary_key_column(),
            self.primary_key_literal(entity)?
        );
        debug!(sql = %sql, "compiled delete");
        Ok(sql)
    }

    fn persistent(&self, entities: &[&str]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(entities.len());
        for &entity in entities {
            if self.catalog.schema().get_entity(entity).is_none() {
                return Err(Error::config(format!(
                    "unknown entity '{}'",
                    entity
                )));
            }
            if self.catalog.is_persistent(entity) {
                // Resolve relationships so unknown targets surface here.
                self.catalog.declared_relationships(entity)?;
                out.push(entity.to_string());
            }
        }
        Ok(out)
    }

    fn column_definition(&self, meta: &ClassMetadata, field: &str) -> Result<String> {
        let dialect = self.catalog.dialect();
        let def = self.catalog.sql_type(meta.entity(), field)?;
        let mut column = format!(
            "{} {}",
            meta.column_name(field).unwrap_or(field),
            dialect.type_name(def)
        );

        if meta.is_primary_key(field) {
            column.push_str(" PRIMARY KEY");
            if self.catalog.is_auto_increment(meta.entity(), field)? {
                column.push(' ');
                column.push_str(dialect.auto_increment());
            }
        } else if !meta.is_nullable(field) {
            column.push_str(" NOT NULL");
        }
        if meta.is_unique(field) {
            column.push_str(" UNIQUE");
        }
        Ok(column)
    }

    fn field_literal(&self, meta: &ClassMetadata, entity: &dyn Entity, field: &str) -> Result<String> {
        let value = entity.field_value(field).unwrap_or(Value::Null);
        Ok(render(&value, self.catalog.sql_type(meta.entity(), field)?))
    }

    fn primary_key_literal(&self, entity: &dyn Entity) -> Result<String> {
        let meta = self.catalog.metadata(entity.entity_name())?;
        let pk = self.catalog.primary_key_value(entity)?;
        Ok(render(
            &pk,
            self.catalog.sql_type(meta.entity(), &meta.primary_key_field().name)?,
        ))
    }

    fn query_tail(&self, meta: &ClassMetadata, query: &CriteriaQuery) -> Result<String> {
        let mut tail = String::new();
        if !query.criteria.is_empty() {
            let clauses = query
                .criteria
                .iter()
                .map(|c| c.to_sql(meta, self.catalog))
                .collect::<Result<Vec<_>>>()?;
            tail.push_str(" WHERE ");
            tail.push_str(&clauses.join(" AND "));
        }
        if query.limit > 0 {
            tail.push_str(&format!(" LIMIT {} OFFSET {}", query.limit, query.offset));
        }
        Ok(tail)
    }
}
