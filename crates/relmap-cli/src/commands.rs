//! Statement compilation for each CLI command.

use std::path::Path;

use relmap_core::{
    Catalog, CatalogConfig, CriteriaQuery, Criterion, FieldType, ScalarType, SchemaBundle,
    SqlCompiler, Value,
};
use tracing::debug;

use crate::config::Command;
use crate::error::CliError;

/// Read a JSON schema description.
pub fn load_schema(path: &Path) -> Result<SchemaBundle, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schema: SchemaBundle = serde_json::from_str(&text)?;
    debug!(entities = schema.entities.len(), "schema loaded");
    Ok(schema)
}

/// Compile the statements for a command.
pub fn compile(
    schema: SchemaBundle,
    config: CatalogConfig,
    command: &Command,
) -> Result<Vec<String>, CliError> {
    let catalog = Catalog::with_config(schema, config);
    let compiler = SqlCompiler::new(&catalog);

    let statements = match command {
        Command::Create { entities } => compiler.create_tables(&selected(&catalog, entities))?,
        Command::Drop { entities } => compiler.drop_tables(&selected(&catalog, entities))?,
        Command::Select {
            entity,
            filters,
            limit,
            offset,
        } => {
            let query = build_query(&catalog, entity, filters)?
                .with_limit(*limit)
                .with_offset(*offset);
            vec![compiler.select(&query)?]
        }
        Command::Count { entity, filters } => {
            vec![compiler.count(&build_query(&catalog, entity, filters)?)?]
        }
    };
    Ok(statements)
}

fn selected<'a>(catalog: &'a Catalog, entities: &'a [String]) -> Vec<&'a str> {
    if entities.is_empty() {
        catalog.schema().entity_names()
    } else {
        entities.iter().map(String::as_str).collect()
    }
}

fn build_query(catalog: &Catalog, entity: &str, filters: &[String]) -> Result<CriteriaQuery, CliError> {
    let mut query = CriteriaQuery::new(entity);
    for filter in filters {
        let (field, raw) = filter.split_once('=').ok_or_else(|| CliError::Filter {
            filter: filter.clone(),
            reason: "expected field=value".to_string(),
        })?;
        let field = field.trim();
        let value = match catalog.find_field(entity, field)? {
            Some(def) => parse_value(&def.field_type, raw.trim()).map_err(|reason| {
                CliError::Filter {
                    filter: filter.clone(),
                    reason,
                }
            })?,
            // Unknown fields fail as invalid criteria when compiled.
            None => Value::from(raw.trim()),
        };
        query = query.with_criterion(Criterion::eq(field, value));
    }
    Ok(query)
}

fn parse_value(field_type: &FieldType, raw: &str) -> Result<Value, String> {
    let Some(scalar) = field_type.scalar_type() else {
        return Ok(Value::from(raw));
    };
    let value = match scalar {
        ScalarType::Bool => Value::Bool(raw.parse().map_err(|_| format!("'{}' is not a boolean", raw))?),
        ScalarType::Int32 => Value::Int32(raw.parse().map_err(|_| format!("'{}' is not an integer", raw))?),
        ScalarType::Int64 | ScalarType::Timestamp => {
            Value::Int64(raw.parse().map_err(|_| format!("'{}' is not an integer", raw))?)
        }
        ScalarType::Float32 | ScalarType::Float64 => {
            Value::Float64(raw.parse().map_err(|_| format!("'{}' is not a number", raw))?)
        }
        ScalarType::String => Value::from(raw),
        ScalarType::Bytes => Value::Bytes(raw.as_bytes().to_vec()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::{EntityDef, FieldDef};

    fn schema() -> SchemaBundle {
        serde_json::from_str(
            r#"{
                "entities": [
                    {
                        "name": "User",
                        "table": "users",
                        "fields": [
                            {"name": "id", "field_type": {"Scalar": "Int64"}, "auto_increment": true, "primary_key": true},
                            {"name": "name", "field_type": {"Scalar": "String"}, "nullable": false},
                            {"name": "active", "field_type": {"Scalar": "Bool"}}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_create_all() {
        let statements = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Create { entities: vec![] },
        )
        .unwrap();

        assert_eq!(
            statements,
            vec![
                "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, active INTEGER)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_select_with_typed_filters() {
        let statements = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Select {
                entity: "User".to_string(),
                filters: vec!["name=ada".to_string(), "id = 4".to_string()],
                limit: 10,
                offset: 20,
            },
        )
        .unwrap();

        assert_eq!(
            statements,
            vec!["SELECT * FROM users WHERE name = 'ada' AND id = 4 LIMIT 10 OFFSET 20".to_string()]
        );
    }

    #[test]
    fn test_count() {
        let statements = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Count {
                entity: "User".to_string(),
                filters: vec!["active=true".to_string()],
            },
        )
        .unwrap();

        assert_eq!(
            statements,
            vec!["SELECT count(*) FROM users WHERE active = 1".to_string()]
        );
    }

    #[test]
    fn test_bad_filters() {
        let bad_int = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Count {
                entity: "User".to_string(),
                filters: vec!["id=abc".to_string()],
            },
        );
        assert!(matches!(bad_int, Err(CliError::Filter { .. })));

        let no_equals = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Count {
                entity: "User".to_string(),
                filters: vec!["id".to_string()],
            },
        );
        assert!(matches!(no_equals, Err(CliError::Filter { .. })));

        let unknown = compile(
            schema(),
            CatalogConfig::default(),
            &Command::Count {
                entity: "User".to_string(),
                filters: vec!["age=3".to_string()],
            },
        );
        assert!(matches!(
            unknown,
            Err(CliError::Core(relmap_core::Error::InvalidCriteria { .. }))
        ));
    }

    #[test]
    fn test_configured_primary_key_name() {
        let schema = SchemaBundle::new().with_entity(
            EntityDef::new("Tag")
                .with_field(FieldDef::scalar("Key", ScalarType::String))
                .with_field(FieldDef::scalar("label", ScalarType::String)),
        );

        let default = compile(
            schema.clone(),
            CatalogConfig::default(),
            &Command::Drop { entities: vec![] },
        );
        assert!(matches!(default, Err(CliError::Core(ref e)) if e.is_configuration()));

        let statements = compile(
            schema,
            CatalogConfig::new().with_primary_key_name("key"),
            &Command::Drop { entities: vec!["Tag".to_string()] },
        )
        .unwrap();
        assert_eq!(statements, vec!["DROP TABLE IF EXISTS tag".to_string()]);
    }

    #[test]
    fn test_load_schema_missing_file() {
        let err = load_schema(Path::new("/nonexistent/relmap.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
