//! SQL dialects: storage type mapping and DDL keywords.

use crate::catalog::ScalarType;

/// Storage class a column or literal resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// Integer storage.
    Integer,
    /// Floating point storage.
    Real,
    /// Text storage. Literals are single-quoted.
    Text,
    /// Binary storage.
    Blob,
    /// No storage type (NULL literal).
    Null,
}

impl SqlType {
    /// Check if literals of this type are quoted.
    pub fn is_textual(&self) -> bool {
        matches!(self, SqlType::Text)
    }
}

/// A SQL dialect.
///
/// Dialects decide how declared scalar types are stored and spelled in DDL.
pub trait Dialect: Send + Sync {
    /// Name of the dialect.
    fn name(&self) -> &'static str;

    /// Storage type for a declared scalar type.
    fn storage_type(&self, scalar: &ScalarType) -> SqlType;

    /// Column type keyword used in CREATE TABLE.
    fn type_name(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
            SqlType::Null => "NULL",
        }
    }

    /// Keyword appended to an auto-incrementing primary key.
    fn auto_increment(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    /// Statement prefix of an insert that skips rows violating a key.
    fn insert_or_ignore(&self) -> &'static str {
        "INSERT OR IGNORE INTO"
    }
}

/// SQLite: booleans and timestamps are stored as integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn storage_type(&self, scalar: &ScalarType) -> SqlType {
        match scalar {
            ScalarType::Bool | ScalarType::Int32 | ScalarType::Int64 | ScalarType::Timestamp => {
                SqlType::Integer
            }
            ScalarType::Float32 | ScalarType::Float64 => SqlType::Real,
            ScalarType::String => SqlType::Text,
            ScalarType::Bytes => SqlType::Blob,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_storage_types() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.storage_type(&ScalarType::Bool), SqlType::Integer);
        assert_eq!(dialect.storage_type(&ScalarType::Timestamp), SqlType::Integer);
        assert_eq!(dialect.storage_type(&ScalarType::Float32), SqlType::Real);
        assert_eq!(dialect.storage_type(&ScalarType::String), SqlType::Text);
        assert_eq!(dialect.storage_type(&ScalarType::Bytes), SqlType::Blob);
    }

    #[test]
    fn test_type_names() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.type_name(SqlType::Integer), "INTEGER");
        assert_eq!(dialect.type_name(SqlType::Text), "TEXT");
        assert_eq!(dialect.auto_increment(), "AUTOINCREMENT");
    }
}
