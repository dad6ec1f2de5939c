//! Criterion predicates.

use crate::catalog::{Catalog, ClassMetadata};
use crate::error::{Error, Result};
use crate::sql::{literal, SqlType};
use crate::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CompareOp {
    /// SQL operator symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A predicate in a criteria query.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `<column> <op> <value>`.
    Compare {
        /// Field name.
        field: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand value.
        value: Value,
    },
    /// `<column> BETWEEN <low> AND <high>`.
    Between {
        /// Field name.
        field: String,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
    },
    /// `<column> IN (<values>)`.
    In {
        /// Field name.
        field: String,
        /// Candidate values.
        values: Vec<Value>,
    },
    /// `<column> LIKE '<pattern>'`.
    Like {
        /// Field name.
        field: String,
        /// Pattern.
        pattern: String,
    },
    /// `<column> IS NULL`.
    IsNull {
        /// Field name.
        field: String,
    },
    /// `<column> IS NOT NULL`.
    IsNotNull {
        /// Field name.
        field: String,
    },
    /// `(<left> AND <right>)`.
    And(Box<Criterion>, Box<Criterion>),
    /// `(<left> OR <right>)`.
    Or(Box<Criterion>, Box<Criterion>),
    /// Raw SQL fragment, emitted verbatim.
    Sql(String),
}

impl Criterion {
    fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Criterion::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Field equals value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Field differs from value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Field is less than value.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Field is less than or equal to value.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// Field is greater than value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// Field is greater than or equal to value.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    /// Field lies within an inclusive range.
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Criterion::Between {
            field: field.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Field is one of the values.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Criterion::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Field matches a LIKE pattern.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Criterion::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Field is NULL.
    pub fn is_null(field: impl Into<String>) -> Self {
        Criterion::IsNull {
            field: field.into(),
        }
    }

    /// Field is not NULL.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Criterion::IsNotNull {
            field: field.into(),
        }
    }

    /// Both criteria hold.
    pub fn and(left: Criterion, right: Criterion) -> Self {
        Criterion::And(Box::new(left), Box::new(right))
    }

    /// Either criterion holds.
    pub fn or(left: Criterion, right: Criterion) -> Self {
        Criterion::Or(Box::new(left), Box::new(right))
    }

    /// Raw SQL fragment.
    pub fn sql(fragment: impl Into<String>) -> Self {
        Criterion::Sql(fragment.into())
    }

    /// Render this criterion against an entity's metadata.
    ///
    /// Field names are mapped to their columns and values are rendered by the
    /// column's storage type.
    pub fn to_sql(&self, meta: &ClassMetadata, catalog: &Catalog) -> Result<String> {
        let sql = match self {
            Criterion::Compare { field, op, value } => {
                let (column, ty) = resolve(meta, catalog, field)?;
                format!("{} {} {}", column, op.symbol(), literal::render(value, ty))
            }
            Criterion::Between { field, low, high } => {
                let (column, ty) = resolve(meta, catalog, field)?;
                format!(
                    "{} BETWEEN {} AND {}",
                    column,
                    literal::render(low, ty),
                    literal::render(high, ty)
                )
            }
            Criterion::In { field, values } => {
                let (column, ty) = resolve(meta, catalog, field)?;
                format!("{} IN ({})", column, literal::render_list(values, ty))
            }
            Criterion::Like { field, pattern } => {
                let (column, _) = resolve(meta, catalog, field)?;
                format!(
                    "{} LIKE {}",
                    column,
                    literal::render(&Value::String(pattern.clone()), SqlType::Text)
                )
            }
            Criterion::IsNull { field } => {
                let (column, _) = resolve(meta, catalog, field)?;
                format!("{} IS NULL", column)
            }
            Criterion::IsNotNull { field } => {
                let (column, _) = resolve(meta, catalog, field)?;
                format!("{} IS NOT NULL", column)
            }
            Criterion::And(left, right) => format!(
                "({} AND {})",
                left.to_sql(meta, catalog)?,
                right.to_sql(meta, catalog)?
            ),
            Criterion::Or(left, right) => format!(
                "({} OR {})",
                left.to_sql(meta, catalog)?,
                right.to_sql(meta, catalog)?
            ),
            Criterion::Sql(fragment) => fragment.clone(),
        };
        Ok(sql)
    }
}

fn resolve<'m>(
    meta: &'m ClassMetadata,
    catalog: &Catalog,
    field: &str,
) -> Result<(&'m str, SqlType)> {
    match meta.field(field) {
        Some(def) if def.has_column() => {
            let ty = catalog.sql_type(meta.entity(), field)?;
            Ok((def.column_name(), ty))
        }
        _ => Err(Error::InvalidCriteria {
            entity: meta.entity().to_string(),
            field: field.to_string(),
        }),
    }
}
