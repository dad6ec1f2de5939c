//! Domain instances as seen by the catalog.

mod lazy;

pub use lazy::Lazy;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A domain instance the catalog can inspect.
///
/// Field values are read through this accessor rather than by direct field
/// access, so deferred instances can answer for their key without loading.
pub trait Entity {
    /// Name of the entity definition this instance belongs to.
    fn entity_name(&self) -> &str;

    /// Current value of a field, or `None` if the instance does not carry it.
    fn field_value(&self, field: &str) -> Option<Value>;
}

/// A generic instance: an entity name and its field values in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity: String,
    values: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record for an entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: Vec::new(),
        }
    }

    /// Set a field value, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field value, replacing any previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((field, value)),
        }
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Field values in insertion order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }
}

impl Entity for Record {
    fn entity_name(&self) -> &str {
        &self.entity
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}
