//! Deferred instances.

use super::Entity;
use crate::error::Result;
use crate::value::Value;

/// A related instance that is loaded on demand.
///
/// The key is known up front; the instance itself is only materialized when
/// [`Lazy::load`] is called with a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Lazy<T> {
    entity: String,
    key_field: String,
    key: Value,
    value: Option<T>,
}

impl<T> Lazy<T> {
    /// Create an unloaded reference.
    pub fn new(entity: impl Into<String>, key_field: impl Into<String>, key: impl Into<Value>) -> Self {
        Self {
            entity: entity.into(),
            key_field: key_field.into(),
            key: key.into(),
            value: None,
        }
    }

    /// Create an already loaded reference.
    pub fn loaded(
        entity: impl Into<String>,
        key_field: impl Into<String>,
        key: impl Into<Value>,
        value: T,
    ) -> Self {
        let mut lazy = Self::new(entity, key_field, key);
        lazy.value = Some(value);
        lazy
    }

    /// Primary key of the referenced instance.
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Check if the instance has been materialized.
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// The instance, if loaded.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Materialize the instance through `loader` unless already loaded.
    ///
    /// The loader receives the entity name and key. A loader returning `None`
    /// leaves the reference unloaded.
    pub fn load<F>(&mut self, loader: F) -> Result<Option<&T>>
    where
        F: FnOnce(&str, &Value) -> Result<Option<T>>,
    {
        if self.value.is_none() {
            self.value = loader(&self.entity, &self.key)?;
        }
        Ok(self.value.as_ref())
    }

    /// Consume the reference, returning the instance if loaded.
    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T: Entity> Entity for Lazy<T> {
    fn entity_name(&self) -> &str {
        &self.entity
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        if field == self.key_field {
            return Some(self.key.clone());
        }
        self.value.as_ref().and_then(|v| v.field_value(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    #[test]
    fn test_key_without_loading() {
        let lazy: Lazy<Record> = Lazy::new("User", "id", 7i64);

        assert!(!lazy.is_loaded());
        assert_eq!(lazy.field_value("id"), Some(Value::Int64(7)));
        assert_eq!(lazy.field_value("name"), None);
    }

    #[test]
    fn test_load_calls_loader_once() {
        let mut lazy: Lazy<Record> = Lazy::new("User", "id", 7i64);
        let mut calls = 0;

        lazy.load(|entity, key| {
            calls += 1;
            Ok(Some(Record::new(entity).with("id", key.clone()).with("name", "ada")))
        })
        .unwrap();
        lazy.load(|_, _| {
            calls += 1;
            Ok(None)
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert!(lazy.is_loaded());
        assert_eq!(lazy.field_value("name"), Some(Value::from("ada")));
    }

    #[test]
    fn test_load_missing_stays_unloaded() {
        let mut lazy: Lazy<Record> = Lazy::new("User", "id", 7i64);
        assert!(lazy.load(|_, _| Ok(None)).unwrap().is_none());
        assert!(!lazy.is_loaded());
    }
}
