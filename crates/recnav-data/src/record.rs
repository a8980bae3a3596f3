//! A record whose fields are only known at runtime

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use recnav_core::{Field, FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Identity of a [`DynamicRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    /// Position in the file it was loaded from
    Row(usize),
    /// Text of the key column
    Value(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Row(row) => write!(f, "#{}", row),
            RecordKey::Value(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: FieldValue,
    foreign_key: Option<String>,
}

/// Record of a named entity with ordered, mutable fields.
///
/// Field values may change in place; the key never does.
#[derive(Debug)]
pub struct DynamicRecord {
    entity: String,
    key: RecordKey,
    fields: RwLock<IndexMap<String, Slot>>,
    disposed: AtomicBool,
}

impl DynamicRecord {
    pub fn new(entity: impl Into<String>, key: RecordKey) -> Self {
        Self {
            entity: entity.into(),
            key,
            fields: RwLock::new(IndexMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn with_field(self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.write().insert(
            name.into(),
            Slot {
                value,
                foreign_key: None,
            },
        );
        self
    }

    /// Add a field that references a record of `entity`
    pub fn with_foreign_key(
        self,
        name: impl Into<String>,
        value: FieldValue,
        entity: impl Into<String>,
    ) -> Self {
        self.fields.write().insert(
            name.into(),
            Slot {
                value,
                foreign_key: Some(entity.into()),
            },
        );
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn record_key(&self) -> &RecordKey {
        &self.key
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields.read().get(name).map(|slot| slot.value.clone())
    }

    /// Change a field in place, returning the previous value.
    /// Unknown fields are appended.
    pub fn set(&self, name: &str, value: FieldValue) -> Option<FieldValue> {
        let mut fields = self.fields.write();
        match fields.get_mut(name) {
            Some(slot) => Some(std::mem::replace(&mut slot.value, value)),
            None => {
                fields.insert(
                    name.to_string(),
                    Slot {
                        value,
                        foreign_key: None,
                    },
                );
                None
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Record for DynamicRecord {
    type Key = RecordKey;

    fn key(&self) -> RecordKey {
        self.key.clone()
    }

    fn fields(&self) -> Vec<Field> {
        self.fields
            .read()
            .iter()
            .map(|(name, slot)| Field {
                name: name.clone(),
                value: slot.value.clone(),
                foreign_key: slot.foreign_key.clone(),
            })
            .collect()
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.fields.write().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> DynamicRecord {
        DynamicRecord::new("order", RecordKey::Value("o-1".to_string()))
            .with_field("total", FieldValue::Float(12.5))
            .with_foreign_key("customer_id", FieldValue::Integer(7), "customer")
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let fields = order().fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["total", "customer_id"]);
        assert!(!fields[0].is_foreign_key());
        assert_eq!(fields[1].foreign_key.as_deref(), Some("customer"));
    }

    #[test]
    fn test_identity_survives_field_changes() {
        let record = order();
        let twin = DynamicRecord::new("order", RecordKey::Value("o-1".to_string()));
        assert_eq!(record.set("total", FieldValue::Float(20.0)), Some(FieldValue::Float(12.5)));
        assert_eq!(record.get("total"), Some(FieldValue::Float(20.0)));
        assert!(record.same_record(&twin));
        assert!(!record.same_record(&DynamicRecord::new("order", RecordKey::Row(0))));
    }

    #[test]
    fn test_set_appends_unknown_fields() {
        let record = order();
        assert_eq!(record.set("note", FieldValue::Text("rush".to_string())), None);
        assert_eq!(record.fields().len(), 3);
    }

    #[test]
    fn test_dispose_clears_fields_once() {
        let record = order();
        record.dispose();
        record.dispose();
        assert!(record.is_disposed());
        assert!(record.fields().is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(RecordKey::Row(3).to_string(), "#3");
        assert_eq!(RecordKey::Value("c-9".to_string()).to_string(), "c-9");
    }
}
