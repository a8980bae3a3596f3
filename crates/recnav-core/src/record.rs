//! The record capability consumed by the navigation layer
//!
//! The core never looks inside a record beyond its identity. Field enumeration
//! exists for tabular consumers (grids, exports) built on top of the core.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A record entity held by sources and navigators.
///
/// Two handles refer to the same record when their keys are equal. The key
/// must stay stable for the lifetime of the record.
pub trait Record: Send + Sync + 'static {
    /// Identity type
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync;

    /// Stable identity of this record
    fn key(&self) -> Self::Key;

    /// Enumerate the named fields of this record, in display order
    fn fields(&self) -> Vec<Field>;

    /// Release whatever the record holds. Must not panic; may be called more than once.
    fn dispose(&self) {}

    /// Identity comparison
    fn same_record(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// Shared handle to a record
pub type RecordRef<M> = Arc<M>;

/// Index of the first handle in `records` that is the same record as `record`
pub fn position_of<M: Record>(records: &[RecordRef<M>], record: &M) -> Option<usize> {
    records.iter().position(|r| r.same_record(record))
}

/// A single named value of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    /// Name of the entity this field refers to, when it is a foreign key
    pub foreign_key: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
            foreign_key: None,
        }
    }

    /// Mark this field as referencing `entity`
    pub fn references(mut self, entity: impl Into<String>) -> Self {
        self.foreign_key = Some(entity.into());
        self
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }
}

/// Value carried by a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// Infer a typed value from raw text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return FieldValue::Float(f);
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return FieldValue::Boolean(true),
            "false" => return FieldValue::Boolean(false),
            _ => {}
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return FieldValue::Date(d);
        }
        FieldValue::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}
