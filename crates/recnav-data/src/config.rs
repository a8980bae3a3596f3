//! CSV loading configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a CSV file maps onto records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvLoadConfig {
    /// Field delimiter
    pub delimiter: char,

    /// Whether the first line holds column names
    pub has_headers: bool,

    /// Column whose text is the record identity; row order when absent
    pub key_column: Option<String>,

    /// Foreign key columns mapped to the entity they reference
    pub foreign_keys: IndexMap<String, String>,

    /// Cell texts read as null, compared after trimming
    pub null_values: Vec<String>,

    /// Match `null_values` exactly instead of ignoring ASCII case
    pub null_case_sensitive: bool,
}

impl Default for CsvLoadConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
            key_column: None,
            foreign_keys: IndexMap::new(),
            null_values: vec![String::new(), "NULL".to_string(), "N/A".to_string()],
            null_case_sensitive: false,
        }
    }
}

impl CsvLoadConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    pub fn with_foreign_key(mut self, column: impl Into<String>, entity: impl Into<String>) -> Self {
        self.foreign_keys.insert(column.into(), entity.into());
        self
    }

    pub fn with_null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_null(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.null_values.iter().any(|null| {
            if self.null_case_sensitive {
                raw == null
            } else {
                raw.eq_ignore_ascii_case(null)
            }
        })
    }

    /// Delimiter as the single byte the CSV reader expects
    pub(crate) fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}
