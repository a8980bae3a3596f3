//! Navigation settings

use serde::{Deserialize, Serialize};

/// Settings applied to every navigator a source creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Whether fresh navigators may move to the pending new record position
    pub allow_new_record: bool,

    /// Text used by the position display
    pub labels: PositionLabels,
}

/// Fixed texts of the position display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionLabels {
    pub no_records: String,
    pub new_record: String,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            allow_new_record: false,
            labels: PositionLabels::default(),
        }
    }
}

impl Default for PositionLabels {
    fn default() -> Self {
        Self {
            no_records: "NO RECORDS".to_string(),
            new_record: "New Record".to_string(),
        }
    }
}

impl PositionLabels {
    /// Text for a cursor resting on a committed record
    pub fn record_of(&self, rec_num: isize, record_count: usize) -> String {
        format!("Record {} of {}", rec_num, record_count)
    }
}

impl NavigationSettings {
    /// Load settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_new_record(mut self, allow: bool) -> Self {
        self.allow_new_record = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = NavigationSettings::default();
        assert!(!settings.allow_new_record);
        assert_eq!(settings.labels.no_records, "NO RECORDS");
        assert_eq!(settings.labels.new_record, "New Record");
        assert_eq!(settings.labels.record_of(2, 5), "Record 2 of 5");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = NavigationSettings::from_json(r#"{ "allow_new_record": true }"#).unwrap();
        assert!(settings.allow_new_record);
        assert_eq!(settings.labels, PositionLabels::default());

        let settings =
            NavigationSettings::from_json(r#"{ "labels": { "no_records": "(empty)" } }"#).unwrap();
        assert_eq!(settings.labels.no_records, "(empty)");
        assert_eq!(settings.labels.new_record, "New Record");
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(NavigationSettings::from_json("{ allow_new_record ").is_err());
    }
}
