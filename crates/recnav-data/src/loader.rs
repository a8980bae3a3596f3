//! Loading records from CSV into a master source

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use ahash::AHashSet;
use csv::ReaderBuilder;
use recnav_core::{FieldValue, MasterSource, RecordRef};
use tracing::{debug, info};

use crate::config::CsvLoadConfig;
use crate::record::{DynamicRecord, RecordKey};
use crate::DataError;

/// Read every row of `reader` as a record of `entity`
pub fn load_csv<R: Read>(
    reader: R,
    entity: &str,
    config: &CsvLoadConfig,
) -> Result<Arc<MasterSource<DynamicRecord>>, DataError> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .has_headers(config.has_headers)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Vec<String> = if config.has_headers {
        csv_reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
    } else {
        Vec::new()
    };

    let key_idx = match &config.key_column {
        Some(column) if config.has_headers => Some(
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| DataError::MissingColumn(column.clone()))?,
        ),
        Some(column) => return Err(DataError::MissingColumn(column.clone())),
        None => None,
    };

    let mut seen_keys = AHashSet::new();
    let mut records: Vec<RecordRef<DynamicRecord>> = Vec::new();

    for (row, result) in csv_reader.records().enumerate() {
        let row_data = result?;

        // Headerless files get positional names, widened to the longest row
        while headers.len() < row_data.len() {
            headers.push(format!("column_{}", headers.len() + 1));
        }

        let key = match key_idx {
            Some(idx) => {
                let text = row_data.get(idx).unwrap_or_default().trim().to_string();
                if !seen_keys.insert(text.clone()) {
                    return Err(DataError::DuplicateKey(text));
                }
                RecordKey::Value(text)
            }
            None => RecordKey::Row(row),
        };

        let mut record = DynamicRecord::new(entity, key);
        for (idx, name) in headers.iter().enumerate() {
            let raw = row_data.get(idx).unwrap_or_default();
            let value = if config.is_null(raw) {
                FieldValue::Null
            } else {
                FieldValue::parse(raw)
            };
            record = match config.foreign_keys.get(name) {
                Some(target) => record.with_foreign_key(name.as_str(), value, target.as_str()),
                None => record.with_field(name.as_str(), value),
            };
        }
        records.push(Arc::new(record));
    }

    debug!(entity, columns = headers.len(), rows = records.len(), "parsed CSV");
    Ok(MasterSource::new(entity, records))
}

/// Open `path` and load it with [`load_csv`]
pub fn load_csv_file(
    path: &Path,
    entity: &str,
    config: &CsvLoadConfig,
) -> Result<Arc<MasterSource<DynamicRecord>>, DataError> {
    let file = File::open(path)?;
    let master = load_csv(BufReader::new(file), entity, config)?;
    info!(path = %path.display(), records = master.len(), "loaded {}", entity);
    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recnav_core::Record;

    const CUSTOMERS: &str = "id,name,since\n\
                             c1,Acme,2020-01-15\n\
                             c2,Globex,N/A\n\
                             c3,Initech,2021-07-01\n";

    #[test]
    fn test_rows_become_records() {
        let master = load_csv(CUSTOMERS.as_bytes(), "customer", &CsvLoadConfig::default()).unwrap();
        assert_eq!(master.len(), 3);
        assert_eq!(master.name(), "customer");

        let globex = master.get(1).unwrap();
        assert_eq!(globex.record_key(), &RecordKey::Row(1));
        assert_eq!(globex.get("name"), Some(FieldValue::Text("Globex".to_string())));
        assert_eq!(globex.get("since"), Some(FieldValue::Null));
    }

    #[test]
    fn test_key_column_sets_identity() {
        let config = CsvLoadConfig::default().with_key_column("id");
        let master = load_csv(CUSTOMERS.as_bytes(), "customer", &config).unwrap();
        let lookup = DynamicRecord::new("customer", RecordKey::Value("c3".to_string()));
        assert!(master.contains(&lookup));
    }

    #[test]
    fn test_missing_key_column() {
        let config = CsvLoadConfig::default().with_key_column("code");
        let result = load_csv(CUSTOMERS.as_bytes(), "customer", &config);
        assert!(matches!(result, Err(DataError::MissingColumn(c)) if c == "code"));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let data = "id,name\nc1,Acme\nc1,Again\n";
        let config = CsvLoadConfig::default().with_key_column("id");
        let result = load_csv(data.as_bytes(), "customer", &config);
        assert!(matches!(result, Err(DataError::DuplicateKey(k)) if k == "c1"));
    }

    #[test]
    fn test_foreign_keys_are_marked() {
        let data = "id,customer_id,total\no1,c1,9.5\n";
        let config = CsvLoadConfig::default()
            .with_key_column("id")
            .with_foreign_key("customer_id", "customer");
        let master = load_csv(data.as_bytes(), "order", &config).unwrap();
        let fields = master.get(0).unwrap().fields();
        let fk: Vec<&str> = fields
            .iter()
            .filter(|f| f.is_foreign_key())
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fk, vec!["customer_id"]);
    }

    #[test]
    fn test_headerless_rows_get_positional_names() {
        let data = "1;Acme\n2;Globex;extra\n";
        let config = CsvLoadConfig {
            delimiter: ';',
            has_headers: false,
            ..CsvLoadConfig::default()
        };
        let master = load_csv(data.as_bytes(), "customer", &config).unwrap();
        let first = master.get(0).unwrap();
        assert_eq!(first.get("column_1"), Some(FieldValue::Integer(1)));
        let second = master.get(1).unwrap();
        assert_eq!(second.get("column_3"), Some(FieldValue::Text("extra".to_string())));
    }
}
