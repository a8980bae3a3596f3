//! Tabular view of a record collection

use std::io::Write;

use indexmap::IndexSet;
use recnav_core::{DataSource, FieldValue, Record, RecordRef};
use tracing::debug;

use crate::DataError;

/// Header row plus one row per record, addressed with one-based indices.
///
/// Row 1 is the header; record `n` sits on row `n + 1`. Columns are the union
/// of every record's field names in first-seen order; a record without a
/// column reads as null there.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGrid {
    headers: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
}

impl RecordGrid {
    pub fn from_records<M: Record>(records: &[RecordRef<M>]) -> Self {
        let field_sets: Vec<_> = records.iter().map(|record| record.fields()).collect();

        let mut columns = IndexSet::new();
        for fields in &field_sets {
            for field in fields {
                if !columns.contains(field.name.as_str()) {
                    columns.insert(field.name.clone());
                }
            }
        }

        let rows = field_sets
            .into_iter()
            .map(|fields| {
                let mut row = vec![FieldValue::Null; columns.len()];
                for field in fields {
                    if let Some(idx) = columns.get_index_of(field.name.as_str()) {
                        row[idx] = field.value;
                    }
                }
                row
            })
            .collect();

        Self {
            headers: columns.into_iter().collect(),
            rows,
        }
    }

    /// Snapshot the current contents of `source`
    pub fn from_source<M: Record>(source: &DataSource<M>) -> Self {
        Self::from_records(&source.records())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows including the header row
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Text of the cell at one-based (`row`, `column`)
    pub fn cell(&self, row: usize, column: usize) -> Result<String, DataError> {
        if row == 0 || column == 0 || row > self.row_count() || column > self.column_count() {
            return Err(DataError::IndexRange {
                row,
                column,
                rows: self.row_count(),
                columns: self.column_count(),
            });
        }

        Ok(if row == 1 {
            self.headers[column - 1].clone()
        } else {
            self.rows[row - 2][column - 1].to_string()
        })
    }

    /// Write the grid as CSV, header first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DataError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        csv_writer.flush()?;
        debug!(rows = self.rows.len(), columns = self.headers.len(), "exported grid");
        Ok(())
    }
}
