//! Helpers for building dependent views over dynamic records

use std::sync::Arc;

use recnav_core::{DataSource, FieldValue, ParentSource};

use crate::record::{DynamicRecord, RecordKey};

/// Child view of `parent` holding the records whose `field` equals `value`
pub fn filter_by_field<P>(
    parent: &P,
    name: impl Into<String>,
    field: &str,
    value: &FieldValue,
) -> Arc<DataSource<DynamicRecord>>
where
    P: ParentSource<DynamicRecord> + ?Sized,
{
    DataSource::derive_view(parent, name, |record: &DynamicRecord| {
        record.get(field).as_ref() == Some(value)
    })
}

/// Detail view of `details` for one master record: the details whose
/// `foreign_key` field refers to `master`'s key
pub fn detail_for<P>(
    details: &P,
    foreign_key: &str,
    master: &DynamicRecord,
) -> Arc<DataSource<DynamicRecord>>
where
    P: ParentSource<DynamicRecord> + ?Sized,
{
    let wanted = match master.record_key() {
        RecordKey::Value(value) => value.clone(),
        RecordKey::Row(row) => row.to_string(),
    };
    let name = format!("{} of {}", foreign_key, wanted);
    DataSource::derive_view(details, name, |record: &DynamicRecord| {
        record
            .get(foreign_key)
            .map(|value| value.to_string() == wanted)
            .unwrap_or(false)
    })
}
