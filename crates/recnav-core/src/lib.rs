//! In-memory record navigation
//!
//! This crate provides ordered record collections, a stateful cursor over
//! them, and the push-based protocol that keeps dependent views in step with
//! the canonical collection they were derived from.

pub mod config;
pub mod navigation;
pub mod record;
pub mod source;

use thiserror::Error;

// Re-export commonly used types
pub use config::{NavigationSettings, PositionLabels};
pub use navigation::{CursorPosition, Navigator, SharedNavigator};
pub use record::{Field, FieldValue, Record, RecordRef};
pub use source::{
    ChildSource, Controller, ControllerOwnership, CursorController, CursorMove, DataSource,
    MasterSource, Operation, ParentSource, SourceId,
};

/// Errors raised by the navigation layer
#[derive(Error, Debug)]
pub enum NavError {
    #[error("cursor is not on a record (new record: {is_new_record}, empty: {is_empty}, index: {index}, records: {record_count})")]
    CursorState {
        is_new_record: bool,
        is_empty: bool,
        index: isize,
        record_count: usize,
    },

    #[error("no navigator has been created for this source")]
    MissingNavigator,

    #[error("source has been disposed")]
    Disposed,

    #[error(transparent)]
    Controller(#[from] anyhow::Error),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Failures collected while relaying one mutation to every child
#[derive(Error, Debug)]
#[error("{} of {notified} children failed to apply {operation}", .failures.len())]
pub struct NotifyError {
    pub operation: Operation,
    /// Number of children that were visited
    pub notified: usize,
    pub failures: Vec<ChildFailure>,
}

/// A single child's failure during fan-out
#[derive(Debug)]
pub struct ChildFailure {
    pub child: SourceId,
    pub error: NavError,
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use anyhow::bail;
    use parking_lot::Mutex;

    use crate::record::{Field, FieldValue, Record, RecordRef};
    use crate::source::{Controller, CursorMove};

    pub struct TestRecord {
        pub id: u32,
        pub name: String,
        disposed: AtomicBool,
    }

    impl TestRecord {
        pub fn new(id: u32, name: &str) -> Self {
            Self {
                id,
                name: name.to_string(),
                disposed: AtomicBool::new(false),
            }
        }

        pub fn is_disposed(&self) -> bool {
            self.disposed.load(Ordering::SeqCst)
        }
    }

    impl Record for TestRecord {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn fields(&self) -> Vec<Field> {
            vec![
                Field::new("id", FieldValue::Integer(self.id as i64)),
                Field::new("name", FieldValue::Text(self.name.clone())),
            ]
        }

        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }

    /// Records with ids `1..=n`
    pub fn records(n: u32) -> Vec<RecordRef<TestRecord>> {
        (1..=n)
            .map(|id| Arc::new(TestRecord::new(id, &format!("record-{}", id))))
            .collect()
    }

    /// Controller that remembers every request it receives
    #[derive(Default)]
    pub struct RecordingController {
        calls: Mutex<Vec<CursorMove>>,
        log: Option<(&'static str, Arc<Mutex<Vec<&'static str>>>)>,
        fail: bool,
        disposed: AtomicBool,
    }

    impl RecordingController {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Also append `name` to a log shared between controllers
        pub fn logging(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                log: Some((name, log)),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<CursorMove> {
            self.calls.lock().clone()
        }

        pub fn is_disposed(&self) -> bool {
            self.disposed.load(Ordering::SeqCst)
        }

        fn record(&self, movement: CursorMove) -> anyhow::Result<()> {
            self.calls.lock().push(movement);
            if let Some((name, log)) = &self.log {
                log.lock().push(*name);
            }
            if self.fail {
                bail!("grid rejected {:?}", movement);
            }
            Ok(())
        }
    }

    impl Controller for RecordingController {
        fn go_first(&self) -> anyhow::Result<()> {
            self.record(CursorMove::First)
        }

        fn go_last(&self) -> anyhow::Result<()> {
            self.record(CursorMove::Last)
        }

        fn go_previous(&self) -> anyhow::Result<()> {
            self.record(CursorMove::Previous)
        }

        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }
}
