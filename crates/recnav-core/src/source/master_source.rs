//! The canonical collection at the root of a dependency tree

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info};

use super::protocol::{ChildRegistry, ChildSource, Operation, ParentSource, SourceId};
use crate::record::{position_of, Record, RecordRef};
use crate::{NavError, NotifyError};

struct MasterState<M: Record> {
    records: Vec<RecordRef<M>>,
    disposed: bool,
}

/// Owns the records of one entity set and fans out every mutation to the
/// views registered as its children.
pub struct MasterSource<M: Record> {
    id: SourceId,
    name: String,
    me: Weak<MasterSource<M>>,
    state: RwLock<MasterState<M>>,
    children: ChildRegistry<M>,
}

impl<M: Record> MasterSource<M> {
    pub fn new(name: impl Into<String>, records: Vec<RecordRef<M>>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me| Self {
            id: SourceId::new(),
            name,
            me: me.clone(),
            state: RwLock::new(MasterState {
                records,
                disposed: false,
            }),
            children: ChildRegistry::new(),
        })
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append without notifying children
    pub fn add(&self, record: RecordRef<M>) -> Result<(), NavError> {
        let mut state = self.state.write();
        if state.disposed {
            return Err(NavError::Disposed);
        }
        state.records.push(record);
        Ok(())
    }

    /// Remove the first entry that is the same record, without notifying children
    pub fn remove(&self, record: &M) -> Option<RecordRef<M>> {
        let mut state = self.state.write();
        let idx = position_of(&state.records, record)?;
        Some(state.records.remove(idx))
    }

    /// Append `record` and relay the insert to every child
    pub fn insert(&self, record: RecordRef<M>) -> Result<(), NavError> {
        self.add(record.clone())?;
        self.notify_children(Operation::Insert, &record)?;
        Ok(())
    }

    /// Relay an in-place change of `record` to every child
    pub fn update(&self, record: &RecordRef<M>) -> Result<(), NavError> {
        if self.is_disposed() {
            return Err(NavError::Disposed);
        }
        self.notify_children(Operation::Update, record)?;
        Ok(())
    }

    /// Remove `record` and relay the delete to every child.
    ///
    /// Returns the removed handle, or `None` (and notifies nobody) when the
    /// record is not part of this collection. The record is not disposed.
    pub fn delete(&self, record: &M) -> Result<Option<RecordRef<M>>, NavError> {
        if self.is_disposed() {
            return Err(NavError::Disposed);
        }
        let Some(removed) = self.remove(record) else {
            return Ok(None);
        };
        self.notify_children(Operation::Delete, &removed)?;
        Ok(Some(removed))
    }

    /// Current contents, in order
    pub fn records(&self) -> Vec<RecordRef<M>> {
        self.state.read().records.clone()
    }

    pub fn get(&self, index: usize) -> Option<RecordRef<M>> {
        self.state.read().records.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    pub fn contains(&self, record: &M) -> bool {
        position_of(&self.state.read().records, record).is_some()
    }

    /// Live child registrations, duplicates counted
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.read().disposed
    }

    /// Dispose every owned record and forget every child.
    ///
    /// Children lose their back-reference but are not notified.
    pub fn dispose(&self) {
        let records = {
            let mut state = self.state.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.records)
        };

        for record in &records {
            record.dispose();
        }
        self.children.detach_all();

        info!(source = %self.name, records = records.len(), "master source disposed");
    }
}

impl<M: Record> ParentSource<M> for MasterSource<M> {
    fn add_child(&self, child: Arc<dyn ChildSource<M>>) {
        let parent: Weak<dyn ParentSource<M>> = self.me.clone();
        child.attach_parent(parent);
        self.children.register(&child);
        debug!(parent = %self.name, child = %child.source_id(), "child registered");
    }

    fn remove_child(&self, child: SourceId) -> bool {
        let removed = self.children.remove(child);
        if removed {
            debug!(parent = %self.name, %child, "child removed");
        }
        removed
    }

    fn notify_children(&self, operation: Operation, record: &RecordRef<M>) -> Result<(), NotifyError> {
        debug!(source = %self.name, %operation, key = ?record.key(), "notifying children");
        self.children.notify(operation, record)
    }

    fn records(&self) -> Vec<RecordRef<M>> {
        MasterSource::records(self)
    }
}

impl<M: Record> Drop for MasterSource<M> {
    fn drop(&mut self) {
        self.dispose();
    }
}
