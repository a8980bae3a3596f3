//! Parent/child notification protocol
//!
//! Parents keep non-owning handles to their dependents and push every
//! mutation to them synchronously, in registration order. Children keep a
//! single non-owning handle back to their parent.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::record::{Record, RecordRef};
use crate::{ChildFailure, NavError, NotifyError};

/// Mutation relayed from a parent to its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        })
    }
}

/// Identity of a source within a dependency tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A dependent view that receives mutations from its parent
pub trait ChildSource<M: Record>: Send + Sync {
    fn source_id(&self) -> SourceId;

    /// Apply a mutation already applied by the parent
    fn update(&self, operation: Operation, record: &RecordRef<M>) -> Result<(), NavError>;

    /// Store the back-reference to the parent this child is registered with
    fn attach_parent(&self, parent: Weak<dyn ParentSource<M>>);

    /// Drop the back-reference without touching the parent's registry
    fn detach_parent(&self);
}

/// A collection other sources can depend on
pub trait ParentSource<M: Record>: Send + Sync {
    /// Register `child` and point its back-reference here.
    ///
    /// Registrations are not de-duplicated: a child added twice is notified
    /// twice per mutation.
    fn add_child(&self, child: Arc<dyn ChildSource<M>>);

    /// Remove the first registration of `child`. Returns whether one was found.
    fn remove_child(&self, child: SourceId) -> bool;

    /// Push a mutation to every registered child.
    ///
    /// Every child is visited even when an earlier one fails; failures are
    /// collected into the returned error.
    fn notify_children(&self, operation: Operation, record: &RecordRef<M>) -> Result<(), NotifyError>;

    /// Current contents, in order
    fn records(&self) -> Vec<RecordRef<M>>;
}

struct ChildEntry<M: Record> {
    id: SourceId,
    child: Weak<dyn ChildSource<M>>,
}

/// Registration list shared by every kind of parent
pub(crate) struct ChildRegistry<M: Record> {
    entries: RwLock<Vec<ChildEntry<M>>>,
}

impl<M: Record> ChildRegistry<M> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, child: &Arc<dyn ChildSource<M>>) {
        let id = child.source_id();
        self.entries.write().push(ChildEntry {
            id,
            child: Arc::downgrade(child),
        });
    }

    pub(crate) fn remove(&self, id: SourceId) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|entry| entry.id == id) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Live registrations, duplicates included
    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.child.strong_count() > 0)
            .count()
    }

    pub(crate) fn notify(
        &self,
        operation: Operation,
        record: &RecordRef<M>,
    ) -> Result<(), NotifyError> {
        // Upgrade under the lock, call out without it: children may detach
        // themselves while being notified.
        let children: Vec<(SourceId, Arc<dyn ChildSource<M>>)> = {
            let mut entries = self.entries.write();
            entries.retain(|entry| entry.child.strong_count() > 0);
            entries
                .iter()
                .filter_map(|entry| entry.child.upgrade().map(|child| (entry.id, child)))
                .collect()
        };

        let mut failures = Vec::new();
        for (id, child) in &children {
            trace!(child = %id, %operation, "relaying to child");
            if let Err(error) = child.update(operation, record) {
                warn!(child = %id, %operation, %error, "child failed to apply update");
                failures.push(ChildFailure { child: *id, error });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError {
                operation,
                notified: children.len(),
                failures,
            })
        }
    }

    /// Forget every child and sever their back-references. Children are not notified.
    pub(crate) fn detach_all(&self) {
        let entries = std::mem::take(&mut *self.entries.write());
        for entry in entries {
            if let Some(child) = entry.child.upgrade() {
                child.detach_parent();
            }
        }
    }
}
