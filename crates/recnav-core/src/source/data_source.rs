//! Mutable record collection with a single live cursor

use std::cmp::Ordering;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::controller::{Controller, ControllerBinding, ControllerOwnership, CursorMove};
use super::protocol::{ChildRegistry, ChildSource, Operation, ParentSource, SourceId};
use crate::config::NavigationSettings;
use crate::navigation::{Navigator, SharedNavigator};
use crate::record::{position_of, Record, RecordRef};
use crate::{ChildFailure, NavError};

/// Outcome of applying a relayed mutation
enum Relay {
    /// Nothing matched; the mutation stops here
    Ignored,
    /// Contents changed; carries the controller request it implies
    Applied(Option<CursorMove>),
}

struct SourceState<M: Record> {
    records: Vec<RecordRef<M>>,
    parent: Option<Weak<dyn ParentSource<M>>>,
    controller: Option<ControllerBinding>,
    navigator: Option<SharedNavigator<M>>,
    disposed: bool,
}

/// An ordered view over records, usually derived from a [`MasterSource`](super::MasterSource).
///
/// Holds at most one navigator. Mutations relayed by the parent are applied
/// here and, when a controller is attached, the controller is asked to move
/// its cursor so it stays on a valid row.
pub struct DataSource<M: Record> {
    id: SourceId,
    name: String,
    me: Weak<DataSource<M>>,
    settings: NavigationSettings,
    state: RwLock<SourceState<M>>,
    children: ChildRegistry<M>,
}

impl<M: Record> DataSource<M> {
    pub fn new(name: impl Into<String>, records: Vec<RecordRef<M>>) -> Arc<Self> {
        Self::with_settings(name, records, NavigationSettings::default())
    }

    pub fn with_settings(
        name: impl Into<String>,
        records: Vec<RecordRef<M>>,
        settings: NavigationSettings,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me| Self {
            id: SourceId::new(),
            name,
            me: me.clone(),
            settings,
            state: RwLock::new(SourceState {
                records,
                parent: None,
                controller: None,
                navigator: None,
                disposed: false,
            }),
            children: ChildRegistry::new(),
        })
    }

    /// Build a filtered view of `parent`'s current records and register it as a child
    pub fn derive_view<P, F>(parent: &P, name: impl Into<String>, predicate: F) -> Arc<Self>
    where
        P: ParentSource<M> + ?Sized,
        F: Fn(&M) -> bool,
    {
        Self::derive_view_with(parent, name, NavigationSettings::default(), predicate)
    }

    pub fn derive_view_with<P, F>(
        parent: &P,
        name: impl Into<String>,
        settings: NavigationSettings,
        predicate: F,
    ) -> Arc<Self>
    where
        P: ParentSource<M> + ?Sized,
        F: Fn(&M) -> bool,
    {
        let records = parent
            .records()
            .into_iter()
            .filter(|record| predicate(record.as_ref()))
            .collect();
        let view = Self::with_settings(name, records, settings);
        parent.add_child(view.clone());
        debug!(view = %view.name, records = view.len(), "derived view");
        view
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.state.read().disposed
    }

    /// Create the navigator, or replace it with one over the current contents.
    ///
    /// A replacement keeps the previous index and new-record gate so that
    /// re-enumerating after a mutation does not lose the user's place.
    pub fn navigate(&self) -> Result<SharedNavigator<M>, NavError> {
        let mut state = self.state.write();
        if state.disposed {
            return Err(NavError::Disposed);
        }

        let snapshot = state.records.clone();
        let navigator = match state.navigator.take() {
            Some(previous) => {
                let mut previous = previous.write();
                let navigator =
                    Navigator::with_position(snapshot, previous.index(), previous.allow_new_record());
                previous.dispose();
                navigator
            }
            None => {
                let mut navigator = Navigator::new(snapshot);
                navigator.set_allow_new_record(self.settings.allow_new_record);
                navigator
            }
        };
        trace!(source = %self.name, index = navigator.index(), records = navigator.record_count(), "navigator created");

        let navigator = Arc::new(RwLock::new(navigator));
        state.navigator = Some(navigator.clone());
        Ok(navigator)
    }

    /// The live navigator, if [`navigate`](Self::navigate) has been called
    pub fn navigator(&self) -> Option<SharedNavigator<M>> {
        self.state.read().navigator.clone()
    }

    /// Human-readable cursor position, e.g. `Record 2 of 5`
    pub fn record_position_displayer(&self) -> Result<String, NavError> {
        let state = self.state.read();
        let navigator = state.navigator.as_ref().ok_or(NavError::MissingNavigator)?;
        let navigator = navigator.read();
        let labels = &self.settings.labels;

        Ok(if navigator.no_records() {
            labels.no_records.clone()
        } else if navigator.is_new_record() {
            labels.new_record.clone()
        } else {
            labels.record_of(navigator.rec_num(), navigator.record_count())
        })
    }

    pub fn attach_controller(&self, controller: Arc<dyn Controller>, ownership: ControllerOwnership) {
        self.state.write().controller = Some(ControllerBinding {
            controller,
            ownership,
        });
    }

    /// Unbind the controller without disposing it
    pub fn detach_controller(&self) -> Option<Arc<dyn Controller>> {
        self.state
            .write()
            .controller
            .take()
            .map(|binding| binding.controller)
    }

    pub fn has_controller(&self) -> bool {
        self.state.read().controller.is_some()
    }

    pub fn parent(&self) -> Option<Arc<dyn ParentSource<M>>> {
        self.state.read().parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn add(&self, record: RecordRef<M>) -> Result<(), NavError> {
        let mut state = self.state.write();
        if state.disposed {
            return Err(NavError::Disposed);
        }
        state.records.push(record);
        Ok(())
    }

    /// Remove the first entry that is the same record. Returns the removed handle.
    pub fn remove(&self, record: &M) -> Option<RecordRef<M>> {
        let mut state = self.state.write();
        let idx = position_of(&state.records, record)?;
        Some(state.records.remove(idx))
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
        self.position_of(record).is_some()
    }

    pub fn position_of(&self, record: &M) -> Option<usize> {
        position_of(&self.state.read().records, record)
    }

    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&RecordRef<M>, &RecordRef<M>) -> Ordering,
    {
        self.state.write().records.sort_by(compare);
    }

    /// Number of live dependents registered with this source
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Tear down: leave the parent's registry, release an owned controller,
    /// dispose the navigator and drop the contents. Safe to call repeatedly.
    pub fn dispose(&self) {
        let (parent, controller, navigator) = {
            let mut state = self.state.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
            (
                state.parent.take(),
                state.controller.take(),
                state.navigator.take(),
            )
        };

        if let Some(parent) = parent.as_ref().and_then(Weak::upgrade) {
            // Duplicate registrations are legal; leave none behind.
            while parent.remove_child(self.id) {}
        }
        if let Some(binding) = controller {
            if binding.ownership == ControllerOwnership::Owned {
                binding.controller.dispose();
            }
        }
        if let Some(navigator) = navigator {
            navigator.write().dispose();
        }
        self.state.write().records.clear();
        self.children.detach_all();

        debug!(source = %self.name, "data source disposed");
    }

    /// Apply a relayed mutation to the contents
    fn apply(&self, operation: Operation, record: &RecordRef<M>) -> Result<Relay, NavError> {
        let mut state = self.state.write();
        if state.disposed {
            return Err(NavError::Disposed);
        }

        let movement = match operation {
            Operation::Insert => {
                state.records.push(record.clone());
                Some(CursorMove::Last)
            }
            Operation::Update => None,
            Operation::Delete => {
                let Some(idx) = position_of(&state.records, record) else {
                    return Ok(Relay::Ignored);
                };
                state.records.remove(idx);

                match &state.navigator {
                    Some(navigator) => {
                        if navigator.read().is_bof() && !state.records.is_empty() {
                            Some(CursorMove::First)
                        } else {
                            Some(CursorMove::Previous)
                        }
                    }
                    None => None,
                }
            }
        };

        debug!(source = %self.name, %operation, key = ?record.key(), records = state.records.len(), "applied update");
        Ok(Relay::Applied(movement))
    }
}

impl<M: Record> ChildSource<M> for DataSource<M> {
    fn source_id(&self) -> SourceId {
        self.id
    }

    fn update(&self, operation: Operation, record: &RecordRef<M>) -> Result<(), NavError> {
        let movement = match self.apply(operation, record)? {
            Relay::Ignored => return Ok(()),
            Relay::Applied(movement) => movement,
        };

        // The state lock is released: the controller may call back into this source.
        let controller = self.state.read().controller.clone();
        let repositioned = match (movement, controller) {
            (Some(movement), Some(binding)) => {
                trace!(source = %self.name, ?movement, "repositioning controller");
                movement.apply(binding.controller.as_ref())
            }
            _ => Ok(()),
        };
        if let Err(error) = &repositioned {
            warn!(source = %self.name, %operation, %error, "controller failed to follow update");
        }

        // Dependents are relayed to even when the controller failed.
        match (repositioned, self.children.notify(operation, record)) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(error), Ok(())) => Err(NavError::Controller(error)),
            (Ok(()), Err(relay)) => Err(relay.into()),
            (Err(error), Err(mut relay)) => {
                relay.failures.insert(
                    0,
                    ChildFailure {
                        child: self.id,
                        error: NavError::Controller(error),
                    },
                );
                Err(relay.into())
            }
        }
    }

    fn attach_parent(&self, parent: Weak<dyn ParentSource<M>>) {
        let mut state = self.state.write();
        if !state.disposed {
            state.parent = Some(parent);
        }
    }

    fn detach_parent(&self) {
        self.state.write().parent = None;
    }
}

impl<M: Record> ParentSource<M> for DataSource<M> {
    fn add_child(&self, child: Arc<dyn ChildSource<M>>) {
        let parent: Weak<dyn ParentSource<M>> = self.me.clone();
        child.attach_parent(parent);
        self.children.register(&child);
        debug!(parent = %self.name, child = %child.source_id(), "child registered");
    }

    fn remove_child(&self, child: SourceId) -> bool {
        self.children.remove(child)
    }

    fn notify_children(&self, operation: Operation, record: &RecordRef<M>) -> Result<(), crate::NotifyError> {
        self.children.notify(operation, record)
    }

    fn records(&self) -> Vec<RecordRef<M>> {
        DataSource::records(self)
    }
}

impl<M: Record> Drop for DataSource<M> {
    fn drop(&mut self) {
        self.dispose();
    }
}
