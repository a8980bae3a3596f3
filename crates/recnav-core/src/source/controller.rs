//! UI cursor collaborators

use std::sync::{Arc, Weak};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use super::DataSource;
use crate::record::Record;

/// Something that owns a user-facing cursor bound to a data source, typically a grid.
///
/// A source drives it when one of its own mutations moves the current row.
pub trait Controller: Send + Sync {
    fn go_first(&self) -> anyhow::Result<()>;
    fn go_last(&self) -> anyhow::Result<()>;
    fn go_previous(&self) -> anyhow::Result<()>;

    /// Release the controller. Only called by a source that owns it.
    fn dispose(&self) {}
}

/// A repositioning request issued to a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorMove {
    First,
    Last,
    Previous,
}

impl CursorMove {
    pub fn apply(self, controller: &dyn Controller) -> anyhow::Result<()> {
        match self {
            CursorMove::First => controller.go_first(),
            CursorMove::Last => controller.go_last(),
            CursorMove::Previous => controller.go_previous(),
        }
    }
}

/// Whether tearing down the source also tears down its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerOwnership {
    Owned,
    Borrowed,
}

#[derive(Clone)]
pub(crate) struct ControllerBinding {
    pub(crate) controller: Arc<dyn Controller>,
    pub(crate) ownership: ControllerOwnership,
}

/// Controller with no UI behind it: keeps the source's own navigator in step.
///
/// Each request re-creates the navigator over the source's current contents,
/// keeping the previous position, then applies the move.
pub struct CursorController<M: Record> {
    source: Weak<DataSource<M>>,
}

impl<M: Record> CursorController<M> {
    pub fn new(source: &Arc<DataSource<M>>) -> Self {
        Self {
            source: Arc::downgrade(source),
        }
    }

    fn apply(&self, movement: CursorMove) -> anyhow::Result<()> {
        let source = self
            .source
            .upgrade()
            .ok_or_else(|| anyhow!("data source is gone"))?;
        let navigator = source.navigate()?;
        let mut navigator = navigator.write();
        match movement {
            CursorMove::First => navigator.go_first(),
            CursorMove::Last => navigator.go_last(),
            CursorMove::Previous => navigator.go_previous(),
        };
        Ok(())
    }
}

impl<M: Record> Controller for CursorController<M> {
    fn go_first(&self) -> anyhow::Result<()> {
        self.apply(CursorMove::First)
    }

    fn go_last(&self) -> anyhow::Result<()> {
        self.apply(CursorMove::Last)
    }

    fn go_previous(&self) -> anyhow::Result<()> {
        self.apply(CursorMove::Previous)
    }
}
