//! Record collections and the notification protocol between them

mod controller;
mod data_source;
mod master_source;
mod protocol;

pub use controller::{Controller, ControllerOwnership, CursorController, CursorMove};
pub use data_source::DataSource;
pub use master_source::MasterSource;
pub use protocol::{ChildSource, Operation, ParentSource, SourceId};
