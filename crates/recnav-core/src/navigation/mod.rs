//! Cursor over a fixed snapshot of records

use std::sync::Arc;

use parking_lot::RwLock;

mod navigator;
mod position;

pub use navigator::Navigator;
pub use position::CursorPosition;

/// Handle to the live navigator of a source
pub type SharedNavigator<M> = Arc<RwLock<Navigator<M>>>;
