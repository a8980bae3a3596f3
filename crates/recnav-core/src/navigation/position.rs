use serde::{Deserialize, Serialize};

/// Where a navigator rests within its snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CursorPosition {
    /// Before the first record; the only position of a fresh or reset cursor
    #[default]
    BeforeFirst,
    /// On a committed record (zero-based)
    At(usize),
    /// One past the last record: a pending new record, or the cursor ran off the end
    NewRecord,
}

impl CursorPosition {
    /// Map a signed index onto the `[-1, count]` domain
    pub fn from_index(index: isize, count: usize) -> Self {
        if index < 0 {
            CursorPosition::BeforeFirst
        } else if (index as usize) < count {
            CursorPosition::At(index as usize)
        } else {
            CursorPosition::NewRecord
        }
    }

    /// Signed index: `-1` before first, `count` at the new record position
    pub fn to_index(self, count: usize) -> isize {
        match self {
            CursorPosition::BeforeFirst => -1,
            CursorPosition::At(idx) => idx as isize,
            CursorPosition::NewRecord => count as isize,
        }
    }
}
