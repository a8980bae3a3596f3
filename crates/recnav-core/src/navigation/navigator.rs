//! Navigator implementation

use super::CursorPosition;
use crate::record::{position_of, Record, RecordRef};
use crate::NavError;

/// A resettable cursor over an immutable snapshot of records.
///
/// Moves never fail loudly: each reports whether the cursor ended up on a
/// committed record. Running past the last record lands on the new record
/// position, which callers use to detect the end of the snapshot.
pub struct Navigator<M: Record> {
    records: Vec<RecordRef<M>>,
    position: CursorPosition,
    allow_new_record: bool,
}

impl<M: Record> Navigator<M> {
    /// Create a cursor before the first record of `records`
    pub fn new(records: Vec<RecordRef<M>>) -> Self {
        Self {
            records,
            position: CursorPosition::BeforeFirst,
            allow_new_record: false,
        }
    }

    /// Create a cursor at an explicit signed index, as carried over from a previous cursor.
    ///
    /// Over an empty snapshot the cursor only rests on the new record position
    /// when new records are allowed; otherwise it falls back before the first.
    pub fn with_position(records: Vec<RecordRef<M>>, index: isize, allow_new_record: bool) -> Self {
        let position = match CursorPosition::from_index(index, records.len()) {
            CursorPosition::NewRecord if records.is_empty() && !allow_new_record => {
                CursorPosition::BeforeFirst
            }
            position => position,
        };
        Self {
            records,
            position,
            allow_new_record,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn last_index(&self) -> isize {
        self.records.len() as isize - 1
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// Signed index in `[-1, record_count]`
    pub fn index(&self) -> isize {
        self.position.to_index(self.records.len())
    }

    /// One-based record number
    pub fn rec_num(&self) -> isize {
        self.index() + 1
    }

    pub fn is_bof(&self) -> bool {
        self.index() == 0
    }

    pub fn is_eof(&self) -> bool {
        self.index() == self.last_index()
    }

    pub fn is_new_record(&self) -> bool {
        self.position == CursorPosition::NewRecord
    }

    pub fn no_records(&self) -> bool {
        self.is_empty() && !self.is_new_record()
    }

    pub fn allow_new_record(&self) -> bool {
        self.allow_new_record
    }

    pub fn set_allow_new_record(&mut self, allow: bool) {
        self.allow_new_record = allow;
    }

    pub fn go_first(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.position = CursorPosition::At(0);
        true
    }

    pub fn go_last(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.position = CursorPosition::At(self.records.len() - 1);
        true
    }

    /// Step forward. Returns false once the cursor is past the last record.
    pub fn go_next(&mut self) -> bool {
        let next = self.index().saturating_add(1);
        self.position = CursorPosition::from_index(next, self.records.len());
        self.index() <= self.last_index()
    }

    /// Step back. Returns false once the cursor is before the first record.
    pub fn go_previous(&mut self) -> bool {
        let previous = self.index() - 1;
        self.position = CursorPosition::from_index(previous, self.records.len());
        self.index() > -1
    }

    /// Move to the pending new record position
    pub fn go_new(&mut self) -> bool {
        if !self.allow_new_record || self.is_new_record() {
            return false;
        }
        self.position = CursorPosition::NewRecord;
        true
    }

    /// Absolute seek to a zero-based index
    pub fn go_at(&mut self, index: usize) -> bool {
        if self.is_empty() {
            self.position = CursorPosition::BeforeFirst;
            return false;
        }
        if index < self.records.len() {
            self.position = CursorPosition::At(index);
            true
        } else {
            self.position = CursorPosition::NewRecord;
            false
        }
    }

    /// Seek to the first snapshot entry that is the same record as `record`.
    /// Leaves the cursor untouched when there is no such entry.
    pub fn go_to_record(&mut self, record: &M) -> bool {
        match position_of(&self.records, record) {
            Some(idx) => {
                self.position = CursorPosition::At(idx);
                true
            }
            None => false,
        }
    }

    /// Return to the position before the first record
    pub fn reset(&mut self) {
        self.position = CursorPosition::BeforeFirst;
    }

    /// Strict read of the record under the cursor.
    ///
    /// `Ok(None)` at the new record position; an error anywhere else outside
    /// the snapshot.
    pub fn current_record(&self) -> Result<Option<RecordRef<M>>, NavError> {
        match self.position {
            CursorPosition::NewRecord => Ok(None),
            CursorPosition::At(idx) => match self.records.get(idx) {
                Some(record) => Ok(Some(record.clone())),
                None => Err(self.cursor_state_error()),
            },
            CursorPosition::BeforeFirst => Err(self.cursor_state_error()),
        }
    }

    /// Lenient read used by iteration: cursor errors become `None`
    pub fn current(&self) -> Option<RecordRef<M>> {
        self.current_record().ok().flatten()
    }

    fn cursor_state_error(&self) -> NavError {
        NavError::CursorState {
            is_new_record: self.is_new_record(),
            is_empty: self.is_empty(),
            index: self.index(),
            record_count: self.record_count(),
        }
    }

    /// Release the snapshot. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.records = Vec::new();
        self.position = CursorPosition::BeforeFirst;
    }
}

impl<M: Record> Iterator for Navigator<M> {
    type Item = RecordRef<M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.go_next() {
            self.current()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{records, TestRecord};
    use std::sync::Arc;

    fn navigator(n: u32) -> Navigator<TestRecord> {
        Navigator::new(records(n))
    }

    #[test]
    fn test_fresh_navigator_is_before_first() {
        let nav = navigator(3);
        assert_eq!(nav.index(), -1);
        assert_eq!(nav.position(), CursorPosition::BeforeFirst);
        assert!(!nav.is_bof());
        assert!(!nav.is_eof());
        assert!(!nav.no_records());
    }

    #[test]
    fn test_empty_navigator_reports_no_records() {
        let mut nav = navigator(0);
        assert_eq!(nav.index(), -1);
        assert!(nav.no_records());
        assert!(!nav.go_first());
        assert!(!nav.go_last());
        assert_eq!(nav.index(), -1);
    }

    #[test]
    fn test_go_first_and_last() {
        for n in 1..6 {
            let mut nav = navigator(n);
            assert!(nav.go_first());
            assert!(nav.is_bof());
            assert_eq!(nav.index(), 0);

            assert!(nav.go_last());
            assert!(nav.is_eof());
            assert_eq!(nav.index(), n as isize - 1);
        }
    }

    #[test]
    fn test_go_next_runs_off_the_end() {
        for n in 1..6u32 {
            let mut nav = navigator(n);
            for expected in 0..n {
                assert!(nav.go_next());
                assert_eq!(nav.index(), expected as isize);
            }
            assert!(!nav.go_next());
            assert_eq!(nav.index(), n as isize);
            assert!(nav.is_new_record());

            // the end is sticky
            assert!(!nav.go_next());
            assert_eq!(nav.index(), n as isize);
        }
    }

    #[test]
    fn test_go_next_from_first_reaches_sentinel_on_nth_call() {
        let n = 4;
        let mut nav = navigator(n);
        nav.go_first();
        let results: Vec<bool> = (0..n).map(|_| nav.go_next()).collect();
        assert_eq!(results, vec![true, true, true, false]);
        assert_eq!(nav.index(), n as isize);
    }

    #[test]
    fn test_go_previous() {
        let mut nav = navigator(3);
        nav.go_last();
        assert!(nav.go_previous());
        assert!(nav.go_previous());
        assert!(nav.is_bof());
        assert!(!nav.go_previous());
        assert_eq!(nav.index(), -1);
        assert!(!nav.go_previous());
        assert_eq!(nav.index(), -1);
    }

    #[test]
    fn test_go_previous_from_new_record_lands_on_last() {
        let mut nav = Navigator::with_position(records(3), 3, true);
        assert!(nav.is_new_record());
        assert!(nav.go_previous());
        assert!(nav.is_eof());
    }

    #[test]
    fn test_go_new_respects_gate() {
        let mut nav = navigator(3);
        for idx in [-1isize, 0, 2] {
            let mut nav = Navigator::with_position(records(3), idx, false);
            assert!(!nav.go_new());
            assert_eq!(nav.index(), idx);
        }

        nav.set_allow_new_record(true);
        assert!(nav.go_new());
        assert!(nav.is_new_record());
        assert_eq!(nav.rec_num(), 4);
        assert!(!nav.go_new());
    }

    #[test]
    fn test_go_at() {
        let mut nav = navigator(3);
        assert!(nav.go_at(1));
        assert_eq!(nav.index(), 1);
        assert!(!nav.go_at(3));
        assert!(nav.is_new_record());

        // indices beyond isize::MAX must not wrap to before-first
        assert!(!nav.go_at(usize::MAX));
        assert!(nav.is_new_record());
        assert!(nav.current_record().unwrap().is_none());
        assert!(!nav.go_at(isize::MAX as usize + 1));
        assert_eq!(nav.index(), 3);

        let mut empty = navigator(0);
        assert!(!empty.go_at(0));
        assert_eq!(empty.index(), -1);
    }

    #[test]
    fn test_go_to_record() {
        let snapshot = records(3);
        let target = snapshot[2].clone();
        let mut nav = Navigator::new(snapshot);
        nav.go_first();

        let stranger = TestRecord::new(99, "stranger");
        assert!(!nav.go_to_record(&stranger));
        assert_eq!(nav.index(), 0);

        // identity, not handle, equality
        let copy = TestRecord::new(target.id, "renamed");
        assert!(nav.go_to_record(&copy));
        assert_eq!(nav.index(), 2);
    }

    #[test]
    fn test_current_record_is_strict() {
        let mut nav = navigator(2);
        match nav.current_record() {
            Err(NavError::CursorState { is_new_record, is_empty, index, record_count }) => {
                assert!(!is_new_record);
                assert!(!is_empty);
                assert_eq!(index, -1);
                assert_eq!(record_count, 2);
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.map(|r| r.id))),
        }
        assert!(nav.current().is_none());

        nav.go_last();
        assert_eq!(nav.current_record().unwrap().unwrap().id, 2);

        nav.go_next();
        assert!(nav.current_record().unwrap().is_none());
    }

    #[test]
    fn test_iteration_visits_every_record() {
        let nav = navigator(4);
        let ids: Vec<u32> = nav.map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let mut nav = navigator(2);
        assert_eq!(nav.by_ref().count(), 2);
        nav.reset();
        assert_eq!(nav.next().map(|r| r.id), Some(1));
    }

    #[test]
    fn test_with_position_clamps_into_domain() {
        let nav = Navigator::with_position(records(2), 5, false);
        assert!(nav.is_new_record());

        let nav: Navigator<TestRecord> = Navigator::with_position(Vec::new(), 0, false);
        assert!(!nav.is_new_record());
        assert!(nav.no_records());
        assert_eq!(nav.index(), -1);

        let nav: Navigator<TestRecord> = Navigator::with_position(Vec::new(), 0, true);
        assert!(nav.is_new_record());
        assert!(!nav.no_records());

        let nav: Navigator<TestRecord> = Navigator::with_position(Vec::new(), -1, true);
        assert!(nav.no_records());
        assert!(nav.allow_new_record());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let snapshot = records(2);
        let first = snapshot[0].clone();
        let mut nav = Navigator::new(snapshot);
        nav.go_first();
        nav.dispose();
        nav.dispose();
        assert!(nav.is_empty());
        assert_eq!(nav.index(), -1);
        assert_eq!(Arc::strong_count(&first), 1);
    }
}
