//! Coalescing undo/redo history.
//!
//! Rapid edits are grouped into one frame so a burst of typing undoes as a
//! unit. Within an open frame, repeat edits to the same cell update that
//! cell's `new` text in place, keeping the frame at one entry per cell with
//! the original `old` text intact.

use std::time::{Duration, Instant};

use sheetdoc_engine::CellRef;

/// Maximum number of history frames to keep.
pub(crate) const MAX_HISTORY: usize = 128;

/// Edits closer together than this join the open frame.
pub(crate) const COALESCE_WINDOW: Duration = Duration::from_millis(2000);

/// One cell edit: previous and new raw text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Change {
    pub cell: CellRef,
    pub old: String,
    pub new: String,
}

/// A group of edits applied and reverted together.
#[derive(Clone, Debug)]
pub struct Snapshot {
    at: Instant,
    pub diff: Vec<Change>,
}

pub(crate) struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl History {
    pub fn new() -> History {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Record a fresh user edit. Clears the redo stack.
    pub fn record(&mut self, change: Change) {
        self.record_at(change, Instant::now());
    }

    fn record_at(&mut self, change: Change, now: Instant) {
        self.redo.clear();

        // The window is anchored at frame creation, so a steady burst of
        // edits still splits into a new frame every window length.
        if let Some(open) = self.undo.last_mut()
            && now.duration_since(open.at) < COALESCE_WINDOW
        {
            if let Some(existing) = open.diff.iter_mut().find(|c| c.cell == change.cell) {
                existing.new = change.new;
            } else {
                open.diff.push(change);
            }
            return;
        }

        self.undo.push(Snapshot {
            at: now,
            diff: vec![change],
        });
        if self.undo.len() > MAX_HISTORY {
            self.undo.remove(0);
        }
    }

    pub fn pop_undo(&mut self) -> Option<Snapshot> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Snapshot> {
        self.redo.pop()
    }

    pub fn push_undo(&mut self, frame: Snapshot) {
        self.undo.push(frame);
    }

    pub fn push_redo(&mut self, frame: Snapshot) {
        self.redo.push(frame);
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(cell: CellRef, old: &str, new: &str) -> Change {
        Change {
            cell,
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    #[test]
    fn test_same_cell_edits_coalesce_in_place() {
        let mut history = History::new();
        let a0 = CellRef::new(0, 0);
        let base = Instant::now();

        history.record_at(change(a0, "", "h"), base);
        history.record_at(change(a0, "h", "hi"), base + Duration::from_millis(100));

        assert_eq!(history.undo_depth(), 1);
        let frame = history.pop_undo().unwrap();
        assert_eq!(frame.diff, vec![change(a0, "", "hi")]);
    }

    #[test]
    fn test_distinct_cells_share_a_frame() {
        let mut history = History::new();
        let base = Instant::now();

        history.record_at(change(CellRef::new(0, 0), "", "a"), base);
        history.record_at(
            change(CellRef::new(0, 1), "", "b"),
            base + Duration::from_millis(500),
        );

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.pop_undo().unwrap().diff.len(), 2);
    }

    #[test]
    fn test_window_expiry_opens_a_new_frame() {
        let mut history = History::new();
        let a0 = CellRef::new(0, 0);
        let base = Instant::now();

        history.record_at(change(a0, "", "a"), base);
        history.record_at(change(a0, "a", "b"), base + Duration::from_millis(2500));

        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_window_is_anchored_at_frame_creation() {
        let mut history = History::new();
        let a0 = CellRef::new(0, 0);
        let base = Instant::now();

        history.record_at(change(a0, "", "a"), base);
        history.record_at(change(a0, "a", "b"), base + Duration::from_millis(1500));
        history.record_at(change(a0, "b", "c"), base + Duration::from_millis(3000));

        // The third edit is 3000 ms after the frame opened, so the steady
        // burst splits even though each gap is under the window.
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.pop_undo().unwrap().diff, vec![change(a0, "b", "c")]);
        assert_eq!(history.pop_undo().unwrap().diff, vec![change(a0, "", "b")]);
    }

    #[test]
    fn test_capacity_evicts_oldest_frame() {
        let mut history = History::new();
        let base = Instant::now();

        for i in 0..(MAX_HISTORY + 10) {
            history.record_at(
                change(CellRef::new(0, 0), "", &i.to_string()),
                base + Duration::from_secs(3 * i as u64),
            );
        }

        assert_eq!(history.undo_depth(), MAX_HISTORY);
        // The oldest surviving frame is number 10.
        let oldest = history.undo.first().unwrap();
        assert_eq!(oldest.diff[0].new, "10");
    }

    #[test]
    fn test_recording_clears_redo() {
        let mut history = History::new();
        let a0 = CellRef::new(0, 0);
        let base = Instant::now();

        history.record_at(change(a0, "", "a"), base);
        let frame = history.pop_undo().unwrap();
        history.push_redo(frame);
        assert_eq!(history.redo_depth(), 1);

        history.record_at(change(a0, "a", "b"), base + Duration::from_secs(5));
        assert_eq!(history.redo_depth(), 0);
    }
}
