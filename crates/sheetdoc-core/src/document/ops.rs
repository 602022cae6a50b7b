//! Cell writes, structural operations, undo/redo, labels and column
//! metadata.
//!
//! Every raw-text mutation funnels through [`Document::write_cell`], which
//! records history (unless replaying), fires watchers and invalidates
//! dependents. Structural operations shift grid keys by
//! collect-remove-reinsert and then drop every memo and dependency edge,
//! since recorded coordinates no longer mean what they did.

use sheetdoc_engine::{
    Cell, CellRef, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT, EvalError, computed_value,
};

use super::history::Change;
use super::state::Document;

impl Document {
    /// Raw text at a cell; absent cells read as empty.
    pub fn get_raw(&self, cell: CellRef) -> String {
        self.state.raw(cell)
    }

    /// Computed display value at a cell.
    pub fn computed(&self, cell: CellRef) -> Result<String, EvalError> {
        computed_value(&self.state, &self.engine, cell)
    }

    /// Set the raw text of a cell, growing the sheet to cover it.
    pub fn set_raw(&mut self, cell: CellRef, text: &str) {
        self.ensure_bounds(cell);
        self.write_cell(cell, text, true);
    }

    /// The single write path. No-op when the text is unchanged.
    pub(crate) fn write_cell(&mut self, cell: CellRef, text: &str, record: bool) {
        let Some(old) = self.state.apply_raw(cell, text) else {
            return;
        };
        if record {
            self.history.record(Change {
                cell,
                old,
                new: text.to_string(),
            });
        }
        self.modified = true;
        self.state.notify_change(cell, text);
    }

    /// Grow column and row metadata to cover `cell`.
    pub(crate) fn ensure_bounds(&mut self, cell: CellRef) {
        let mut props = self.state.props.lock().unwrap();
        while props.column_titles.len() <= cell.col {
            let title = format!("Column {}", props.column_titles.len() + 1);
            props.column_titles.push(title);
            props.column_types.push("raw".to_string());
            props.column_widths.push(DEFAULT_COLUMN_WIDTH);
        }
        while props.row_heights.len() <= cell.row {
            props.row_heights.push(DEFAULT_ROW_HEIGHT);
        }
    }

    /// Revert the most recent history frame. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(frame) = self.history.pop_undo() else {
            return false;
        };
        for change in frame.diff.iter().rev() {
            self.write_cell(change.cell, &change.old, false);
        }
        self.history.push_redo(frame);
        true
    }

    /// Re-apply the most recently undone frame.
    pub fn redo(&mut self) -> bool {
        let Some(frame) = self.history.pop_redo() else {
            return false;
        };
        for change in frame.diff.iter() {
            self.write_cell(change.cell, &change.new, false);
        }
        self.history.push_undo(frame);
        true
    }

    /// Insert a column after `after`; `None` appends at the right edge.
    pub fn insert_col(&mut self, after: Option<usize>) {
        let cols = self.columns();
        let at = match after {
            Some(i) => (i + 1).min(cols),
            None => cols,
        };

        let moved: Vec<(CellRef, Cell)> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().col >= at)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (cell, _) in &moved {
            self.state.grid.remove(cell);
        }
        for (cell, data) in moved {
            self.state
                .grid
                .insert(CellRef::new(cell.row, cell.col + 1), data);
        }

        {
            let mut props = self.state.props.lock().unwrap();
            props.column_titles.insert(at, format!("Column {}", at + 1));
            props.column_types.insert(at, "raw".to_string());
            props.column_widths.insert(at, DEFAULT_COLUMN_WIDTH);
        }

        self.state.clear_caches();
        self.modified = true;
    }

    /// Insert a row after `after`; `None` appends at the bottom.
    pub fn insert_row(&mut self, after: Option<usize>) {
        let rows = self.rows();
        let at = match after {
            Some(i) => (i + 1).min(rows),
            None => rows,
        };

        let moved: Vec<(CellRef, Cell)> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().row >= at)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (cell, _) in &moved {
            self.state.grid.remove(cell);
        }
        for (cell, data) in moved {
            self.state
                .grid
                .insert(CellRef::new(cell.row + 1, cell.col), data);
        }

        self.state
            .props
            .lock()
            .unwrap()
            .row_heights
            .insert(at, DEFAULT_ROW_HEIGHT);

        self.state.clear_caches();
        self.modified = true;
    }

    /// Remove a column. Out-of-range indices are a no-op.
    pub fn remove_col(&mut self, col: usize) {
        if col >= self.columns() {
            return;
        }

        let doomed: Vec<CellRef> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().col == col)
            .map(|entry| *entry.key())
            .collect();
        for cell in doomed {
            self.state.grid.remove(&cell);
        }

        let moved: Vec<(CellRef, Cell)> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().col > col)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (cell, _) in &moved {
            self.state.grid.remove(cell);
        }
        for (cell, data) in moved {
            self.state
                .grid
                .insert(CellRef::new(cell.row, cell.col - 1), data);
        }

        {
            let mut props = self.state.props.lock().unwrap();
            props.column_titles.remove(col);
            props.column_types.remove(col);
            props.column_widths.remove(col);
        }

        self.state.clear_caches();
        self.modified = true;
    }

    /// Remove a row. Out-of-range indices are a no-op.
    pub fn remove_row(&mut self, row: usize) {
        if row >= self.rows() {
            return;
        }

        let doomed: Vec<CellRef> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().row == row)
            .map(|entry| *entry.key())
            .collect();
        for cell in doomed {
            self.state.grid.remove(&cell);
        }

        let moved: Vec<(CellRef, Cell)> = self
            .state
            .grid
            .iter()
            .filter(|entry| entry.key().row > row)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (cell, _) in &moved {
            self.state.grid.remove(cell);
        }
        for (cell, data) in moved {
            self.state
                .grid
                .insert(CellRef::new(cell.row - 1, cell.col), data);
        }

        self.state.props.lock().unwrap().row_heights.remove(row);

        self.state.clear_caches();
        self.modified = true;
    }

    /// Empty the grid. Column metadata survives, row metadata does not.
    pub fn clear(&mut self) {
        self.state.clear();
        self.state.props.lock().unwrap().row_heights.clear();
        self.modified = true;
    }

    /// Bind a label to a cell, making it addressable from formulas.
    pub fn set_label(&mut self, name: &str, cell: CellRef) {
        self.front_matter
            .labelled_cells
            .insert(name.to_string(), cell.to_string());
        self.state
            .props
            .lock()
            .unwrap()
            .labels
            .insert(name.to_string(), cell.to_string());
        // Retargeting a label can change what any formula means.
        self.state.clear_caches();
        self.modified = true;
    }

    pub fn label(&self, name: &str) -> Option<CellRef> {
        self.state
            .props
            .lock()
            .unwrap()
            .labels
            .get(name)
            .and_then(|address| CellRef::parse(address))
    }

    /// Rename a column. Out-of-range indices are a no-op.
    pub fn set_column_title(&mut self, col: usize, title: &str) {
        {
            let mut props = self.state.props.lock().unwrap();
            if col >= props.column_titles.len() {
                return;
            }
            props.column_titles[col] = title.to_string();
        }
        // Column references resolve by title.
        self.state.clear_caches();
        self.modified = true;
    }

    pub fn column_title(&self, col: usize) -> Option<String> {
        self.state
            .props
            .lock()
            .unwrap()
            .column_titles
            .get(col)
            .cloned()
    }

    /// Change a column's declared type. Out-of-range indices are a no-op.
    pub fn set_column_type(&mut self, col: usize, ty: &str) {
        let mut props = self.state.props.lock().unwrap();
        if col >= props.column_types.len() {
            return;
        }
        props.column_types[col] = ty.to_string();
        drop(props);
        self.modified = true;
    }

    pub fn column_type(&self, col: usize) -> Option<String> {
        self.state
            .props
            .lock()
            .unwrap()
            .column_types
            .get(col)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_raw_grows_metadata() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(2, 3), "x");
        assert_eq!(doc.columns(), 4);
        assert_eq!(doc.rows(), 3);
        assert_eq!(doc.column_title(3), Some("Column 4".to_string()));
        assert_eq!(doc.get_raw(CellRef::new(2, 3)), "x");
    }

    #[test]
    fn test_unchanged_write_records_nothing() {
        let mut doc = Document::new();
        let a0 = CellRef::new(0, 0);
        doc.set_raw(a0, "x");
        assert_eq!(doc.undo_depth(), 1);
        doc.set_raw(a0, "x");
        assert_eq!(doc.undo_depth(), 1);
    }

    #[test]
    fn test_undo_redo_single_edit() {
        let mut doc = Document::new();
        let a0 = CellRef::new(0, 0);
        doc.set_raw(a0, "first");

        assert!(doc.undo());
        assert_eq!(doc.get_raw(a0), "");
        assert!(doc.redo());
        assert_eq!(doc.get_raw(a0), "first");
        assert!(!doc.redo());
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut doc = Document::new();
        assert!(!doc.undo());
    }

    #[test]
    fn test_dependent_recomputes_after_edit() {
        let mut doc = Document::new();
        let a0 = CellRef::new(0, 0);
        let b0 = CellRef::new(0, 1);
        doc.set_raw(a0, "5");
        doc.set_raw(b0, "=A0 + 2");

        assert_eq!(doc.computed(b0), Ok("7".to_string()));
        doc.set_raw(a0, "10");
        assert_eq!(doc.computed(b0), Ok("12".to_string()));
    }

    #[test]
    fn test_insert_col_shifts_cells_and_metadata() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "a");
        doc.set_raw(CellRef::new(0, 1), "b");
        doc.set_column_title(0, "First");
        doc.set_column_title(1, "Second");

        doc.insert_col(Some(0));

        assert_eq!(doc.columns(), 3);
        assert_eq!(
            doc.column_titles(),
            vec!["First", "Column 2", "Second"]
        );
        assert_eq!(doc.get_raw(CellRef::new(0, 0)), "a");
        assert_eq!(doc.get_raw(CellRef::new(0, 1)), "");
        assert_eq!(doc.get_raw(CellRef::new(0, 2)), "b");
    }

    #[test]
    fn test_insert_row_after_index() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "top");
        doc.set_raw(CellRef::new(1, 0), "bottom");

        doc.insert_row(Some(0));

        assert_eq!(doc.rows(), 3);
        assert_eq!(doc.get_raw(CellRef::new(0, 0)), "top");
        assert_eq!(doc.get_raw(CellRef::new(1, 0)), "");
        assert_eq!(doc.get_raw(CellRef::new(2, 0)), "bottom");
    }

    #[test]
    fn test_append_col_and_row() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "a");
        doc.insert_col(None);
        doc.insert_row(None);
        assert_eq!(doc.columns(), 2);
        assert_eq!(doc.rows(), 2);
        assert_eq!(doc.column_title(1), Some("Column 2".to_string()));
    }

    #[test]
    fn test_remove_col_shifts_down() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "a");
        doc.set_raw(CellRef::new(0, 1), "b");
        doc.set_raw(CellRef::new(0, 2), "c");

        doc.remove_col(1);

        assert_eq!(doc.columns(), 2);
        assert_eq!(doc.get_raw(CellRef::new(0, 0)), "a");
        assert_eq!(doc.get_raw(CellRef::new(0, 1)), "c");
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "a");
        doc.remove_col(7);
        doc.remove_row(7);
        assert_eq!(doc.get_raw(CellRef::new(0, 0)), "a");
        assert_eq!(doc.columns(), 1);
        assert_eq!(doc.rows(), 1);
    }

    #[test]
    fn test_structural_op_invalidates_formulas() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "5");
        doc.set_raw(CellRef::new(0, 1), "=A0 * 2");
        assert_eq!(doc.computed(CellRef::new(0, 1)), Ok("10".to_string()));

        // The formula cell moves to C0; its memo was dropped, so it
        // re-evaluates and still finds A0.
        doc.insert_col(Some(0));
        doc.set_raw(CellRef::new(0, 1), "ignored");
        assert_eq!(doc.computed(CellRef::new(0, 2)), Ok("10".to_string()));
    }

    #[test]
    fn test_labels() {
        let mut doc = Document::new();
        let b4 = CellRef::new(4, 1);
        doc.set_raw(b4, "21");
        doc.set_label("total", b4);

        assert_eq!(doc.label("total"), Some(b4));
        doc.set_raw(CellRef::new(0, 0), "=total * 2");
        assert_eq!(doc.computed(CellRef::new(0, 0)), Ok("42".to_string()));
        assert_eq!(
            doc.front_matter.labelled_cells.get("total"),
            Some(&"B4".to_string())
        );
    }

    #[test]
    fn test_rename_column_retargets_references() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(0, 0), "3");
        doc.set_raw(CellRef::new(0, 1), "=:Price");
        doc.set_column_title(0, "Price");
        assert_eq!(doc.computed(CellRef::new(0, 1)), Ok("3".to_string()));

        doc.set_column_title(0, "Cost");
        assert_eq!(doc.computed(CellRef::new(0, 1)), Ok(String::new()));
    }

    #[test]
    fn test_clear_keeps_column_metadata() {
        let mut doc = Document::new();
        doc.set_raw(CellRef::new(1, 1), "x");
        doc.set_column_title(0, "Keep");
        doc.clear();

        assert_eq!(doc.get_raw(CellRef::new(1, 1)), "");
        assert_eq!(doc.rows(), 0);
        assert_eq!(doc.column_title(0), Some("Keep".to_string()));
    }
}
