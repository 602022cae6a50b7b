use rhai::Engine;
use std::sync::Arc;

use sheetdoc_engine::{SheetState, create_engine};

use super::history::History;
use crate::storage::front_matter::FrontMatter;

/// UI-agnostic document state for one spreadsheet.
pub struct Document {
    /// Shared sheet state: grid, properties, watchers, dependency map.
    pub(crate) state: Arc<SheetState>,
    /// Rhai engine bound to the sheet state.
    pub(crate) engine: Engine,
    /// Metadata parsed from (and serialized back into) the front matter.
    pub front_matter: FrontMatter,
    pub(crate) history: History,
    /// Whether the document changed since it was loaded or saved.
    pub modified: bool,
}

impl Document {
    /// Create an empty document. Side-effect free.
    pub fn new() -> Document {
        let state = Arc::new(SheetState::new());
        let engine = create_engine(state.clone());
        Document {
            state,
            engine,
            front_matter: FrontMatter::default(),
            history: History::new(),
            modified: false,
        }
    }

    /// Shared sheet state, for watcher registration and direct inspection.
    pub fn sheet(&self) -> &Arc<SheetState> {
        &self.state
    }

    /// Number of columns tracked by the document metadata.
    pub fn columns(&self) -> usize {
        self.state.props.lock().unwrap().column_titles.len()
    }

    /// Number of rows tracked by the document metadata.
    pub fn rows(&self) -> usize {
        self.state.props.lock().unwrap().row_heights.len()
    }

    pub fn column_titles(&self) -> Vec<String> {
        self.state.props.lock().unwrap().column_titles.clone()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
