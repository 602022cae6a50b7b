//! Shared sheet state: the cell grid, document properties, change watchers
//! and the reverse-dependency map.
//!
//! `SheetState` is shared (via `Arc`) between the document model and the
//! closures registered on the Rhai engine, so every piece of state here is
//! interior-mutable. No lock is ever held across an evaluation or a watcher
//! callback.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::cell::{Cell, Grid};
use super::cell_ref::CellRef;

pub const DEFAULT_COLUMN_WIDTH: u32 = 128;
pub const DEFAULT_ROW_HEIGHT: u32 = 28;

/// Document properties kept index-aligned with the grid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SheetProps {
    pub column_titles: Vec<String>,
    pub column_types: Vec<String>,
    pub column_widths: Vec<u32>,
    pub row_heights: Vec<u32>,
    /// Separator used when serializing; parsing falls back to `,`/`;`/tab.
    pub column_separator: Option<String>,
    pub url_escaped: bool,
    /// Label -> stringified address.
    pub labels: HashMap<String, String>,
}

type WatchCallback = Box<dyn FnMut(&str) + Send + Sync>;

struct Watcher {
    id: u64,
    once: bool,
    callback: WatchCallback,
}

/// Handle returned by watcher registration; pass to [`SheetState::unsubscribe`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WatchHandle {
    cell: CellRef,
    id: u64,
}

/// Shared state for one sheet.
pub struct SheetState {
    pub grid: Grid,
    pub props: Mutex<SheetProps>,
    watchers: DashMap<CellRef, Vec<Watcher>>,
    /// Reverse dependency map: cell -> cells whose formulas read it.
    /// Edges are consumed on invalidation and re-recorded at evaluation.
    dependents: DashMap<CellRef, HashSet<CellRef>>,
    /// Cells currently being evaluated, outermost first.
    eval_stack: Mutex<Vec<CellRef>>,
    next_watcher: AtomicU64,
}

impl SheetState {
    pub fn new() -> SheetState {
        SheetState {
            grid: DashMap::new(),
            props: Mutex::new(SheetProps::default()),
            watchers: DashMap::new(),
            dependents: DashMap::new(),
            eval_stack: Mutex::new(Vec::new()),
            next_watcher: AtomicU64::new(0),
        }
    }

    /// Raw text of a cell; absent cells read as empty.
    pub fn raw(&self, cell: CellRef) -> String {
        self.grid
            .get(&cell)
            .map(|entry| entry.raw.clone())
            .unwrap_or_default()
    }

    /// Apply a raw-text change without notifying anyone. Returns the
    /// previous text, or None when nothing changed.
    pub fn apply_raw(&self, cell: CellRef, raw: &str) -> Option<String> {
        if let Some(mut entry) = self.grid.get_mut(&cell) {
            if entry.raw == raw {
                return None;
            }
            entry.memo = None;
            return Some(std::mem::replace(&mut entry.raw, raw.to_string()));
        }
        if raw.is_empty() {
            // An absent cell already reads as empty.
            return None;
        }
        self.grid.insert(cell, Cell::new(raw));
        Some(String::new())
    }

    /// Fire watchers for a changed cell, then invalidate its dependents.
    pub fn notify_change(&self, cell: CellRef, raw: &str) {
        if let Some((_, watchers)) = self.watchers.remove(&cell) {
            let mut keep = Vec::with_capacity(watchers.len());
            for mut watcher in watchers {
                (watcher.callback)(raw);
                if !watcher.once {
                    keep.push(watcher);
                }
            }
            if !keep.is_empty() {
                // A callback may have registered fresh watchers meanwhile.
                self.watchers.entry(cell).or_default().extend(keep);
            }
        }
        self.invalidate_dependents(cell);
    }

    /// Register a watcher fired with the new raw text on every change.
    pub fn on_change(
        &self,
        cell: CellRef,
        callback: impl FnMut(&str) + Send + Sync + 'static,
    ) -> WatchHandle {
        self.watch(cell, false, Box::new(callback))
    }

    /// Register a watcher that fires once and is then removed.
    pub fn on_change_once(
        &self,
        cell: CellRef,
        callback: impl FnMut(&str) + Send + Sync + 'static,
    ) -> WatchHandle {
        self.watch(cell, true, Box::new(callback))
    }

    fn watch(&self, cell: CellRef, once: bool, callback: WatchCallback) -> WatchHandle {
        let id = self.next_watcher.fetch_add(1, Ordering::Relaxed);
        self.watchers
            .entry(cell)
            .or_default()
            .push(Watcher { id, once, callback });
        WatchHandle { cell, id }
    }

    pub fn unsubscribe(&self, handle: WatchHandle) {
        if let Some(mut list) = self.watchers.get_mut(&handle.cell) {
            list.retain(|watcher| watcher.id != handle.id);
        }
    }

    /// Record that the cell currently being evaluated read `source`.
    pub(crate) fn record_dependency(&self, source: CellRef) {
        let Some(dependent) = self.current_cell() else {
            return;
        };
        self.dependents.entry(source).or_default().insert(dependent);
    }

    pub(crate) fn current_cell(&self) -> Option<CellRef> {
        self.eval_stack.lock().unwrap().last().copied()
    }

    pub(crate) fn eval_stack_contains(&self, cell: CellRef) -> bool {
        self.eval_stack.lock().unwrap().contains(&cell)
    }

    pub(crate) fn eval_push(&self, cell: CellRef) {
        self.eval_stack.lock().unwrap().push(cell);
    }

    pub(crate) fn eval_pop(&self) {
        self.eval_stack.lock().unwrap().pop();
    }

    /// Consume the dependency edges out of `cell`, clearing the memo of
    /// every transitive dependent.
    pub fn invalidate_dependents(&self, cell: CellRef) {
        let mut to_process = vec![cell];
        let mut visited = HashSet::new();
        while let Some(source) = to_process.pop() {
            if !visited.insert(source) {
                continue;
            }
            let Some((_, dependents)) = self.dependents.remove(&source) else {
                continue;
            };
            for dependent in dependents {
                if let Some(mut entry) = self.grid.get_mut(&dependent) {
                    entry.memo = None;
                }
                to_process.push(dependent);
            }
        }
    }

    /// Drop every memo and dependency edge. Called after structural
    /// changes, when recorded coordinates no longer mean what they did.
    pub fn clear_caches(&self) {
        for mut entry in self.grid.iter_mut() {
            entry.memo = None;
        }
        self.dependents.clear();
    }

    /// Remove every cell, watcher and dependency edge.
    pub fn clear(&self) {
        self.grid.clear();
        self.watchers.clear();
        self.dependents.clear();
    }
}

impl Default for SheetState {
    fn default() -> Self {
        Self::new()
    }
}
