//! sheetdoc-engine - shared cell store and Rhai formula evaluation.

pub mod builtins;
pub mod engine;

pub use engine::{
    Cell, CellRef, EvalError, Grid, Memo, SheetProps, SheetState, WatchHandle, computed_value,
    create_engine, format_dynamic, format_number, preprocess_formula, DEFAULT_COLUMN_WIDTH,
    DEFAULT_ROW_HEIGHT, FORMULA_MARKER,
};
