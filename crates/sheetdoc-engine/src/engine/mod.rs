//! Spreadsheet engine API.

mod cell;
mod cell_ref;
mod error;
mod eval;
mod format;
mod preprocess;
mod sheet;

pub(crate) use eval::CYCLE_MARKER;

pub use cell::{Cell, Grid, Memo, FORMULA_MARKER};
pub use cell_ref::CellRef;
pub use error::EvalError;
pub use eval::{computed_value, create_engine};
pub use format::{format_dynamic, format_number};
pub use preprocess::preprocess_formula;
pub use sheet::{SheetProps, SheetState, WatchHandle, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT};

pub use rhai::{Dynamic, Engine};
