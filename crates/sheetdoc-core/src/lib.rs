//! sheetdoc-core - UI-agnostic spreadsheet document model.

pub mod document;
pub mod error;
pub mod selection;
pub mod storage;

pub use document::{Change, Document, Snapshot};
pub use error::{Result, SheetdocError};
pub use selection::{Area, Group, simplify};
pub use storage::front_matter::FrontMatter;

pub use sheetdoc_engine::engine::{CellRef, EvalError};
