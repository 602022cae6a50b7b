//! Error types for sheetdoc core.

use thiserror::Error;

use sheetdoc_engine::EvalError;

/// Errors surfaced by the document model.
#[derive(Error, Debug)]
pub enum SheetdocError {
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type Result<T> = std::result::Result<T, SheetdocError>;
