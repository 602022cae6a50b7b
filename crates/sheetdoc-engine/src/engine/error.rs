//! Error types for formula evaluation.

use thiserror::Error;

/// A per-cell evaluation failure.
///
/// These are values rather than faults: one broken formula never prevents
/// the rest of the sheet from computing, and results (including failures)
/// are memoized per cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("formula error: {0}")]
    Formula(String),

    #[error("circular reference involving {0}")]
    CircularReference(String),
}
