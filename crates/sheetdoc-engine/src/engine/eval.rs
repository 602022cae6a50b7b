//! Rhai engine creation and formula evaluation.
//!
//! Dependencies are discovered while a formula runs, so cycles cannot be
//! checked ahead of time; instead an evaluation stack rejects re-entry into
//! a cell that is already being computed. Nested cycle errors cross the
//! Rhai boundary as tagged runtime errors and are classified back into
//! [`EvalError::CircularReference`] by the frame that observes them.

use rhai::{Dynamic, Engine};
use std::sync::Arc;

use super::cell::Memo;
use super::cell_ref::CellRef;
use super::error::EvalError;
use super::format::format_dynamic;
use super::preprocess::preprocess_formula;
use super::sheet::SheetState;

/// Marker embedded in runtime errors so nested circular-reference failures
/// survive the trip through Rhai's error type.
pub(crate) const CYCLE_MARKER: &str = "#CYCLE!";

/// Create a Rhai engine wired to the shared sheet state.
pub fn create_engine(sheet: Arc<SheetState>) -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine, sheet);
    engine
}

/// Compute the display value of a cell.
///
/// Non-formula cells yield their raw text. Formula cells are preprocessed,
/// evaluated through Rhai and formatted, with the outcome (success or
/// failure) memoized against a snapshot of the raw text.
pub fn computed_value(
    sheet: &Arc<SheetState>,
    engine: &Engine,
    cell: CellRef,
) -> Result<String, EvalError> {
    let (raw, body) = {
        let Some(entry) = sheet.grid.get(&cell) else {
            return Ok(String::new());
        };
        if let Some(memo) = &entry.memo
            && memo.source == entry.raw
        {
            return memo.result.clone();
        }
        // Clone and release the guard; nothing may be held across eval.
        (entry.raw.clone(), entry.formula_body().map(str::to_string))
    };

    let Some(body) = body else {
        return Ok(raw);
    };

    if sheet.eval_stack_contains(cell) {
        return Err(EvalError::CircularReference(cell.to_string()));
    }

    sheet.eval_push(cell);
    let script = preprocess_formula(&body);
    let evaluated = engine.eval::<Dynamic>(&script);
    sheet.eval_pop();

    let result = match evaluated {
        Ok(value) => Ok(format_dynamic(&value)),
        Err(err) => Err(classify_error(cell, &err.to_string())),
    };

    if let Some(mut entry) = sheet.grid.get_mut(&cell) {
        entry.memo = Some(Memo {
            source: raw,
            result: result.clone(),
        });
    }

    result
}

fn classify_error(cell: CellRef, message: &str) -> EvalError {
    if message.contains(CYCLE_MARKER) {
        EvalError::CircularReference(cell.to_string())
    } else {
        EvalError::Formula(message.to_string())
    }
}
