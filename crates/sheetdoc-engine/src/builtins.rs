//! Reference resolution and helper functions registered on the Rhai engine.
//!
//! Three reference forms reach the engine:
//! - `col("Name")` calls, produced by preprocessing `:Name` tokens, resolve
//!   against the current row;
//! - labels and `A1`-style absolute addresses resolve through the variable
//!   resolver;
//! - `num()` coerces referenced values explicitly.
//!
//! Every resolution records a dependency edge before reading, so the
//! reverse-dependency map stays current even when the read fails.

use rhai::{Dynamic, Engine, EvalAltResult, NativeCallContext, Position};
use std::sync::Arc;

use crate::engine::{CYCLE_MARKER, CellRef, EvalError, SheetState, computed_value};

pub(crate) fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        message.into().into(),
        Position::NONE,
    ))
}

/// Register reference resolution and `num()` on an engine bound to `sheet`.
pub fn register_builtins(engine: &mut Engine, sheet: Arc<SheetState>) {
    // num(): JS Number() semantics. Strings parse or go NaN; unit (the
    // value of a missing or blank cell) is zero.
    engine.register_fn("num", |input: &str| -> f64 {
        input.trim().parse().unwrap_or(f64::NAN)
    });
    engine.register_fn("num", |n: f64| n);
    engine.register_fn("num", |n: i64| n as f64);
    engine.register_fn("num", |_: ()| 0.0_f64);

    let st = sheet.clone();
    engine.register_fn(
        "col",
        move |ctx: NativeCallContext, name: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let Some(current) = st.current_cell() else {
                return Err(runtime_error(format!(
                    "column reference :{name} used outside a cell"
                )));
            };
            let col = {
                let props = st.props.lock().unwrap();
                props.column_titles.iter().position(|title| title == name)
            };
            match col {
                Some(col) => resolve_reference(&st, ctx.engine(), CellRef::new(current.row, col)),
                // Unknown column titles read as blank.
                None => Ok(Dynamic::UNIT),
            }
        },
    );

    let st = sheet;
    engine.on_var(move |name, _index, context| {
        let target = {
            let props = st.props.lock().unwrap();
            match props.labels.get(name) {
                Some(address) => CellRef::parse(address),
                None => CellRef::parse(name),
            }
        };
        match target {
            Some(cell) => resolve_reference(&st, context.engine(), cell).map(Some),
            // Not a label or an address: fall through to normal lookup so
            // script-local variables keep working.
            None => Ok(None),
        }
    });
}

/// Resolve a referenced cell to a Rhai value, recording the dependency edge
/// first. Missing cells read as unit; nested failures become runtime errors
/// so they propagate through the enclosing evaluation.
fn resolve_reference(
    sheet: &Arc<SheetState>,
    engine: &Engine,
    target: CellRef,
) -> Result<Dynamic, Box<EvalAltResult>> {
    sheet.record_dependency(target);
    if !sheet.grid.contains_key(&target) {
        return Ok(Dynamic::UNIT);
    }
    match computed_value(sheet, engine, target) {
        Ok(text) => Ok(coerce_value(&text)),
        Err(EvalError::CircularReference(address)) => {
            Err(runtime_error(format!("{CYCLE_MARKER} {address}")))
        }
        Err(EvalError::Formula(message)) => Err(runtime_error(message)),
    }
}

/// Numeric-looking referenced text participates in arithmetic as a float.
/// The leading-zero guard keeps values like "007" or "0123" textual.
fn coerce_value(text: &str) -> Dynamic {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Dynamic::UNIT;
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.len() > 1 && digits.starts_with('0') && digits.as_bytes()[1].is_ascii_digit() {
        return Dynamic::from(text.to_string());
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Dynamic::from_float(n);
    }
    Dynamic::from(text.to_string())
}
