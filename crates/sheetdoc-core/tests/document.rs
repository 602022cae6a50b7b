//! End-to-end document behavior: loading, formulas, history, structure.

use sheetdoc_core::{CellRef, Document, EvalError};

#[test]
fn test_tabular_document_end_to_end() {
    let mut doc = Document::new();
    doc.set_source("Name;Age\nAlice;30\nBob;25", true).unwrap();

    assert_eq!(doc.column_titles(), vec!["Name", "Age"]);
    assert_eq!(doc.get_raw(CellRef::new(0, 0)), "Alice");

    // Insert a row after the first and fill it in.
    doc.insert_row(Some(0));
    doc.set_raw(CellRef::new(1, 0), "Carol");
    doc.set_raw(CellRef::new(1, 1), "41");

    assert_eq!(doc.get_raw(CellRef::new(2, 0)), "Bob");
    assert_eq!(
        doc.source(),
        "Name;Age\nAlice;30\nCarol;41\nBob;25"
    );
}

#[test]
fn test_formula_recomputes_through_dependency_chain() {
    let mut doc = Document::new();
    let a0 = CellRef::new(0, 0);
    let b0 = CellRef::new(0, 1);
    let c0 = CellRef::new(0, 2);

    doc.set_raw(a0, "5");
    doc.set_raw(b0, "=A0 + 2");
    doc.set_raw(c0, "=B0 * 10");

    assert_eq!(doc.computed(c0), Ok("70".to_string()));

    doc.set_raw(a0, "8");
    assert_eq!(doc.computed(b0), Ok("10".to_string()));
    assert_eq!(doc.computed(c0), Ok("100".to_string()));
}

#[test]
fn test_column_references_per_row() {
    let mut doc = Document::new();
    doc.set_source(
        "Price;Qty;Total\n3;4;=:Price * :Qty\n10;10;=:Price * :Qty",
        true,
    )
    .unwrap();

    assert_eq!(doc.computed(CellRef::new(0, 2)), Ok("12".to_string()));
    assert_eq!(doc.computed(CellRef::new(1, 2)), Ok("100".to_string()));
}

#[test]
fn test_cycle_is_reported_not_hung() {
    let mut doc = Document::new();
    doc.set_raw(CellRef::new(0, 0), "=B0");
    doc.set_raw(CellRef::new(0, 1), "=C0");
    doc.set_raw(CellRef::new(0, 2), "=A0");

    for col in 0..3 {
        assert!(matches!(
            doc.computed(CellRef::new(0, col)),
            Err(EvalError::CircularReference(_))
        ));
    }

    // Breaking the cycle restores normal evaluation.
    doc.set_raw(CellRef::new(0, 2), "7");
    assert_eq!(doc.computed(CellRef::new(0, 0)), Ok("7".to_string()));
}

#[test]
fn test_watchers_fire_on_edit() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut doc = Document::new();
    let a0 = CellRef::new(0, 0);
    let count = Arc::new(AtomicUsize::new(0));
    let hits = count.clone();
    doc.sheet().on_change(a0, move |_| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    doc.set_raw(a0, "1");
    doc.set_raw(a0, "1"); // unchanged, no event
    doc.set_raw(a0, "2");
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_burst_of_edits_undoes_as_one_frame() {
    let mut doc = Document::new();
    let a0 = CellRef::new(0, 0);

    doc.set_raw(a0, "h");
    doc.set_raw(a0, "he");
    doc.set_raw(a0, "hey");
    assert_eq!(doc.undo_depth(), 1);

    assert!(doc.undo());
    assert_eq!(doc.get_raw(a0), "");
    assert!(doc.redo());
    assert_eq!(doc.get_raw(a0), "hey");
}

#[test]
fn test_undo_redo_depth_invariance() {
    let mut doc = Document::new();
    doc.set_raw(CellRef::new(0, 0), "a");
    doc.set_raw(CellRef::new(5, 5), "b");

    let depth = doc.undo_depth();
    let snapshot_a = doc.get_raw(CellRef::new(0, 0));
    let snapshot_b = doc.get_raw(CellRef::new(5, 5));

    while doc.undo() {}
    while doc.redo() {}

    assert_eq!(doc.undo_depth(), depth);
    assert_eq!(doc.get_raw(CellRef::new(0, 0)), snapshot_a);
    assert_eq!(doc.get_raw(CellRef::new(5, 5)), snapshot_b);
}

#[test]
fn test_fresh_edit_discards_redo() {
    let mut doc = Document::new();
    let a0 = CellRef::new(0, 0);
    doc.set_raw(a0, "one");
    doc.undo();
    assert_eq!(doc.redo_depth(), 1);

    doc.set_raw(a0, "two");
    assert_eq!(doc.redo_depth(), 0);
    assert!(!doc.redo());
}

#[test]
fn test_label_round_trip_through_source() {
    let mut doc = Document::new();
    doc.set_source("Value\n21\n=total * 2", true).unwrap();
    doc.set_label("total", CellRef::new(0, 0));

    assert_eq!(doc.computed(CellRef::new(1, 0)), Ok("42".to_string()));

    let saved = doc.source();
    let mut reloaded = Document::new();
    reloaded.set_source(&saved, true).unwrap();
    assert_eq!(reloaded.computed(CellRef::new(1, 0)), Ok("42".to_string()));
}

#[test]
fn test_address_display_round_trip() {
    assert_eq!(CellRef::new(4, 0).to_string(), "A4");
    assert_eq!(CellRef::new(0, 26).to_string(), "AA0");
    assert_eq!(CellRef::parse("A4"), Some(CellRef::new(4, 0)));
    assert_eq!(CellRef::parse("AA0"), Some(CellRef::new(0, 26)));
}
