//! Selection groups and their algebra.
//!
//! A selection is a list of groups: single cells, rectangular ranges, and
//! whole columns/rows (single or spans). Collision and containment are
//! computed over per-axis extents, where a whole column simply has an
//! unbounded row extent; this keeps the predicates total and symmetric
//! across all variant pairings.

use serde::{Deserialize, Serialize};

use sheetdoc_engine::CellRef;

/// A contiguous selected region.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Group {
    Cell(CellRef),
    Range { from: CellRef, to: CellRef },
    Column(usize),
    Row(usize),
    ColumnRange { from: usize, to: usize },
    RowRange { from: usize, to: usize },
}

/// Cell count of a group; whole columns and rows are unbounded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Area {
    Finite(u64),
    Unbounded,
}

/// Extent of a group along one axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Span {
    Bounded(usize, usize),
    Full,
}

impl Span {
    fn overlaps(self, other: Span) -> bool {
        match (self, other) {
            (Span::Full, _) | (_, Span::Full) => true,
            (Span::Bounded(a0, a1), Span::Bounded(b0, b1)) => a0 <= b1 && b0 <= a1,
        }
    }

    fn contains(self, other: Span) -> bool {
        match (self, other) {
            (Span::Full, _) => true,
            (Span::Bounded(..), Span::Full) => false,
            (Span::Bounded(a0, a1), Span::Bounded(b0, b1)) => a0 <= b0 && b1 <= a1,
        }
    }

    fn len(self) -> Option<u64> {
        match self {
            Span::Bounded(a0, a1) => Some((a1 - a0 + 1) as u64),
            Span::Full => None,
        }
    }
}

impl Group {
    /// Canonical form: corners ordered, degenerate vector spans collapsed.
    pub fn normalize(self) -> Group {
        match self {
            Group::Cell(_) | Group::Column(_) | Group::Row(_) => self,
            Group::Range { from, to } => Group::Range {
                from: CellRef::new(from.row.min(to.row), from.col.min(to.col)),
                to: CellRef::new(from.row.max(to.row), from.col.max(to.col)),
            },
            Group::ColumnRange { from, to } if from == to => Group::Column(from),
            Group::ColumnRange { from, to } => Group::ColumnRange {
                from: from.min(to),
                to: from.max(to),
            },
            Group::RowRange { from, to } if from == to => Group::Row(from),
            Group::RowRange { from, to } => Group::RowRange {
                from: from.min(to),
                to: from.max(to),
            },
        }
    }

    /// (column extent, row extent), computed on the normalized form.
    fn spans(self) -> (Span, Span) {
        match self.normalize() {
            Group::Cell(cell) => (
                Span::Bounded(cell.col, cell.col),
                Span::Bounded(cell.row, cell.row),
            ),
            Group::Range { from, to } => (
                Span::Bounded(from.col, to.col),
                Span::Bounded(from.row, to.row),
            ),
            Group::Column(col) => (Span::Bounded(col, col), Span::Full),
            Group::ColumnRange { from, to } => (Span::Bounded(from, to), Span::Full),
            Group::Row(row) => (Span::Full, Span::Bounded(row, row)),
            Group::RowRange { from, to } => (Span::Full, Span::Bounded(from, to)),
        }
    }

    pub fn area(self) -> Area {
        let (cols, rows) = self.spans();
        match (cols.len(), rows.len()) {
            (Some(width), Some(height)) => Area::Finite(width * height),
            _ => Area::Unbounded,
        }
    }

    /// Equality up to normalization; a 1x1 range equals its cell.
    pub fn equals(self, other: Group) -> bool {
        self.spans() == other.spans()
    }

    /// Whether every cell of `other` lies in `self`.
    pub fn contains(self, other: Group) -> bool {
        let (a_cols, a_rows) = self.spans();
        let (b_cols, b_rows) = other.spans();
        a_cols.contains(b_cols) && a_rows.contains(b_rows)
    }

    /// Whether two groups share at least one cell.
    pub fn collides(self, other: Group) -> bool {
        let (a_cols, a_rows) = self.spans();
        let (b_cols, b_rows) = other.spans();
        a_cols.overlaps(b_cols) && a_rows.overlaps(b_rows)
    }

    /// Cells within Chebyshev distance 1. Only defined between single
    /// cells; everything else is never adjacent.
    pub fn adjacent(self, other: Group) -> bool {
        match (self, other) {
            (Group::Cell(a), Group::Cell(b)) => {
                a.row.abs_diff(b.row) <= 1 && a.col.abs_diff(b.col) <= 1
            }
            _ => false,
        }
    }

    fn corners(self) -> Option<(CellRef, CellRef)> {
        match self.normalize() {
            Group::Cell(cell) => Some((cell, cell)),
            Group::Range { from, to } => Some((from, to)),
            _ => None,
        }
    }

    fn col_bounds(self) -> Option<(usize, usize)> {
        match self.normalize() {
            Group::Column(col) => Some((col, col)),
            Group::ColumnRange { from, to } => Some((from, to)),
            _ => None,
        }
    }

    fn row_bounds(self) -> Option<(usize, usize)> {
        match self.normalize() {
            Group::Row(row) => Some((row, row)),
            Group::RowRange { from, to } => Some((from, to)),
            _ => None,
        }
    }

    /// Smallest single group covering both, when one is representable:
    /// cells and ranges make a range, same-axis vectors make a vector
    /// range; mixed pairings have no single covering group.
    pub fn bounding_union(self, other: Group) -> Option<Group> {
        if let (Some((a_from, a_to)), Some((b_from, b_to))) = (self.corners(), other.corners()) {
            return Some(Group::Range {
                from: CellRef::new(a_from.row.min(b_from.row), a_from.col.min(b_from.col)),
                to: CellRef::new(a_to.row.max(b_to.row), a_to.col.max(b_to.col)),
            });
        }
        if let (Some((a0, a1)), Some((b0, b1))) = (self.col_bounds(), other.col_bounds()) {
            return Some(
                Group::ColumnRange {
                    from: a0.min(b0),
                    to: a1.max(b1),
                }
                .normalize(),
            );
        }
        if let (Some((a0, a1)), Some((b0, b1))) = (self.row_bounds(), other.row_bounds()) {
            return Some(
                Group::RowRange {
                    from: a0.min(b0),
                    to: a1.max(b1),
                }
                .normalize(),
            );
        }
        None
    }

    /// All cells of a finite group, row-major. Unbounded groups yield
    /// nothing.
    pub fn cells(self) -> Vec<CellRef> {
        match self.normalize() {
            Group::Cell(cell) => vec![cell],
            Group::Range { from, to } => {
                let mut out = Vec::with_capacity((to.row - from.row + 1) * (to.col - from.col + 1));
                for row in from.row..=to.row {
                    for col in from.col..=to.col {
                        out.push(CellRef::new(row, col));
                    }
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

/// Reduce a selection to a minimal list: duplicates and contained groups
/// are dropped, and colliding or adjacent groups merge into their bounding
/// union where one is representable. Merging is a deliberate lossy
/// approximation: the union may cover cells neither input did. A merged
/// group rescans the accumulated list, so the output never overlaps within
/// a unionable family.
pub fn simplify(groups: impl IntoIterator<Item = Group>) -> Vec<Group> {
    let mut out: Vec<Group> = Vec::new();

    'next: for group in groups {
        let mut candidate = group.normalize();
        let mut i = 0;
        while i < out.len() {
            let existing = out[i];
            if existing.contains(candidate) {
                continue 'next;
            }
            if candidate.contains(existing) {
                out.remove(i);
                continue;
            }
            if candidate.collides(existing) || candidate.adjacent(existing) {
                if let Some(merged) = candidate.bounding_union(existing) {
                    out.remove(i);
                    candidate = merged;
                    // The merged group may now swallow earlier entries.
                    i = 0;
                    continue;
                }
            }
            i += 1;
        }
        out.push(candidate);
    }

    out
}
