//! The alignment lattice: a dense (|source|+1) × (|target|+1) grid filled by
//! a single forward Viterbi-style sweep.
//!
//! Every cell `(x, y)` means "the first `x` source tokens and the first `y`
//! target tokens have been consumed". Three edges leave each cell:
//!
//! | edge         | to           | cost                          |
//! |--------------|--------------|-------------------------------|
//! | insertion    | `(x, y+1)`   | `cost(ε, target[y])`          |
//! | deletion     | `(x+1, y)`   | `cost(source[x], ε)`          |
//! | substitution | `(x+1, y+1)` | `cost(source[x], target[y])`  |
//!
//! Every edge strictly increases `x + y`, so a row-major sweep finalizes a
//! cell before any of its successors is relaxed.
//!
//! ## Tie-breaking
//! The scorer weights early edits more heavily than late ones, which an exact
//! search could only honour with floating-point relaxation. The sweep stays
//! integer-only instead: when a candidate ties the best known cost of a cell,
//! it wins only if its predecessor's own cumulative cost is strictly lower
//! than that of the predecessor already recorded. On large corpora this picks
//! a path that is not optimal under positional weighting for roughly one pair
//! in ten thousand, and makes scoring asymmetric: aligning `(a, b)` can score
//! differently from `(b, a)`. [`AlignmentStrategy::ExactBidirectional`]
//! runs both directions for callers that need the minimum.
//!
//! [`AlignmentStrategy::ExactBidirectional`]: crate::scorer::AlignmentStrategy::ExactBidirectional

use crate::error::ScoreError;
use crate::token::{Edit, Sequence, Token};
use crate::traits::EditCostModel;

/// Cumulative cost of a cell nothing has reached yet.
pub const UNREACHED: u64 = u64::MAX;

/// Grid coordinate `(x, y)`: tokens consumed from source and target.
pub type Coord = (usize, usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    cost: u64,
    prev: Option<Coord>,
}

impl Cell {
    const START: Cell = Cell {
        cost: UNREACHED,
        prev: None,
    };
}

/// Alignment lattice for one `(source, target)` pair.
///
/// Construct once per pair, [`fill`](Self::fill) once per cost-model
/// snapshot, and [`reset`](Self::reset) before re-filling against an updated
/// model. Not safe to share between threads while filling; distinct lattices
/// are fully independent.
#[derive(Clone, Debug)]
pub struct AlignmentLattice {
    source: Sequence,
    target: Sequence,
    /// Row-major: cell `(x, y)` lives at `x * (target.len() + 1) + y`.
    cells: Vec<Cell>,
    filled: bool,
}

impl AlignmentLattice {
    pub fn new(source: Sequence, target: Sequence) -> Self {
        let len = (source.len() + 1) * (target.len() + 1);
        let mut lattice = Self {
            source,
            target,
            cells: vec![Cell::START; len],
            filled: false,
        };
        lattice.reset();
        lattice
    }

    /// Return every cell to its construction-time state without reallocating.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::START);
        self.cells[0].cost = 0;
        self.filled = false;
    }

    pub fn source(&self) -> &[Token] {
        &self.source
    }

    pub fn target(&self) -> &[Token] {
        &self.target
    }

    /// Whether [`fill`](Self::fill) has run since construction or the last reset.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    #[inline]
    fn width(&self) -> usize {
        self.target.len() + 1
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x <= self.source.len() && y < self.width());
        x * self.width() + y
    }

    #[inline]
    fn terminal(&self) -> Coord {
        (self.source.len(), self.target.len())
    }

    /// Best cumulative cost known at `(x, y)`, `None` if unreached.
    ///
    /// # Panics
    /// Panics if `(x, y)` lies outside the grid.
    pub fn cost_at(&self, x: usize, y: usize) -> Option<u64> {
        assert!(
            x <= self.source.len() && y <= self.target.len(),
            "cell ({x}, {y}) outside {}x{} lattice",
            self.source.len() + 1,
            self.target.len() + 1
        );
        match self.cells[self.idx(x, y)].cost {
            UNREACHED => None,
            c => Some(c),
        }
    }

    /// Back-pointer recorded at `(x, y)`; `None` for the origin or unreached cells.
    ///
    /// # Panics
    /// Panics if `(x, y)` lies outside the grid.
    pub fn predecessor(&self, x: usize, y: usize) -> Option<Coord> {
        assert!(
            x <= self.source.len() && y <= self.target.len(),
            "cell ({x}, {y}) outside lattice"
        );
        self.cells[self.idx(x, y)].prev
    }

    /// Minimum total edit cost from `(0,0)` to `(|source|, |target|)`.
    pub fn terminal_cost(&self) -> Option<u64> {
        if !self.filled {
            return None;
        }
        let (x, y) = self.terminal();
        self.cost_at(x, y)
    }

    /// Relax the edge `from -> to` whose cost is `edge_cost`.
    #[inline]
    fn relax(&mut self, from: Coord, to: Coord, edge_cost: u32) {
        let from_cost = self.cells[self.idx(from.0, from.1)].cost;
        let new_cost = from_cost + u64::from(edge_cost);
        let to_idx = self.idx(to.0, to.1);
        let cell = self.cells[to_idx];

        let wins = if new_cost < cell.cost {
            true
        } else if new_cost == cell.cost {
            // Equal totals: prefer the predecessor that got here more cheaply.
            match cell.prev {
                Some((px, py)) => from_cost < self.cells[self.idx(px, py)].cost,
                None => false,
            }
        } else {
            false
        };

        if wins {
            self.cells[to_idx] = Cell {
                cost: new_cost,
                prev: Some(from),
            };
        }
    }

    /// Run the forward sweep against `model` and return a view bound to it.
    ///
    /// Costs must be non-negative (guaranteed by `u32`). Filling an already
    /// filled lattice without [`reset`](Self::reset) only re-relaxes edges
    /// and cannot lower any cost below the first fill against the same model.
    pub fn fill<'m, M: EditCostModel + ?Sized>(
        &mut self,
        model: &'m M,
    ) -> FilledLattice<'_, 'm, M> {
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!(
            "lattice_fill",
            source_len = self.source.len(),
            target_len = self.target.len()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let n = self.source.len();
        let m = self.target.len();
        for x in 0..=n {
            for y in 0..=m {
                if self.cells[self.idx(x, y)].cost == UNREACHED {
                    continue;
                }
                if y < m {
                    let c = model.cost(Edit::insertion(self.target[y]));
                    self.relax((x, y), (x, y + 1), c);
                }
                if x < n {
                    let c = model.cost(Edit::deletion(self.source[x]));
                    self.relax((x, y), (x + 1, y), c);
                }
                if x < n && y < m {
                    let c = model.cost(Edit::new(self.source[x], self.target[y]));
                    self.relax((x, y), (x + 1, y + 1), c);
                }
            }
        }
        self.filled = true;

        #[cfg(feature = "tracing")]
        tracing::trace!(terminal_cost = ?self.terminal_cost(), "lattice filled");

        FilledLattice {
            lattice: self,
            model,
        }
    }

    /// Re-bind a filled lattice to the model it was filled with.
    ///
    /// The caller vouches that `model` is the snapshot used by the last
    /// [`fill`](Self::fill); only the filled state itself is checked.
    pub fn filled_with<'l, 'm, M: EditCostModel + ?Sized>(
        &'l self,
        model: &'m M,
    ) -> Result<FilledLattice<'l, 'm, M>, ScoreError> {
        if !self.filled {
            return Err(ScoreError::NotFilled);
        }
        Ok(FilledLattice {
            lattice: self,
            model,
        })
    }

    /// Back-pointer chain from the terminal cell to the origin as `(from, to)` steps.
    pub(crate) fn steps_backward(&self) -> BackSteps<'_> {
        BackSteps {
            lattice: self,
            at: self.terminal(),
        }
    }

    /// Edit taken by one step of the path.
    #[inline]
    pub(crate) fn step_edit(&self, from: Coord, to: Coord) -> Edit {
        let a = if from.0 == to.0 {
            Token::EMPTY
        } else {
            self.source[from.0]
        };
        let b = if from.1 == to.1 {
            Token::EMPTY
        } else {
            self.target[from.1]
        };
        Edit::new(a, b)
    }

    /// The chosen path as cell coordinates from `(0,0)` to the terminal cell.
    pub fn best_path(&self) -> Result<Vec<Coord>, ScoreError> {
        if !self.filled {
            return Err(ScoreError::NotFilled);
        }
        Ok(self.path_coords())
    }

    fn path_coords(&self) -> Vec<Coord> {
        let mut path: Vec<Coord> = Vec::with_capacity(self.source.len() + self.target.len() + 1);
        path.push(self.terminal());
        path.extend(self.steps_backward().map(|(from, _)| from));
        path.reverse();
        path
    }

    /// The chosen path as edits, in forward order (start of the names first).
    pub fn best_edits(&self) -> Result<Vec<Edit>, ScoreError> {
        if !self.filled {
            return Err(ScoreError::NotFilled);
        }
        Ok(self.forward_edits())
    }

    pub(crate) fn forward_edits(&self) -> Vec<Edit> {
        let mut edits: Vec<Edit> = self
            .steps_backward()
            .map(|(from, to)| self.step_edit(from, to))
            .collect();
        edits.reverse();
        edits
    }
}

/// Iterator over back-pointer steps, terminal first.
pub(crate) struct BackSteps<'a> {
    lattice: &'a AlignmentLattice,
    at: Coord,
}

impl Iterator for BackSteps<'_> {
    type Item = (Coord, Coord);

    fn next(&mut self) -> Option<Self::Item> {
        if self.at == (0, 0) {
            return None;
        }
        let to = self.at;
        let from = self
            .lattice
            .predecessor(to.0, to.1)
            .expect("filled lattice has a back-pointer on every reached cell");
        debug_assert!(from.0 + from.1 < to.0 + to.1);
        self.at = from;
        Some((from, to))
    }
}

/// A filled lattice bound to the cost model that filled it.
///
/// Returned by [`AlignmentLattice::fill`]; scoring and count feedback go
/// through this view so they always see the same model snapshot that chose
/// the path.
pub struct FilledLattice<'l, 'm, M: EditCostModel + ?Sized> {
    pub(crate) lattice: &'l AlignmentLattice,
    pub(crate) model: &'m M,
}

impl<'l, 'm, M: EditCostModel + ?Sized> FilledLattice<'l, 'm, M> {
    pub fn lattice(&self) -> &'l AlignmentLattice {
        self.lattice
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    pub fn terminal_cost(&self) -> u64 {
        let (x, y) = self.lattice.terminal();
        self.lattice
            .cost_at(x, y)
            .expect("terminal cell is always reachable")
    }

    pub fn best_path(&self) -> Vec<Coord> {
        self.lattice.path_coords()
    }

    pub fn best_edits(&self) -> Vec<Edit> {
        self.lattice.forward_edits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DefaultCosts, EditTable};
    use crate::token::tokens_from_bytes;

    fn demo_model() -> EditTable {
        EditTable::new(DefaultCosts {
            self_match: 0,
            substitution: 2,
            insertion: 3,
            deletion: 3,
        })
    }

    #[test]
    fn new_lattice_starts_at_origin() {
        let lattice = AlignmentLattice::new(tokens_from_bytes(b"ab"), tokens_from_bytes(b"abc"));
        assert_eq!(lattice.cost_at(0, 0), Some(0));
        assert_eq!(lattice.cost_at(2, 3), None);
        assert_eq!(lattice.predecessor(0, 0), None);
        assert!(!lattice.is_filled());
        assert_eq!(lattice.terminal_cost(), None);
        assert_eq!(lattice.cells.len(), 3 * 4);
    }

    #[test]
    fn reset_keeps_allocation() {
        let model = demo_model();
        let mut lattice =
            AlignmentLattice::new(tokens_from_bytes(b"ace"), tokens_from_bytes(b"ape"));
        lattice.fill(&model);
        let ptr = lattice.cells.as_ptr();
        lattice.reset();
        assert_eq!(lattice.cells.as_ptr(), ptr);
        assert!(!lattice.is_filled());
        assert_eq!(lattice.cost_at(3, 3), None);
        assert_eq!(lattice.cost_at(0, 0), Some(0));
    }

    #[test]
    fn substitution_in_the_middle() {
        let model = demo_model();
        let mut lattice =
            AlignmentLattice::new(tokens_from_bytes(b"ace"), tokens_from_bytes(b"ape"));
        let filled = lattice.fill(&model);
        assert_eq!(filled.terminal_cost(), 2);
        assert_eq!(filled.best_path(), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn back_pointers_strictly_decrease_diagonal_index() {
        let model = demo_model();
        let mut lattice =
            AlignmentLattice::new(tokens_from_bytes(b"johnson"), tokens_from_bytes(b"jonsen"));
        lattice.fill(&model);
        for x in 0..=7 {
            for y in 0..=6 {
                if let Some((px, py)) = lattice.predecessor(x, y) {
                    assert!(px + py < x + y);
                    assert!(x - px <= 1 && y - py <= 1);
                }
            }
        }
    }

    #[test]
    fn empty_pair_has_empty_path() {
        let model = demo_model();
        let mut lattice = AlignmentLattice::new(Vec::new(), Vec::new());
        let filled = lattice.fill(&model);
        assert_eq!(filled.terminal_cost(), 0);
        assert_eq!(filled.best_path(), vec![(0, 0)]);
        assert!(filled.best_edits().is_empty());
    }

    #[test]
    fn unfilled_lattice_refuses_paths() {
        let lattice = AlignmentLattice::new(tokens_from_bytes(b"a"), tokens_from_bytes(b"b"));
        assert_eq!(lattice.best_path(), Err(ScoreError::NotFilled));
        assert_eq!(lattice.best_edits().err(), Some(ScoreError::NotFilled));
        let model = demo_model();
        assert!(lattice.filled_with(&model).is_err());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn cost_at_out_of_range_panics() {
        let lattice = AlignmentLattice::new(tokens_from_bytes(b"a"), tokens_from_bytes(b"b"));
        lattice.cost_at(2, 0);
    }
}
