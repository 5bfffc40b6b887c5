//! Rush Hour solver library
//!
//! Models a sliding-vehicle puzzle on a square grid and provides several
//! interchangeable search strategies that move the target vehicle to the
//! right edge of its row.

pub mod annealing;
pub mod astar;
pub mod bfs;
pub mod consistency;
pub mod constrained;
pub mod grid;
pub mod heuristics;
pub mod moves;
pub mod puzzle_file;
pub mod solver;
pub mod vehicles;

use std::sync::atomic::{AtomicBool, Ordering};

pub use grid::{Board, BoardError, Move, MoveError};
pub use vehicles::{Axis, VehicleSpec};

/// A search strategy that can be picked at runtime.
///
/// Method parameters live in the implementing type, so callers hold any
/// solver as `dyn Solver` and only hand over the board and an optional cancel
/// flag. `Send + Sync` lets a solver run on a worker thread.
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns a move sequence reaching the goal, or `None` when the method
    /// finds none. An empty sequence means the board is already solved.
    ///
    /// Raising `cancel` makes the search return `None` at its next check.
    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>>;
}

#[inline]
pub(crate) fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}
