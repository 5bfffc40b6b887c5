//! Move generation.
//!
//! Every movable vehicle tries a slide of -1 and then +1 along its own axis.
//! Illegal slides are skipped silently. The output order (vehicles in layout
//! order, then -1 before +1) decides depth-first tie-breaking, so it must not
//! change.

use crate::grid::{Board, Move};
use crate::vehicles::DELTAS;

/// All legal single-vehicle unit slides and the boards they produce.
///
/// The input board is left untouched; each successor is a fresh board with
/// exactly one head changed.
pub fn neighbors(board: &Board) -> Vec<(Board, Move)> {
    let occupied = board.occupied();
    let mut successors = Vec::new();

    for vehicle in 0..board.heads().len() {
        for delta in DELTAS {
            if let Some(head) = board.slide_head(occupied, vehicle, delta) {
                successors.push((board.with_head(vehicle, head), Move::new(vehicle, delta)));
            }
        }
    }

    successors
}

/// The legal moves of a board, without building the successor boards.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let occupied = board.occupied();
    (0..board.heads().len())
        .flat_map(|vehicle| DELTAS.map(|delta| Move::new(vehicle, delta)))
        .filter(|mv| board.slide_head(occupied, mv.vehicle, mv.delta).is_some())
        .collect()
}

/// Attempts one slide, returning `None` when it is illegal.
pub fn try_slide(board: &Board, mv: Move) -> Option<Board> {
    board
        .slide_head(board.occupied(), mv.vehicle, mv.delta)
        .map(|head| board.with_head(mv.vehicle, head))
}
