//! Distance estimates and move ordering shared by the solvers.

use crate::grid::{Board, Move};
use crate::moves::neighbors;
use crate::vehicles::{cell_bit, CellMask};

/// Column the target vehicle's head must reach for the goal predicate to hold.
pub fn goal_column(board: &Board) -> i32 {
    let layout = board.layout();
    layout.size() - layout.vehicle(layout.target()).length
}

/// Remaining horizontal distance of the target vehicle to `goal_column`.
///
/// Admissible: every slide changes the target column by at most one.
pub fn goal_distance(board: &Board, goal_column: &i32) -> u32 {
    (goal_column - board.target_head().1).max(0) as u32
}

/// Cells of the target row strictly ahead of the target vehicle.
fn lane_ahead(board: &Board) -> CellMask {
    let layout = board.layout();
    let size = layout.size();
    let (row, col) = board.target_head();
    let tail = col + layout.vehicle(layout.target()).length;
    (tail..size).fold(0, |mask, col| mask | cell_bit(row, col, size))
}

/// Number of vehicles occupying any cell between the target and the far edge.
pub fn blocking_count(board: &Board) -> u32 {
    let lane = lane_ahead(board);
    let target = board.layout().target();
    (0..board.heads().len())
        .filter(|&vehicle| vehicle != target && board.vehicle_mask(vehicle) & lane != 0)
        .count() as u32
}

/// Local-search cost: blockers plus remaining distance. Zero exactly at a goal.
pub fn annealing_cost(board: &Board) -> u32 {
    blocking_count(board) + goal_distance(board, &goal_column(board))
}

/// Successors sorted for depth-first expansion.
///
/// Moving the target forward comes first, then moves leaving the cheapest
/// board. The sort is stable, so ties keep generator order.
pub fn ordered_neighbors(board: &Board) -> Vec<(Board, Move)> {
    let target = board.layout().target();
    let mut successors = neighbors(board);
    successors.sort_by_cached_key(|(next, mv)| {
        let target_forward = mv.vehicle == target && mv.delta == 1;
        (!target_forward, annealing_cost(next))
    });
    successors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::VehicleSpec;

    fn blocked_board() -> Board {
        Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 1).target(),
                VehicleSpec::vertical("v1", 3, 0, 3),
                VehicleSpec::vertical("v2", 2, 2, 5),
                VehicleSpec::vertical("v3", 2, 3, 0),
                VehicleSpec::horizontal("h1", 2, 4, 3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_goal_column_uses_grid_size_and_length() {
        let board = blocked_board();
        assert_eq!(goal_column(&board), 4);
        assert_eq!(goal_distance(&board, &4), 3);
        assert_eq!(goal_distance(&board, &0), 0);
    }

    #[test]
    fn test_blocking_count_only_counts_lane_ahead() {
        let board = blocked_board();
        assert_eq!(blocking_count(&board), 2);
        assert_eq!(annealing_cost(&board), 5);
    }

    #[test]
    fn test_cost_is_zero_at_goal() {
        let board = Board::new(6, [VehicleSpec::horizontal("sh", 3, 2, 3).target()]).unwrap();
        assert!(board.is_goal());
        assert_eq!(annealing_cost(&board), 0);
    }

    #[test]
    fn test_ordered_neighbors_prefers_target_forward() {
        let board = Board::new(
            6,
            [
                VehicleSpec::vertical("v1", 2, 0, 0),
                VehicleSpec::horizontal("sh", 2, 2, 1).target(),
            ],
        )
        .unwrap();
        let first = ordered_neighbors(&board)[0].1;
        assert_eq!(first, Move::new(1, 1));
        let last = ordered_neighbors(&board).last().unwrap().1;
        assert_eq!(last, Move::new(1, -1));
    }
}
