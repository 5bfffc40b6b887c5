//! Exhaustive searches combined with constraint propagation.
//!
//! Every variant runs the arc-consistency filter once at the root and gives
//! up without expanding anything when it reports a dead end. The depth-first
//! variant additionally forward-checks each move against a per-branch copy of
//! the domains and prunes branches that fail.

use std::iter;
use std::sync::atomic::AtomicBool;

use log::debug;
use rustc_hash::FxHashSet;

use crate::bfs::bfs_with_cancel;
use crate::consistency::{ac3_filter, forward_check, Domains, Placement};
use crate::grid::{Board, Move, StateKey};
use crate::heuristics::ordered_neighbors;
use crate::is_cancelled;

/// Depth bound used by the iterative-deepening solvers unless overridden.
pub const DEFAULT_MAX_DEPTH: usize = 40;

/// One pending depth-first branch: a board, the moves leading to it, and the
/// domains owned by this branch alone.
type Branch = (Board, Vec<Move>, Domains);

/// Depth-first search with AC-3 at the root and forward checking per move.
///
/// Finds some solution, not necessarily a shortest one.
pub fn ac3_dfs(initial: &Board) -> Option<Vec<Move>> {
    ac3_dfs_with_cancel(initial, None)
}

/// `ac3_dfs` that checks `cancel` once per popped branch.
pub fn ac3_dfs_with_cancel(initial: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
    let Some(domains) = ac3_filter(initial) else {
        debug!("ac3-dfs: root is inconsistent");
        return None;
    };

    let mut stack: Vec<Branch> = vec![(initial.clone(), Vec::new(), domains)];
    let mut visited: FxHashSet<StateKey> = FxHashSet::default();
    let mut pruned = 0usize;

    while let Some((board, path, domains)) = stack.pop() {
        if is_cancelled(cancel) {
            debug!("ac3-dfs: cancelled after {} states", visited.len());
            return None;
        }
        if !visited.insert(board.key()) {
            continue;
        }
        if board.is_goal() {
            debug!(
                "ac3-dfs: goal after {} states, {pruned} branches pruned",
                visited.len()
            );
            return Some(path);
        }

        // pushed in reverse so the preferred move is popped first
        for (next, mv) in ordered_neighbors(&board).into_iter().rev() {
            let vehicle = board.layout().vehicle(mv.vehicle);
            let head = vehicle.shifted(board.head(mv.vehicle), mv.delta);

            let mut branch = domains.clone();
            branch.fix(
                mv.vehicle,
                Placement {
                    head,
                    mask: vehicle.occupancy(head, board.size()),
                },
            );
            if !forward_check(&mut branch, mv.vehicle, head, &next) {
                pruned += 1;
                continue;
            }

            let mut branch_path = path.clone();
            branch_path.push(mv);
            stack.push((next, branch_path, branch));
        }
    }

    debug!("ac3-dfs: exhausted {} states", visited.len());
    None
}

/// AC-3 at the root followed by plain breadth-first search.
pub fn ac3_bfs(initial: &Board) -> Option<Vec<Move>> {
    ac3_bfs_with_cancel(initial, None)
}

pub fn ac3_bfs_with_cancel(initial: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
    if ac3_filter(initial).is_none() {
        debug!("ac3-bfs: root is inconsistent");
        return None;
    }
    bfs_with_cancel(initial, cancel)
}

/// A node on the current depth-first path.
struct Frame {
    key: StateKey,
    arrived_by: Option<Move>,
    children: std::vec::IntoIter<(Board, Move)>,
}

/// Depth-first search bounded to `limit` moves.
///
/// A state is barred from appearing twice on the current path only: its key
/// leaves the visited set when the search backtracks past it, so memory stays
/// proportional to the depth.
fn depth_limited(initial: &Board, limit: usize, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
    if initial.is_goal() {
        return Some(Vec::new());
    }
    if limit == 0 {
        return None;
    }

    let mut on_path: FxHashSet<StateKey> = FxHashSet::default();
    let key = initial.key();
    on_path.insert(key.clone());
    let mut stack = vec![Frame {
        key,
        arrived_by: None,
        children: ordered_neighbors(initial).into_iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        if is_cancelled(cancel) {
            return None;
        }
        let Some((next, mv)) = frame.children.next() else {
            if let Some(done) = stack.pop() {
                on_path.remove(&done.key);
            }
            continue;
        };

        if next.is_goal() {
            let path: Vec<Move> = stack
                .iter()
                .filter_map(|frame| frame.arrived_by)
                .chain(iter::once(mv))
                .collect();
            return Some(path);
        }
        if stack.len() >= limit {
            continue;
        }

        let key = next.key();
        if !on_path.insert(key.clone()) {
            continue;
        }
        stack.push(Frame {
            key,
            arrived_by: Some(mv),
            children: ordered_neighbors(&next).into_iter(),
        });
    }

    None
}

/// Iterative-deepening depth-first search with depth limits `0..=max_depth`.
///
/// Returns a shortest solution of at most `max_depth` moves, or `None`.
pub fn iddfs(initial: &Board, max_depth: usize) -> Option<Vec<Move>> {
    iddfs_with_cancel(initial, max_depth, None)
}

/// `iddfs` that checks `cancel` once per expanded child.
pub fn iddfs_with_cancel(
    initial: &Board,
    max_depth: usize,
    cancel: Option<&AtomicBool>,
) -> Option<Vec<Move>> {
    for limit in 0..=max_depth {
        if let Some(path) = depth_limited(initial, limit, cancel) {
            debug!("iddfs: solved at depth limit {limit}");
            return Some(path);
        }
        if is_cancelled(cancel) {
            debug!("iddfs: cancelled at depth limit {limit}");
            return None;
        }
    }
    debug!("iddfs: no solution within {max_depth} moves");
    None
}

/// AC-3 at the root followed by iterative deepening.
pub fn ac3_iddfs(initial: &Board, max_depth: usize) -> Option<Vec<Move>> {
    ac3_iddfs_with_cancel(initial, max_depth, None)
}

pub fn ac3_iddfs_with_cancel(
    initial: &Board,
    max_depth: usize,
    cancel: Option<&AtomicBool>,
) -> Option<Vec<Move>> {
    if ac3_filter(initial).is_none() {
        debug!("ac3-iddfs: root is inconsistent");
        return None;
    }
    iddfs_with_cancel(initial, max_depth, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::VehicleSpec;

    /// Five moves: h1 left, v1 down twice, then the target twice.
    fn small_puzzle() -> Board {
        Board::new(
            4,
            [
                VehicleSpec::horizontal("sh", 2, 1, 0).target(),
                VehicleSpec::vertical("v1", 2, 0, 2),
                VehicleSpec::horizontal("h1", 2, 3, 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_iddfs_finds_shortest_path() {
        let board = small_puzzle();
        let path = iddfs(&board, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(path.len(), 5);
        assert!(board.replay(&path).unwrap().is_goal());
    }

    #[test]
    fn test_iddfs_respects_depth_bound() {
        assert_eq!(iddfs(&small_puzzle(), 4), None);
        assert!(iddfs(&small_puzzle(), 5).is_some());
    }

    #[test]
    fn test_ac3_variants_solve_small_puzzle() {
        let board = small_puzzle();

        let dfs_path = ac3_dfs(&board).unwrap();
        assert!(board.replay(&dfs_path).unwrap().is_goal());

        assert_eq!(ac3_bfs(&board).map(|path| path.len()), Some(5));
        assert_eq!(ac3_iddfs(&board, 10).map(|path| path.len()), Some(5));
    }

    #[test]
    fn test_goal_at_root_needs_no_moves() {
        let board = Board::new(4, [VehicleSpec::horizontal("sh", 2, 1, 2).target()]).unwrap();
        assert_eq!(ac3_dfs(&board), Some(Vec::new()));
        assert_eq!(iddfs(&board, 0), Some(Vec::new()));
    }

    #[test]
    fn test_raised_cancel_flag_stops_every_variant() {
        let board = small_puzzle();
        let raised = AtomicBool::new(true);
        assert_eq!(ac3_dfs_with_cancel(&board, Some(&raised)), None);
        assert_eq!(ac3_bfs_with_cancel(&board, Some(&raised)), None);
        assert_eq!(iddfs_with_cancel(&board, DEFAULT_MAX_DEPTH, Some(&raised)), None);
        assert_eq!(ac3_iddfs_with_cancel(&board, 10, Some(&raised)), None);

        let lowered = AtomicBool::new(false);
        assert_eq!(
            iddfs_with_cancel(&board, DEFAULT_MAX_DEPTH, Some(&lowered)).map(|p| p.len()),
            Some(5)
        );
    }

    #[test]
    fn test_deadlock_is_reported_by_every_variant() {
        let board = Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 0).target(),
                VehicleSpec::vertical("v1", 3, 0, 4),
                VehicleSpec::vertical("v2", 3, 3, 4),
            ],
        )
        .unwrap();
        assert_eq!(ac3_dfs(&board), None);
        assert_eq!(ac3_bfs(&board), None);
        assert_eq!(ac3_iddfs(&board, 8), None);
    }
}
