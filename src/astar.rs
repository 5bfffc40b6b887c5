//! A* search with pluggable goal test, successor function and heuristic.
//!
//! The frontier is a binary heap ordered by `f = g + h`. Ties are broken by a
//! monotonically increasing sequence number stored in each entry, so equal
//! priorities pop in insertion order and runs are deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;
use std::sync::atomic::AtomicBool;

use log::debug;
use rustc_hash::FxHashMap;

use crate::grid::{Board, Move};
use crate::heuristics::{goal_column, goal_distance};
use crate::is_cancelled;
use crate::moves::neighbors;

/// A frontier entry. Only `priority` and `seq` take part in ordering.
struct Entry<S> {
    priority: u32,
    seq: u64,
    g: u32,
    state: S,
}

impl<S> PartialEq for Entry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<S> Eq for Entry<S> {}

impl<S> PartialOrd for Entry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Entry<S> {
    // reversed: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Runs A* from `start` until a state satisfying `is_goal` is popped.
///
/// `neighbors` yields `(state, edge_cost)` pairs with positive costs, and
/// `heuristic(state, goal)` must never overestimate the remaining cost for the
/// result to be optimal.
///
/// Returns the path of states from `start` to the goal together with the best
/// known cost of every discovered state. When no goal is reachable the path is
/// empty; a goal at `start` yields a path holding only `start`.
pub fn astar<S, T, G, N, I, H>(
    start: S,
    is_goal: G,
    mut neighbors: N,
    heuristic: H,
    goal: &T,
) -> (Vec<S>, FxHashMap<S, u32>)
where
    S: Clone + Eq + Hash,
    G: Fn(&S) -> bool,
    N: FnMut(&S) -> I,
    I: IntoIterator<Item = (S, u32)>,
    H: Fn(&S, &T) -> u32,
{
    let mut seq = 0u64;
    let mut came_from: FxHashMap<S, S> = FxHashMap::default();
    let mut cost: FxHashMap<S, u32> = FxHashMap::default();
    cost.insert(start.clone(), 0);

    let mut frontier = BinaryHeap::new();
    frontier.push(Entry {
        priority: heuristic(&start, goal),
        seq,
        g: 0,
        state: start.clone(),
    });

    while let Some(Entry { g, state: current, .. }) = frontier.pop() {
        // a cheaper route to this state was queued after this entry
        if cost.get(&current).is_some_and(|&best| g > best) {
            continue;
        }

        if is_goal(&current) {
            let mut path = vec![current.clone()];
            let mut node = &current;
            while *node != start {
                let Some(previous) = came_from.get(node) else {
                    break;
                };
                path.push(previous.clone());
                node = previous;
            }
            path.reverse();
            return (path, cost);
        }

        for (neighbor, step_cost) in neighbors(&current) {
            let new_cost = g + step_cost;
            if cost.get(&neighbor).map_or(true, |&known| new_cost < known) {
                cost.insert(neighbor.clone(), new_cost);
                came_from.insert(neighbor.clone(), current.clone());
                seq += 1;
                frontier.push(Entry {
                    priority: new_cost + heuristic(&neighbor, goal),
                    seq,
                    g: new_cost,
                    state: neighbor,
                });
            }
        }
    }

    (Vec::new(), cost)
}

/// Shortest move sequence using the target's remaining column distance as
/// the heuristic, or `None` if no goal is reachable.
pub fn astar_solve(initial: &Board) -> Option<Vec<Move>> {
    astar_solve_with_cancel(initial, None)
}

/// `astar_solve` that stops expanding once `cancel` is raised and then
/// returns `None`.
pub fn astar_solve_with_cancel(initial: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
    let goal = goal_column(initial);
    // a raised flag yields no successors, so the frontier drains without growing
    let (path, cost) = astar(
        initial.clone(),
        Board::is_goal,
        |board| {
            let successors = if is_cancelled(cancel) {
                Vec::new()
            } else {
                neighbors(board)
            };
            successors.into_iter().map(|(next, _)| (next, 1))
        },
        goal_distance,
        &goal,
    );
    debug!("a* discovered {} states", cost.len());

    if path.is_empty() || is_cancelled(cancel) {
        return None;
    }
    path.windows(2)
        .map(|pair| pair[0].move_to(&pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::VehicleSpec;

    /// Undirected weighted graph over small integers.
    fn graph_neighbors(edges: &[(u32, u32, u32)], node: u32) -> Vec<(u32, u32)> {
        edges
            .iter()
            .filter_map(|&(a, b, w)| {
                if a == node {
                    Some((b, w))
                } else if b == node {
                    Some((a, w))
                } else {
                    None
                }
            })
            .collect()
    }

    #[test]
    fn test_astar_prefers_cheaper_route() {
        let edges = [(0, 1, 1), (1, 3, 5), (0, 2, 2), (2, 3, 1)];
        let (path, cost) = astar(
            0u32,
            |&n| n == 3,
            |&n| graph_neighbors(&edges, n),
            |_, _| 0,
            &3u32,
        );
        assert_eq!(path, vec![0, 2, 3]);
        assert_eq!(cost[&3], 3);
    }

    #[test]
    fn test_astar_unreachable_goal_returns_empty_path() {
        let edges = [(0, 1, 1)];
        let (path, cost) = astar(
            0u32,
            |&n| n == 9,
            |&n| graph_neighbors(&edges, n),
            |_, _| 0,
            &9u32,
        );
        assert!(path.is_empty());
        assert_eq!(cost.len(), 2);
    }

    #[test]
    fn test_astar_goal_at_start_is_single_state_path() {
        let (path, _) = astar(4u32, |&n| n == 4, |_| Vec::new(), |_, _| 0, &4u32);
        assert_eq!(path, vec![4]);
    }

    #[test]
    fn test_entry_ordering_is_fifo_among_ties() {
        let mut heap = BinaryHeap::new();
        for (seq, priority) in [(0, 5), (1, 3), (2, 3), (3, 4)] {
            heap.push(Entry {
                priority,
                seq,
                g: 0,
                state: seq,
            });
        }
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.state)).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_astar_solve_honours_cancel_flag() {
        let board = Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 0).target(),
                VehicleSpec::vertical("v1", 2, 0, 4),
            ],
        )
        .unwrap();
        assert_eq!(astar_solve_with_cancel(&board, Some(&AtomicBool::new(true))), None);
        assert_eq!(
            astar_solve_with_cancel(&board, Some(&AtomicBool::new(false))).map(|p| p.len()),
            Some(4)
        );
    }

    #[test]
    fn test_astar_solve_matches_clear_lane() {
        let board = Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 0).target(),
                VehicleSpec::vertical("v1", 2, 0, 4),
            ],
        )
        .unwrap();
        let path = astar_solve(&board).unwrap();
        assert_eq!(path.len(), 4);
        assert!(board.replay(&path).unwrap().is_goal());
    }
}
