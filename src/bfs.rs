//! Breadth-first search over the move graph.
//!
//! Every edge costs one slide, so the first goal dequeued is reached by a
//! shortest move sequence.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;

use log::debug;
use rustc_hash::FxHashMap;

use crate::grid::{Board, Move, StateKey};
use crate::moves::neighbors;
use crate::is_cancelled;

/// Predecessor links keyed by state; the root maps to `None`.
pub(crate) type Parents = FxHashMap<StateKey, Option<(StateKey, Move)>>;

/// Walks predecessor links back from `key` and returns the moves in order.
pub(crate) fn trace_path(parents: &Parents, key: &StateKey) -> Vec<Move> {
    let mut path = Vec::new();
    let mut current = key;
    while let Some(Some((parent, mv))) = parents.get(current) {
        path.push(*mv);
        current = parent;
    }
    path.reverse();
    path
}

/// Finds a shortest move sequence to the goal, or `None` if the reachable
/// component holds no goal.
///
/// A state is marked visited when it is first queued, starting with the
/// initial state, and is never queued again.
pub fn bfs(initial: &Board) -> Option<Vec<Move>> {
    bfs_with_cancel(initial, None)
}

/// `bfs` that gives up with `None` once `cancel` is raised, checked once per
/// dequeued state.
pub fn bfs_with_cancel(initial: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
    let mut parents: Parents = FxHashMap::default();
    parents.insert(initial.key(), None);

    let mut frontier = VecDeque::from([initial.clone()]);
    let mut expanded = 0usize;

    while let Some(board) = frontier.pop_front() {
        if is_cancelled(cancel) {
            debug!("bfs cancelled after expanding {expanded} states");
            return None;
        }
        let key = board.key();
        if board.is_goal() {
            debug!("bfs reached goal after expanding {expanded} states");
            return Some(trace_path(&parents, &key));
        }
        expanded += 1;

        for (next, mv) in neighbors(&board) {
            let next_key = next.key();
            if parents.contains_key(&next_key) {
                continue;
            }
            parents.insert(next_key, Some((key.clone(), mv)));
            frontier.push_back(next);
        }
    }

    debug!("bfs exhausted {expanded} states without a goal");
    None
}
