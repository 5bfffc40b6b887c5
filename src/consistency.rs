//! Arc-consistency filtering and forward checking over vehicle head domains.
//!
//! A domain lists the head positions one vehicle may occupy. Each value keeps
//! its cell bitmask next to the head, so two values conflict exactly when
//! their masks intersect.
//!
//! Domains are scratch data for one search branch: callers clone them before
//! narrowing and never share a copy between branches.

use std::collections::VecDeque;
use std::ops::Index;

use log::debug;

use crate::grid::Board;
use crate::vehicles::{Cell, CellMask, DELTAS};

/// One candidate head position and the cells it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub head: Cell,
    pub mask: CellMask,
}

/// Per-vehicle domains, indexed like the layout's vehicles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains(Vec<Vec<Placement>>);

impl Domains {
    pub fn new(domains: Vec<Vec<Placement>>) -> Self {
        Self(domains)
    }

    /// Number of vehicles covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, vehicle: usize, head: Cell) -> bool {
        self.0[vehicle].iter().any(|placement| placement.head == head)
    }

    /// Narrows a vehicle's domain to a single placement.
    pub fn fix(&mut self, vehicle: usize, placement: Placement) {
        self.0[vehicle] = vec![placement];
    }
}

impl Index<usize> for Domains {
    type Output = [Placement];

    fn index(&self, vehicle: usize) -> &[Placement] {
        &self.0[vehicle]
    }
}

/// Head positions a vehicle reaches by sliding from its current head while
/// every other vehicle stays put, including the current head.
///
/// This is a straight scan in each direction, not a graph search. Fixed
/// blocks only get their current head. Values are ordered along the axis.
pub fn legal_heads(board: &Board, vehicle: usize) -> Vec<Placement> {
    let spec = board.layout().vehicle(vehicle);
    let size = board.size();
    let current = board.head(vehicle);
    let current_mask = board.vehicle_mask(vehicle);
    let others = board.occupied() & !current_mask;

    let mut before = Vec::new();
    let mut after = Vec::new();
    if spec.movable {
        for delta in DELTAS {
            let reached = if delta < 0 { &mut before } else { &mut after };
            let mut head = current;
            loop {
                head = spec.shifted(head, delta);
                match spec.span_mask(head, size) {
                    Some(mask) if mask & others == 0 => reached.push(Placement { head, mask }),
                    _ => break,
                }
            }
        }
    }

    before.reverse();
    before.push(Placement {
        head: current,
        mask: current_mask,
    });
    before.extend(after);
    before
}

/// Local reachability domains for every vehicle of a board.
pub fn initial_domains(board: &Board) -> Domains {
    Domains::new(
        (0..board.heads().len())
            .map(|vehicle| legal_heads(board, vehicle))
            .collect(),
    )
}

/// Removes values of `xi` that overlap every value of `xj`.
///
/// Returns true if anything was removed.
fn revise(domains: &mut Domains, xi: usize, xj: usize) -> bool {
    let support = std::mem::take(&mut domains.0[xj]);
    let before = domains.0[xi].len();
    domains.0[xi].retain(|value| support.iter().any(|other| value.mask & other.mask == 0));
    let removed = domains.0[xi].len() != before;
    domains.0[xj] = support;
    removed
}

/// AC-3 over all ordered vehicle pairs.
///
/// Returns the narrowed domains, or `None` as soon as any domain empties.
/// Shrinking `xi` while revising `(xi, xj)` re-queues `(xk, xi)` for every
/// `xk` other than `xi` and `xj`.
pub fn propagate(mut domains: Domains) -> Option<Domains> {
    let count = domains.len();
    let mut queue: VecDeque<(usize, usize)> = (0..count)
        .flat_map(|xi| (0..count).filter(move |&xj| xj != xi).map(move |xj| (xi, xj)))
        .collect();
    let mut revisions = 0usize;

    while let Some((xi, xj)) = queue.pop_front() {
        revisions += 1;
        if !revise(&mut domains, xi, xj) {
            continue;
        }
        if domains.0[xi].is_empty() {
            debug!("arc consistency emptied domain {xi} after {revisions} revisions");
            return None;
        }
        queue.extend(
            (0..count)
                .filter(|&xk| xk != xi && xk != xj)
                .map(|xk| (xk, xi)),
        );
    }

    debug!("arc consistency settled after {revisions} revisions");
    Some(domains)
}

/// Computes local domains for `board` and makes them arc-consistent.
///
/// `None` means the configuration is a dead end.
pub fn ac3_filter(board: &Board) -> Option<Domains> {
    propagate(initial_domains(board))
}

/// Prunes every other vehicle's domain against the cells of `moved` placed at
/// `head`. Returns false if any domain becomes empty.
///
/// Works on the caller's own copy of the domains.
pub fn forward_check(domains: &mut Domains, moved: usize, head: Cell, board: &Board) -> bool {
    let occupied = board.layout().vehicle(moved).occupancy(head, board.size());

    for (vehicle, domain) in domains.0.iter_mut().enumerate() {
        if vehicle == moved {
            continue;
        }
        domain.retain(|value| value.mask & occupied == 0);
        if domain.is_empty() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::{cell_bit, VehicleSpec};

    fn place(cells: &[Cell], size: i32) -> Placement {
        Placement {
            head: cells[0],
            mask: cells
                .iter()
                .fold(0, |mask, &(row, col)| mask | cell_bit(row, col, size)),
        }
    }

    fn sample_board() -> Board {
        Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 1).target(),
                VehicleSpec::vertical("v1", 3, 0, 4),
                VehicleSpec::horizontal("h1", 2, 5, 0),
                VehicleSpec::block("b1", 4, 3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_legal_heads_scans_both_directions() {
        let board = sample_board();
        let heads: Vec<Cell> = legal_heads(&board, 0).iter().map(|p| p.head).collect();
        assert_eq!(heads, vec![(2, 0), (2, 1), (2, 2)]);

        let heads: Vec<Cell> = legal_heads(&board, 1).iter().map(|p| p.head).collect();
        assert_eq!(heads, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);

        let heads: Vec<Cell> = legal_heads(&board, 3).iter().map(|p| p.head).collect();
        assert_eq!(heads, vec![(4, 3)]);
    }

    #[test]
    fn test_filter_keeps_current_heads() {
        let board = sample_board();
        let domains = ac3_filter(&board).unwrap();
        assert_eq!(domains.len(), 4);
        for vehicle in 0..domains.len() {
            assert!(domains.contains(vehicle, board.head(vehicle)));
        }
    }

    #[test]
    fn test_propagate_removes_unsupported_values() {
        let domains = Domains::new(vec![
            vec![place(&[(0, 0), (0, 1)], 4), place(&[(0, 2), (0, 3)], 4)],
            vec![place(&[(0, 1), (1, 1)], 4)],
        ]);
        let narrowed = propagate(domains).unwrap();
        assert_eq!(narrowed[0].len(), 1);
        assert_eq!(narrowed[0][0].head, (0, 2));
        assert_eq!(narrowed[1].len(), 1);
    }

    #[test]
    fn test_propagate_detects_overpacked_vehicles() {
        // a horizontal car squeezed between two pinned vertical cars
        let domains = Domains::new(vec![
            vec![place(&[(0, 0), (0, 1)], 3), place(&[(0, 1), (0, 2)], 3)],
            vec![place(&[(0, 0), (1, 0)], 3)],
            vec![place(&[(0, 2), (1, 2)], 3)],
        ]);
        assert_eq!(propagate(domains), None);
    }

    #[test]
    fn test_forward_check_prunes_other_domains() {
        let board = sample_board();
        let domains = initial_domains(&board);

        // v1 dropped to (2, 4) covers (2..5, 4), so the target cannot sit at (2, 3)
        let mut widened = domains.clone();
        widened.0[0].push(place(&[(2, 3), (2, 4)], 6));
        assert!(forward_check(&mut widened, 1, (2, 4), &board));
        assert!(!widened.contains(0, (2, 3)));
        assert!(widened.contains(0, (2, 1)));
        assert_eq!(widened[2], domains[2]);
    }

    #[test]
    fn test_forward_check_fails_on_empty_domain() {
        let board = sample_board();
        let mut domains = initial_domains(&board);
        // covering the fixed block leaves it no placement
        assert!(!forward_check(&mut domains, 2, (4, 2), &board));
    }
}
