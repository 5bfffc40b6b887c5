//! Solver entry points behind the `Solver` trait.
//!
//! Each search method gets a small type carrying its parameters, so callers
//! can pick one at runtime and run it through `run`, which also records the
//! elapsed time for display.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

use crate::annealing::{simulated_annealing_with_cancel, AnnealingConfig};
use crate::astar::astar_solve_with_cancel;
use crate::bfs::bfs_with_cancel;
use crate::constrained::{
    ac3_bfs_with_cancel, ac3_dfs_with_cancel, ac3_iddfs_with_cancel, iddfs_with_cancel,
    DEFAULT_MAX_DEPTH,
};
use crate::grid::{Board, Move};
use crate::Solver;

/// Breadth-first search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bfs;

/// A* with the remaining-distance heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStar;

/// AC-3 at the root, then depth-first search with forward checking.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ac3Dfs;

/// AC-3 at the root, then breadth-first search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ac3Bfs;

/// Iterative-deepening depth-first search.
#[derive(Debug, Clone, Copy)]
pub struct Iddfs {
    pub max_depth: usize,
}

/// AC-3 at the root, then iterative deepening.
#[derive(Debug, Clone, Copy)]
pub struct Ac3Iddfs {
    pub max_depth: usize,
}

/// Simulated annealing.
#[derive(Debug, Clone, Default)]
pub struct Annealing(pub AnnealingConfig);

impl Solver for Bfs {
    fn name(&self) -> &'static str {
        Method::Bfs.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        bfs_with_cancel(board, cancel)
    }
}

impl Solver for AStar {
    fn name(&self) -> &'static str {
        Method::AStar.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        astar_solve_with_cancel(board, cancel)
    }
}

impl Solver for Ac3Dfs {
    fn name(&self) -> &'static str {
        Method::Ac3Dfs.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        ac3_dfs_with_cancel(board, cancel)
    }
}

impl Solver for Ac3Bfs {
    fn name(&self) -> &'static str {
        Method::Ac3Bfs.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        ac3_bfs_with_cancel(board, cancel)
    }
}

impl Solver for Iddfs {
    fn name(&self) -> &'static str {
        Method::Iddfs.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        iddfs_with_cancel(board, self.max_depth, cancel)
    }
}

impl Solver for Ac3Iddfs {
    fn name(&self) -> &'static str {
        Method::Ac3Iddfs.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        ac3_iddfs_with_cancel(board, self.max_depth, cancel)
    }
}

impl Solver for Annealing {
    fn name(&self) -> &'static str {
        Method::Annealing.name()
    }

    fn solve(&self, board: &Board, cancel: Option<&AtomicBool>) -> Option<Vec<Move>> {
        simulated_annealing_with_cancel(board, &self.0, cancel)
    }
}

/// The available search methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Bfs,
    AStar,
    Ac3Dfs,
    Ac3Bfs,
    Iddfs,
    Ac3Iddfs,
    Annealing,
}

/// A method name that `Method::from_str` does not recognise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown method {0:?}, expected one of: bfs, astar, ac3-dfs, ac3-bfs, iddfs, ac3-iddfs, annealing")]
pub struct UnknownMethod(String);

/// Parameters shared by `Method::solver`.
#[derive(Debug, Clone)]
pub struct SolverParams {
    pub max_depth: usize,
    pub annealing: AnnealingConfig,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            annealing: AnnealingConfig::default(),
        }
    }
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Bfs,
        Method::AStar,
        Method::Ac3Dfs,
        Method::Ac3Bfs,
        Method::Iddfs,
        Method::Ac3Iddfs,
        Method::Annealing,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Method::Bfs => "bfs",
            Method::AStar => "astar",
            Method::Ac3Dfs => "ac3-dfs",
            Method::Ac3Bfs => "ac3-bfs",
            Method::Iddfs => "iddfs",
            Method::Ac3Iddfs => "ac3-iddfs",
            Method::Annealing => "annealing",
        }
    }

    /// Builds the solver for this method.
    pub fn solver(self, params: &SolverParams) -> Box<dyn Solver> {
        match self {
            Method::Bfs => Box::new(Bfs),
            Method::AStar => Box::new(AStar),
            Method::Ac3Dfs => Box::new(Ac3Dfs),
            Method::Ac3Bfs => Box::new(Ac3Bfs),
            Method::Iddfs => Box::new(Iddfs {
                max_depth: params.max_depth,
            }),
            Method::Ac3Iddfs => Box::new(Ac3Iddfs {
                max_depth: params.max_depth,
            }),
            Method::Annealing => Box::new(Annealing(params.annealing.clone())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownMethod(name.to_string()))
    }
}

/// Outcome of one solver run, for playback and display.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub method: &'static str,
    /// The solution, or `None` when the solver found none.
    pub moves: Option<Vec<Move>>,
    pub elapsed: Duration,
}

impl SolveReport {
    pub fn solved(&self) -> bool {
        self.moves.is_some()
    }

    pub fn move_count(&self) -> Option<usize> {
        self.moves.as_ref().map(Vec::len)
    }
}

/// Runs a solver and times it.
pub fn run(solver: &dyn Solver, board: &Board) -> SolveReport {
    run_with_cancel(solver, board, None)
}

/// Runs a solver that stops early once `cancel` is raised.
///
/// A cancelled run reports no moves, like an exhausted one.
pub fn run_with_cancel(
    solver: &dyn Solver,
    board: &Board,
    cancel: Option<&AtomicBool>,
) -> SolveReport {
    let start = Instant::now();
    let moves = solver.solve(board, cancel);
    let elapsed = start.elapsed();

    match &moves {
        Some(path) => info!(
            "{}: solved in {} moves after {:?}",
            solver.name(),
            path.len(),
            elapsed
        ),
        None => info!("{}: no solution after {:?}", solver.name(), elapsed),
    }

    SolveReport {
        method: solver.name(),
        moves,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::VehicleSpec;

    fn clear_lane() -> Board {
        Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 0).target(),
                VehicleSpec::vertical("v1", 2, 0, 4),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_method_names_parse_back() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>(), Ok(method));
        }
        assert_eq!("A*".parse::<Method>(), Err(UnknownMethod("A*".to_string())));
        assert_eq!("AStar".parse::<Method>(), Ok(Method::AStar));
    }

    #[test]
    fn test_every_method_solves_clear_lane() {
        let board = clear_lane();
        let params = SolverParams {
            annealing: AnnealingConfig::default().with_seed(3),
            ..SolverParams::default()
        };

        for method in Method::ALL {
            let solver = method.solver(&params);
            assert_eq!(solver.name(), method.name());

            let report = run(solver.as_ref(), &board);
            let moves = report.moves.clone().unwrap();
            assert!(board.replay(&moves).unwrap().is_goal(), "{method}");
            if method != Method::Annealing && method != Method::Ac3Dfs {
                assert_eq!(report.move_count(), Some(4), "{method}");
            }
        }
    }

    #[test]
    fn test_raised_cancel_flag_stops_every_method() {
        let board = clear_lane();
        let params = SolverParams {
            annealing: AnnealingConfig::default().with_seed(3),
            ..SolverParams::default()
        };
        let raised = AtomicBool::new(true);

        for method in Method::ALL {
            let report = run_with_cancel(method.solver(&params).as_ref(), &board, Some(&raised));
            assert!(!report.solved(), "{method}");
            assert_eq!(report.method, method.name());
        }
    }

    #[test]
    fn test_report_for_unsolvable_board() {
        let board = Board::new(
            6,
            [
                VehicleSpec::horizontal("sh", 2, 2, 0).target(),
                VehicleSpec::vertical("v1", 3, 0, 4),
                VehicleSpec::vertical("v2", 3, 3, 4),
            ],
        )
        .unwrap();
        let report = run(&Bfs, &board);
        assert!(!report.solved());
        assert_eq!(report.move_count(), None);
        assert_eq!(report.method, "bfs");
    }
}
