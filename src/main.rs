//! Rush Hour Solver
//!
//! Loads a puzzle from a file (or uses the bundled sample), solves it with
//! one of several search methods and prints the board, the move sequence and
//! the final position. `compare` runs every method on the same puzzle.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::warn;

use rushhour::annealing::AnnealingConfig;
use rushhour::constrained::DEFAULT_MAX_DEPTH;
use rushhour::grid::format_moves;
use rushhour::puzzle_file::{self, DEFAULT_SIZE, SAMPLE};
use rushhour::solver::{self, Method, SolveReport, SolverParams};
use rushhour::{Board, Solver};

/// Per-method wait used by `compare` when no timeout is given.
const COMPARE_TIMEOUT_SECS: u64 = 10;

/// Solves Rush Hour puzzles with several search strategies.
#[derive(Parser)]
#[command(name = "rushhour")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a puzzle with one method and print the moves.
    Solve {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        /// Search method.
        #[arg(short, long, default_value_t = Method::Bfs)]
        method: Method,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Print the starting board.
    Show {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
    /// Run every method and print move counts and timings.
    Compare {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct PuzzleArgs {
    /// Puzzle file with `kind,length,row,col` records; the bundled sample
    /// when omitted.
    file: Option<PathBuf>,
    /// Grid side length.
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: i32,
}

#[derive(Args)]
struct SearchArgs {
    /// Depth bound for the iterative-deepening methods.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Annealing iterations.
    #[arg(long, default_value_t = 5000)]
    max_iter: usize,
    /// Annealing start temperature.
    #[arg(long, default_value_t = 500.0)]
    start_temp: f64,
    /// Annealing cooling factor per iteration.
    #[arg(long, default_value_t = 0.995)]
    cooling_rate: f64,
    /// Fixed annealing seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Stop waiting for a method after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl SearchArgs {
    fn params(&self) -> Result<SolverParams, String> {
        let mut annealing = AnnealingConfig::new(self.max_iter, self.start_temp, self.cooling_rate)
            .map_err(|e| e.to_string())?;
        annealing.seed = self.seed;
        Ok(SolverParams {
            max_depth: self.max_depth,
            annealing,
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Solve {
            puzzle,
            method,
            search,
        }) => run_solve(&puzzle, method, &search),
        Some(Command::Show { puzzle }) => run_show(&puzzle),
        Some(Command::Compare { puzzle, search }) => run_compare(&puzzle, &search),
        None => {
            // default: solve the sample with BFS
            let puzzle = PuzzleArgs {
                file: None,
                size: DEFAULT_SIZE,
            };
            let search = SearchArgs {
                max_depth: DEFAULT_MAX_DEPTH,
                max_iter: 5000,
                start_temp: 500.0,
                cooling_rate: 0.995,
                seed: None,
                timeout: None,
            };
            run_solve(&puzzle, Method::Bfs, &search)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

/// Loads the puzzle named on the command line, or the sample.
fn load_board(puzzle: &PuzzleArgs) -> Result<Board, String> {
    match &puzzle.file {
        Some(path) => puzzle_file::load(path, puzzle.size)
            .map_err(|e| format!("{}: {}", path.display(), e)),
        None => puzzle_file::parse(SAMPLE, puzzle.size).map_err(|e| format!("sample: {}", e)),
    }
}

/// Runs a solver, optionally on a worker thread with a deadline.
///
/// Returns `None` if the deadline passed first. The worker is then told to
/// stop and joined, so it does not keep a core busy behind the next run.
fn run_with_timeout(
    solver: Box<dyn Solver>,
    board: &Board,
    timeout: Option<Duration>,
) -> Option<SolveReport> {
    let Some(limit) = timeout else {
        return Some(solver::run(solver.as_ref(), board));
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let board = board.clone();
    let worker = {
        let cancel = Arc::clone(&cancel);
        thread::spawn(move || {
            let report = solver::run_with_cancel(solver.as_ref(), &board, Some(&cancel));
            let _ = tx.send(report);
        })
    };

    match rx.recv_timeout(limit) {
        Ok(report) => {
            let _ = worker.join();
            Some(report)
        }
        Err(_) => {
            warn!("gave up waiting after {:?}, stopping the search", limit);
            cancel.store(true, Ordering::Relaxed);
            if worker.join().is_err() {
                warn!("search thread panicked");
            }
            None
        }
    }
}

fn run_solve(puzzle: &PuzzleArgs, method: Method, search: &SearchArgs) -> Result<(), String> {
    let board = load_board(puzzle)?;
    let params = search.params()?;
    println!("{}", board);

    let timeout = search.timeout.map(Duration::from_secs);
    let Some(report) = run_with_timeout(method.solver(&params), &board, timeout) else {
        return Err(format!("{}: no answer within {:?}", method, timeout.unwrap_or_default()));
    };

    print!("{}", describe(&board, &report));
    if let Some(moves) = &report.moves {
        let solved = board
            .replay(moves)
            .map_err(|e| format!("{} returned an illegal move: {}", method, e))?;
        println!();
        print!("{}", solved);
    }
    Ok(())
}

fn run_show(puzzle: &PuzzleArgs) -> Result<(), String> {
    let board = load_board(puzzle)?;
    print!("{}", board);
    Ok(())
}

fn run_compare(puzzle: &PuzzleArgs, search: &SearchArgs) -> Result<(), String> {
    let board = load_board(puzzle)?;
    let params = search.params()?;
    let timeout = Duration::from_secs(search.timeout.unwrap_or(COMPARE_TIMEOUT_SECS));
    println!("{}", board);

    for method in Method::ALL {
        match run_with_timeout(method.solver(&params), &board, Some(timeout)) {
            Some(report) => println!("{}", summary_line(&report)),
            None => println!("{:<10} timed out after {:?}", method.name(), timeout),
        }
    }
    Ok(())
}

/// One-line result used by `compare`.
fn summary_line(report: &SolveReport) -> String {
    match report.move_count() {
        Some(count) => format!(
            "{:<10} {:>4} moves  {:?}",
            report.method, count, report.elapsed
        ),
        None => format!("{:<10} no solution  {:?}", report.method, report.elapsed),
    }
}

/// Method, outcome and move list of a single solve.
fn describe(board: &Board, report: &SolveReport) -> String {
    match &report.moves {
        Some(moves) => format!(
            "{}: {} moves in {:?}\n{}\n",
            report.method,
            moves.len(),
            report.elapsed,
            format_moves(board.layout(), moves)
        ),
        None => format!("{}: no solution ({:?})\n", report.method, report.elapsed),
    }
}
