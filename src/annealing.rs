//! Simulated annealing over the move graph.
//!
//! Best-effort: each iteration picks one legal move uniformly at random and
//! accepts it if it lowers the cost, or otherwise with the Metropolis
//! probability `exp((current - next) / temp)`. The temperature cools
//! geometrically. A run is a single attempt; restarting after a failure is
//! left to the caller.

use std::sync::atomic::AtomicBool;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::grid::{Board, Move};
use crate::heuristics::annealing_cost;
use crate::is_cancelled;
use crate::moves::{legal_moves, try_slide};

/// Rejected annealing parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("start temperature must be positive and finite, got {0}")]
    StartTemp(f64),
    #[error("cooling rate must lie in (0, 1], got {0}")]
    CoolingRate(f64),
}

/// Parameters of one annealing run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealingConfig {
    pub max_iter: usize,
    pub start_temp: f64,
    pub cooling_rate: f64,
    /// Fixed RNG seed for reproducible runs; OS entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            start_temp: 500.0,
            cooling_rate: 0.995,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn new(max_iter: usize, start_temp: f64, cooling_rate: f64) -> Result<Self, ParamError> {
        let config = Self {
            max_iter,
            start_temp,
            cooling_rate,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.start_temp.is_finite() && self.start_temp > 0.0) {
            return Err(ParamError::StartTemp(self.start_temp));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(ParamError::CoolingRate(self.cooling_rate));
        }
        Ok(())
    }
}

/// Runs annealing with an RNG built from `config.seed`.
pub fn simulated_annealing(initial: &Board, config: &AnnealingConfig) -> Option<Vec<Move>> {
    simulated_annealing_with_cancel(initial, config, None)
}

/// `simulated_annealing` that checks `cancel` once per iteration.
pub fn simulated_annealing_with_cancel(
    initial: &Board,
    config: &AnnealingConfig,
    cancel: Option<&AtomicBool>,
) -> Option<Vec<Move>> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    anneal(initial, config, &mut rng, cancel)
}

/// Runs annealing with a caller-supplied RNG.
///
/// Returns the accumulated path as soon as the current board is a goal. After
/// `max_iter` iterations, returns the best-so-far path if that board is a
/// goal, otherwise `None`. A raised `cancel` flag ends the run early the
/// same way.
pub fn anneal<R: Rng>(
    initial: &Board,
    config: &AnnealingConfig,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Option<Vec<Move>> {
    let mut current = initial.clone();
    let mut current_cost = annealing_cost(&current);
    let mut temp = config.start_temp;
    let mut path: Vec<Move> = Vec::new();

    let mut best = current.clone();
    let mut best_cost = current_cost;
    let mut best_path: Vec<Move> = Vec::new();

    for iteration in 0..config.max_iter {
        if current.is_goal() {
            debug!("annealing reached goal at iteration {iteration}");
            return Some(path);
        }
        if is_cancelled(cancel) {
            debug!("annealing cancelled at iteration {iteration}");
            break;
        }

        // no legal move: the iteration is skipped without cooling
        let Some(&mv) = legal_moves(&current).choose(rng) else {
            continue;
        };
        let Some(next) = try_slide(&current, mv) else {
            continue;
        };
        let next_cost = annealing_cost(&next);
        let delta_e = f64::from(current_cost) - f64::from(next_cost);

        if delta_e > 0.0 || rng.gen::<f64>() < (delta_e / temp).exp() {
            current = next;
            current_cost = next_cost;
            path.push(mv);

            if current_cost < best_cost {
                best = current.clone();
                best_cost = current_cost;
                best_path = path.clone();
            }
        }

        temp *= config.cooling_rate;
    }

    if best.is_goal() {
        Some(best_path)
    } else {
        debug!(
            "annealing gave up after {} iterations, best cost {best_cost}",
            config.max_iter
        );
        None
    }
}
