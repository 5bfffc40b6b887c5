//! Board configurations for the Rush Hour grid.
//!
//! A `Board` is a value type: the immutable `Layout` (grid size, vehicle
//! identities, axes and lengths) is shared behind an `Arc`, and only the head
//! of each vehicle is stored per configuration. Producing a successor copies
//! the head array and updates exactly one entry, so a board never changes once
//! it sits in a visited set or a frontier.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::vehicles::{Axis, Cell, CellMask, Vehicle, VehicleSpec, DELTAS, MAX_CELLS};

/// Canonical identity of a configuration.
///
/// One `(id, head)` pair per vehicle, ordered by id, so the order in which
/// the vehicle records were listed never shows up in the key. Two boards of
/// the same puzzle are equal exactly when their keys are equal.
pub type StateKey = Box<[(Arc<str>, Cell)]>;

/// A single unit slide of one vehicle along its own axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Index of the vehicle in the layout.
    pub vehicle: usize,
    /// Signed displacement, always -1 or +1.
    pub delta: i32,
}

impl Move {
    pub const fn new(vehicle: usize, delta: i32) -> Self {
        Self { vehicle, delta }
    }
}

/// Reasons a puzzle configuration cannot be constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("grid size {size} must be positive and hold at most {max} cells", max = MAX_CELLS)]
    InvalidGridSize { size: i32 },
    #[error("puzzle has no target vehicle")]
    MissingTarget,
    #[error("puzzle marks both {first} and {second} as the target vehicle")]
    MultipleTargets { first: String, second: String },
    #[error("target vehicle {id} must be horizontal")]
    TargetNotHorizontal { id: String },
    #[error("target vehicle {id} cannot be a fixed block")]
    FixedTarget { id: String },
    #[error("vehicle id {id} is used more than once")]
    DuplicateId { id: String },
    #[error("vehicle {id} has length {length}, expected at least {min}")]
    TooShort { id: String, length: i32, min: i32 },
    #[error("vehicle {id} does not fit inside the {size}x{size} grid")]
    OutOfBounds { id: String, size: i32 },
    #[error("vehicles {first} and {second} overlap")]
    Overlap { first: String, second: String },
}

/// Reasons a move cannot be applied during playback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no vehicle with index {index}")]
    UnknownVehicle { index: usize },
    #[error("vehicle {id} is a fixed block")]
    Fixed { id: String },
    #[error("displacement {delta} is not a unit slide")]
    InvalidDelta { delta: i32 },
    #[error("vehicle {id} cannot slide by {delta}")]
    Blocked { id: String, delta: i32 },
}

/// The parts of a puzzle that never change during a search.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    size: i32,
    vehicles: Vec<Vehicle>,
    target: usize,
    /// Vehicle indices with their ids, sorted by id.
    by_id: Box<[(usize, Arc<str>)]>,
}

impl Layout {
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    #[inline]
    pub fn vehicle(&self, index: usize) -> &Vehicle {
        &self.vehicles[index]
    }

    /// Index of the target vehicle.
    #[inline]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Looks up a vehicle index by its identity.
    pub fn find(&self, id: &str) -> Option<usize> {
        self.vehicles.iter().position(|vehicle| vehicle.id == id)
    }

    /// True if both layouts describe the same puzzle, whatever order their
    /// vehicles were listed in.
    pub fn same_puzzle(&self, other: &Layout) -> bool {
        self.size == other.size
            && self.vehicles.len() == other.vehicles.len()
            && self.vehicles[self.target].id == other.vehicles[other.target].id
            && self
                .by_id
                .iter()
                .zip(other.by_id.iter())
                .all(|(&(a, _), &(b, _))| self.vehicles[a] == other.vehicles[b])
    }
}

/// One configuration of the puzzle.
#[derive(Clone)]
pub struct Board {
    layout: Arc<Layout>,
    heads: Box<[Cell]>,
}

impl Board {
    /// Builds and validates a configuration from vehicle records.
    ///
    /// Fails on a missing or duplicated target, duplicate ids, vehicles that
    /// leave the grid or overlap, and grids too large for `CellMask`.
    pub fn new(
        size: i32,
        specs: impl IntoIterator<Item = VehicleSpec>,
    ) -> Result<Self, BoardError> {
        if size <= 0 || (size as usize) * (size as usize) > MAX_CELLS {
            return Err(BoardError::InvalidGridSize { size });
        }

        let mut vehicles: Vec<Vehicle> = Vec::new();
        let mut heads = Vec::new();
        let mut masks: Vec<CellMask> = Vec::new();
        let mut target = None;

        for spec in specs {
            let (vehicle, head, is_target) = spec.split();

            if vehicles.iter().any(|other| other.id == vehicle.id) {
                return Err(BoardError::DuplicateId { id: vehicle.id });
            }
            let min = if vehicle.movable { 2 } else { 1 };
            if vehicle.length < min {
                return Err(BoardError::TooShort {
                    id: vehicle.id,
                    length: vehicle.length,
                    min,
                });
            }
            let Some(mask) = vehicle.span_mask(head, size) else {
                return Err(BoardError::OutOfBounds {
                    id: vehicle.id,
                    size,
                });
            };
            if let Some(other) = masks.iter().position(|&other| other & mask != 0) {
                return Err(BoardError::Overlap {
                    first: vehicles[other].id.clone(),
                    second: vehicle.id,
                });
            }

            if is_target {
                if let Some(first) = target {
                    let first: &Vehicle = &vehicles[first];
                    return Err(BoardError::MultipleTargets {
                        first: first.id.clone(),
                        second: vehicle.id,
                    });
                }
                if vehicle.axis != Axis::Horizontal {
                    return Err(BoardError::TargetNotHorizontal { id: vehicle.id });
                }
                if !vehicle.movable {
                    return Err(BoardError::FixedTarget { id: vehicle.id });
                }
                target = Some(vehicles.len());
            }

            masks.push(mask);
            heads.push(head);
            vehicles.push(vehicle);
        }

        let target = target.ok_or(BoardError::MissingTarget)?;

        let mut by_id: Vec<(usize, Arc<str>)> = vehicles
            .iter()
            .enumerate()
            .map(|(index, vehicle)| (index, Arc::from(vehicle.id.as_str())))
            .collect();
        by_id.sort_unstable_by(|a, b| a.1.cmp(&b.1));

        Ok(Self {
            layout: Arc::new(Layout {
                size,
                vehicles,
                target,
                by_id: by_id.into_boxed_slice(),
            }),
            heads: heads.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.layout.size
    }

    #[inline]
    pub fn head(&self, vehicle: usize) -> Cell {
        self.heads[vehicle]
    }

    #[inline]
    pub fn heads(&self) -> &[Cell] {
        &self.heads
    }

    /// Canonical visited-set key for this configuration.
    #[inline]
    pub fn key(&self) -> StateKey {
        self.layout
            .by_id
            .iter()
            .map(|(index, id)| (Arc::clone(id), self.heads[*index]))
            .collect()
    }

    /// Head of the target vehicle.
    #[inline]
    pub fn target_head(&self) -> Cell {
        self.heads[self.layout.target]
    }

    /// True once the target vehicle's trailing edge reaches the far edge.
    pub fn is_goal(&self) -> bool {
        let target = self.layout.vehicle(self.layout.target);
        self.target_head().1 + target.length >= self.layout.size
    }

    /// Cells covered by one vehicle in this configuration.
    #[inline]
    pub fn vehicle_mask(&self, vehicle: usize) -> CellMask {
        self.layout
            .vehicle(vehicle)
            .occupancy(self.heads[vehicle], self.layout.size)
    }

    /// Cells covered by any vehicle in this configuration.
    pub fn occupied(&self) -> CellMask {
        (0..self.heads.len()).fold(0, |mask, vehicle| mask | self.vehicle_mask(vehicle))
    }

    /// New head of `vehicle` after sliding by `delta`, if the slide is legal
    /// against the given occupancy of the whole board.
    pub(crate) fn slide_head(&self, occupied: CellMask, vehicle: usize, delta: i32) -> Option<Cell> {
        let spec = self.layout.vehicle(vehicle);
        if !spec.movable {
            return None;
        }
        let head = spec.shifted(self.heads[vehicle], delta);
        let mask = spec.span_mask(head, self.layout.size)?;
        let others = occupied & !self.vehicle_mask(vehicle);
        (mask & others == 0).then_some(head)
    }

    /// Copy of this board with one vehicle's head replaced.
    pub(crate) fn with_head(&self, vehicle: usize, head: Cell) -> Self {
        let mut heads = self.heads.clone();
        heads[vehicle] = head;
        Self {
            layout: Arc::clone(&self.layout),
            heads,
        }
    }

    /// Applies one move, reporting why it is illegal instead of skipping it.
    pub fn apply(&self, mv: Move) -> Result<Self, MoveError> {
        let Some(vehicle) = self.layout.vehicles.get(mv.vehicle) else {
            return Err(MoveError::UnknownVehicle { index: mv.vehicle });
        };
        if !vehicle.movable {
            return Err(MoveError::Fixed {
                id: vehicle.id.clone(),
            });
        }
        if mv.delta != -1 && mv.delta != 1 {
            return Err(MoveError::InvalidDelta { delta: mv.delta });
        }

        match self.slide_head(self.occupied(), mv.vehicle, mv.delta) {
            Some(head) => Ok(self.with_head(mv.vehicle, head)),
            None => Err(MoveError::Blocked {
                id: vehicle.id.clone(),
                delta: mv.delta,
            }),
        }
    }

    /// Applies a whole move sequence in order.
    pub fn replay(&self, moves: &[Move]) -> Result<Self, MoveError> {
        moves
            .iter()
            .try_fold(self.clone(), |board, &mv| board.apply(mv))
    }

    /// Recovers the single unit move leading from this board to `next`.
    ///
    /// Returns `None` unless exactly one vehicle differs by one unit along
    /// its axis.
    pub fn move_to(&self, next: &Board) -> Option<Move> {
        let mut changed = self
            .heads
            .iter()
            .zip(next.heads.iter())
            .enumerate()
            .filter(|(_, (before, after))| before != after);

        let (vehicle, (&before, &after)) = changed.next()?;
        if changed.next().is_some() {
            return None;
        }

        let spec = self.layout.vehicle(vehicle);
        DELTAS
            .into_iter()
            .find(|&delta| spec.shifted(before, delta) == after)
            .map(|delta| Move::new(vehicle, delta))
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.layout, &other.layout) {
            return self.heads == other.heads;
        }
        self.layout.same_puzzle(&other.layout)
            && self
                .layout
                .by_id
                .iter()
                .zip(other.layout.by_id.iter())
                .all(|(&(a, _), &(b, _))| self.heads[a] == other.heads[b])
    }
}

impl Eq for Board {}

// Hashes the same `(id, head)` sequence as `key`.
impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (index, id) in self.layout.by_id.iter() {
            id.hash(state);
            self.heads[*index].hash(state);
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.layout
                    .vehicles
                    .iter()
                    .zip(self.heads.iter())
                    .map(|(vehicle, head)| (&vehicle.id, head)),
            )
            .finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_board(self))
    }
}

/// Labels for vehicles other than the target (`X`) and fixed blocks (`#`).
const LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWYZabcdefghijklmnopqrstuvwxyz";

/// Display character for a vehicle.
///
/// The target is `X`, fixed blocks are `#`, and the remaining vehicles are
/// lettered in layout order.
pub fn vehicle_label(layout: &Layout, index: usize) -> char {
    if index == layout.target {
        return 'X';
    }
    if !layout.vehicles[index].movable {
        return '#';
    }
    let rank = layout.vehicles[..index]
        .iter()
        .enumerate()
        .filter(|(other, vehicle)| *other != layout.target && vehicle.movable)
        .count();
    LABELS.get(rank).map_or('?', |&label| char::from(label))
}

/// Formats a board as a character grid, one line per row.
///
/// Empty cells show as '.'.
pub fn format_board(board: &Board) -> String {
    let size = board.size() as usize;
    let mut cells = vec!['.'; size * size];

    for (index, vehicle) in board.layout.vehicles.iter().enumerate() {
        let label = vehicle_label(&board.layout, index);
        for (row, col) in vehicle.cells(board.heads[index]) {
            cells[row as usize * size + col as usize] = label;
        }
    }

    let mut output = String::with_capacity(size * (size + 1));
    for row in cells.chunks(size) {
        output.extend(row);
        output.push('\n');
    }
    output
}

/// Formats a move sequence as space-separated `id+1` / `id-1` tokens.
pub fn format_moves(layout: &Layout, moves: &[Move]) -> String {
    moves
        .iter()
        .map(|mv| format!("{}{:+}", layout.vehicle(mv.vehicle).id, mv.delta))
        .collect::<Vec<_>>()
        .join(" ")
}
