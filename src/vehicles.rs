//! Vehicle definitions and cell spans.
//!
//! A vehicle occupies `length` contiguous cells starting at its head cell and
//! extending to the right (horizontal) or downward (vertical). Only the head
//! changes during a search; axis, length and identity are fixed when the
//! puzzle is built.

/// A grid cell as `(row, col)`.
pub type Cell = (i32, i32);

/// Bitmask of grid cells, bit `row * size + col` set when occupied.
pub type CellMask = u128;

/// Maximum number of cells in a grid (one bit per cell in `CellMask`).
pub const MAX_CELLS: usize = CellMask::BITS as usize;

/// The unit displacements, in the order the move generator tries them.
pub const DELTAS: [i32; 2] = [-1, 1];

/// Direction a vehicle is allowed to slide in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Offset of a single unit step along this axis.
    #[inline]
    pub const fn unit(self) -> Cell {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
        }
    }
}

/// Bit for a single cell in a grid of the given size.
#[inline(always)]
pub const fn cell_bit(row: i32, col: i32, size: i32) -> CellMask {
    (1 as CellMask) << ((row * size + col) as u32)
}

/// The fixed part of a vehicle: everything except its head position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub id: String,
    pub axis: Axis,
    pub length: i32,
    /// Fixed blocks occupy cells but never move.
    pub movable: bool,
}

impl Vehicle {
    /// Cells occupied when the head sits at `head`.
    pub fn cells(&self, head: Cell) -> impl Iterator<Item = Cell> + '_ {
        let (row_step, col_step) = self.axis.unit();
        (0..self.length).map(move |i| (head.0 + row_step * i, head.1 + col_step * i))
    }

    /// Head position after sliding `delta` units along the axis.
    #[inline]
    pub fn shifted(&self, head: Cell, delta: i32) -> Cell {
        let (row_step, col_step) = self.axis.unit();
        (head.0 + row_step * delta, head.1 + col_step * delta)
    }

    /// Bitmask of the cells covered from `head`.
    ///
    /// Returns `None` if any cell would fall outside `[0, size)` on either axis.
    pub fn span_mask(&self, head: Cell, size: i32) -> Option<CellMask> {
        let mut mask = 0;
        for (row, col) in self.cells(head) {
            if !(0..size).contains(&row) || !(0..size).contains(&col) {
                return None;
            }
            mask |= cell_bit(row, col, size);
        }
        Some(mask)
    }

    /// Bitmask of the cells covered from a head already known to be in bounds.
    #[inline]
    pub fn occupancy(&self, head: Cell, size: i32) -> CellMask {
        self.cells(head)
            .fold(0, |mask, (row, col)| mask | cell_bit(row, col, size))
    }
}

/// Input record for one vehicle, as handed over by a puzzle loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleSpec {
    pub id: String,
    pub axis: Axis,
    pub length: i32,
    pub head: Cell,
    pub movable: bool,
    pub target: bool,
}

impl VehicleSpec {
    pub fn new(id: impl Into<String>, axis: Axis, length: i32, head: Cell) -> Self {
        Self {
            id: id.into(),
            axis,
            length,
            head,
            movable: true,
            target: false,
        }
    }

    pub fn horizontal(id: impl Into<String>, length: i32, row: i32, col: i32) -> Self {
        Self::new(id, Axis::Horizontal, length, (row, col))
    }

    pub fn vertical(id: impl Into<String>, length: i32, row: i32, col: i32) -> Self {
        Self::new(id, Axis::Vertical, length, (row, col))
    }

    /// A single-cell block that never moves.
    pub fn block(id: impl Into<String>, row: i32, col: i32) -> Self {
        Self::new(id, Axis::Horizontal, 1, (row, col)).fixed()
    }

    /// Marks this record as the distinguished target vehicle.
    pub fn target(mut self) -> Self {
        self.target = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.movable = false;
        self
    }

    pub(crate) fn split(self) -> (Vehicle, Cell, bool) {
        let vehicle = Vehicle {
            id: self.id,
            axis: self.axis,
            length: self.length,
            movable: self.movable,
        };
        (vehicle, self.head, self.target)
    }
}
