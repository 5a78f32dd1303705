//! Square grid of cell states with copy-on-write updates.
//!
//! A `Grid` is cheap to clone: clones share one buffer until one of them is
//! written through [`Grid::set_cell`], which hands back a fresh grid and
//! leaves every earlier snapshot untouched.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::common::EngineError;

/// Revealed or hidden state of a single square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    Empty,
    ShipPresent,
    Hit,
    Miss,
    Sunk,
}

/// How a requested state change relates to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The cell moves forward to the new state.
    Advance,
    /// The cell already carries the new state (or a later one).
    Redundant,
    /// The change would move the cell backwards.
    Rejected,
}

impl Cell {
    /// Classify moving from `self` to `to`. Cells only move forward along
    /// `Empty/ShipPresent -> Hit -> Sunk` or `Empty -> Miss`.
    pub fn transition_to(self, to: Cell) -> Transition {
        use Cell::*;
        match (self, to) {
            (a, b) if a == b => Transition::Redundant,
            (Sunk, Hit) => Transition::Redundant,
            (Empty, ShipPresent) => Transition::Advance,
            (Empty | ShipPresent, Hit | Sunk) => Transition::Advance,
            (Hit, Sunk) => Transition::Advance,
            (Empty, Miss) => Transition::Advance,
            _ => Transition::Rejected,
        }
    }

    /// The state as seen by the attacking side.
    pub fn public(self) -> Cell {
        match self {
            Cell::ShipPresent => Cell::Empty,
            other => other,
        }
    }

    /// Whether a shot has already landed here.
    pub fn is_resolved(self) -> bool {
        matches!(self, Cell::Hit | Cell::Miss | Cell::Sunk)
    }

    /// Whether the cell belongs to a ship for extent scanning.
    pub(crate) fn is_ship_segment(self) -> bool {
        matches!(self, Cell::Hit | Cell::ShipPresent)
    }

    fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::ShipPresent => 'O',
            Cell::Hit => 'X',
            Cell::Miss => '~',
            Cell::Sunk => '#',
        }
    }
}

/// An `n x n` grid of [`Cell`] values addressed by `(row, col)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Arc<Vec<Cell>>,
}

impl Grid {
    /// Create a grid with every cell `Empty`.
    pub fn new(size: usize) -> Self {
        Grid {
            size,
            cells: Arc::new(vec![Cell::Empty; size * size]),
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Result<usize, EngineError> {
        if row >= self.size || col >= self.size {
            return Err(EngineError::OutOfBounds { row, col });
        }
        Ok(row * self.size + col)
    }

    /// Whether `(row, col)` lies on the grid.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Read the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<Cell, EngineError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx])
    }

    /// Return a grid with exactly one cell changed. `self` and any other
    /// clone of it keep their contents.
    pub fn set_cell(&self, row: usize, col: usize, state: Cell) -> Result<Grid, EngineError> {
        let idx = self.index(row, col)?;
        let mut cells = Arc::clone(&self.cells);
        Arc::make_mut(&mut cells)[idx] = state;
        Ok(Grid {
            size: self.size,
            cells,
        })
    }

    /// Iterate over `(row, col, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| (i / size, i % size, cell))
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Copy of the grid with ship positions hidden.
    pub fn public_view(&self) -> Grid {
        Grid {
            size: self.size,
            cells: Arc::new(self.cells.iter().map(|c| c.public()).collect()),
        }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}:", self.size, self.size)?;
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size.max(1)) {
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cell_leaves_original_untouched() {
        let grid = Grid::new(10);
        let next = grid.set_cell(2, 3, Cell::Miss).unwrap();
        assert_eq!(grid.get(2, 3).unwrap(), Cell::Empty);
        assert_eq!(next.get(2, 3).unwrap(), Cell::Miss);
        assert_eq!(next.count(Cell::Empty), 99);
    }

    #[test]
    fn out_of_bounds_access_fails() {
        let grid = Grid::new(10);
        assert_eq!(
            grid.get(10, 0).unwrap_err(),
            EngineError::OutOfBounds { row: 10, col: 0 }
        );
        assert!(grid.set_cell(0, 10, Cell::Hit).is_err());
    }

    #[test]
    fn transitions_only_move_forward() {
        assert_eq!(Cell::Empty.transition_to(Cell::Miss), Transition::Advance);
        assert_eq!(Cell::ShipPresent.transition_to(Cell::Hit), Transition::Advance);
        assert_eq!(Cell::Hit.transition_to(Cell::Sunk), Transition::Advance);
        assert_eq!(Cell::Hit.transition_to(Cell::Hit), Transition::Redundant);
        assert_eq!(Cell::Sunk.transition_to(Cell::Hit), Transition::Redundant);
        assert_eq!(Cell::Hit.transition_to(Cell::Empty), Transition::Rejected);
        assert_eq!(Cell::Miss.transition_to(Cell::Hit), Transition::Rejected);
        assert_eq!(Cell::ShipPresent.transition_to(Cell::Miss), Transition::Rejected);
    }

    #[test]
    fn public_view_hides_ships() {
        let grid = Grid::new(3).set_cell(1, 1, Cell::ShipPresent).unwrap();
        assert_eq!(grid.public_view().get(1, 1).unwrap(), Cell::Empty);
        assert_eq!(format!("{}", grid), "...\n.O.\n...\n");
    }
}
