//! Ship definitions and the setup-phase fleet.

use alloc::vec::Vec;

use crate::common::EngineError;
use crate::config::SHIPS;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other orientation.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipDef {
    name: &'static str,
    length: usize,
}

impl ShipDef {
    /// Create a new ship definition.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Stable identity of a ship within its fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipId(pub usize);

/// A ship that may or may not be anchored on the board yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    pub id: ShipId,
    pub size: usize,
    pub orientation: Orientation,
    pub anchor: Option<(usize, usize)>,
}

impl Ship {
    /// An unplaced ship.
    pub fn new(id: ShipId, size: usize, orientation: Orientation) -> Self {
        Ship {
            id,
            size,
            orientation,
            anchor: None,
        }
    }

    /// Whether the ship currently sits on the board.
    pub fn is_placed(&self) -> bool {
        self.anchor.is_some()
    }

    /// Cells covered by this ship, empty while unplaced.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        match self.anchor {
            Some((row, col)) => {
                span_cells(self.size, row, col, self.orientation).unwrap_or_default()
            }
            None => Vec::new(),
        }
    }
}

/// Cells of a straight run of `size` cells starting at `(row, col)`, or
/// `None` when the run does not fit in `usize` coordinates.
pub(crate) fn span_cells(
    size: usize,
    row: usize,
    col: usize,
    orientation: Orientation,
) -> Option<Vec<(usize, usize)>> {
    (0..size)
        .map(|i| match orientation {
            Orientation::Horizontal => col.checked_add(i).map(|c| (row, c)),
            Orientation::Vertical => row.checked_add(i).map(|r| (r, col)),
        })
        .collect()
}

/// One player's ships during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    /// Fleet built from explicit sizes; ids follow the given order.
    pub fn from_sizes(sizes: &[usize]) -> Result<Self, EngineError> {
        let ships = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                if size == 0 {
                    Err(EngineError::InvalidShipSize(size))
                } else {
                    Ok(Ship::new(ShipId(i), size, Orientation::Horizontal))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fleet { ships })
    }

    /// The five unplaced ships of the standard configuration.
    pub fn standard() -> Self {
        Fleet {
            ships: SHIPS
                .iter()
                .enumerate()
                .map(|(i, def)| Ship::new(ShipId(i), def.length(), Orientation::Horizontal))
                .collect(),
        }
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn get(&self, id: ShipId) -> Result<&Ship, EngineError> {
        self.ships
            .iter()
            .find(|s| s.id == id)
            .ok_or(EngineError::UnknownShip(id))
    }

    pub(crate) fn get_mut(&mut self, id: ShipId) -> Result<&mut Ship, EngineError> {
        self.ships
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(EngineError::UnknownShip(id))
    }

    /// Every ship except `id`.
    pub fn others(&self, id: ShipId) -> impl Iterator<Item = &Ship> {
        self.ships.iter().filter(move |s| s.id != id)
    }

    /// Class name of `id` when it matches the standard fleet entry.
    pub fn name_of(&self, id: ShipId) -> Option<&'static str> {
        let ship = self.get(id).ok()?;
        SHIPS
            .get(id.0)
            .filter(|def| def.length() == ship.size)
            .map(ShipDef::name)
    }

    /// Ship covering `(row, col)`, if any.
    pub fn ship_at(&self, row: usize, col: usize) -> Option<&Ship> {
        self.ships.iter().find(|s| s.cells().contains(&(row, col)))
    }

    /// Whether every ship has an anchor; gates the ready action.
    pub fn is_fully_placed(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_placed)
    }

    /// Lift a ship off the board.
    pub fn remove(&mut self, id: ShipId) -> Result<(), EngineError> {
        self.get_mut(id)?.anchor = None;
        Ok(())
    }
}
