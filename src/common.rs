//! Common types for the board engine: errors and shot outcomes.

use crate::grid::Cell;
use crate::ship::ShipId;

/// Outcome of a shot as adjudicated by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// Shot struck a ship segment.
    Hit,
    /// Shot landed in open water.
    Miss,
    /// Shot struck the last intact segment of a ship.
    Sunk,
}

impl Outcome {
    /// Whether the shot struck a ship.
    pub fn is_hit(self) -> bool {
        !matches!(self, Outcome::Miss)
    }
}

/// Which of the two boards a cell belongs to, from the local player's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardSide {
    /// The local player's board, ship positions visible.
    Own,
    /// The opponent's board, only revealed states.
    Opponent,
}

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Row or column lies outside the grid.
    OutOfBounds { row: usize, col: usize },
    /// Ship sizes must be at least one cell.
    InvalidShipSize(usize),
    /// Placement leaves the grid or overlaps another ship.
    InvalidPlacement,
    /// Rotation would leave the grid or overlap another ship.
    InvalidRotation,
    /// Target cell already carries a revealed state.
    CellAlreadyResolved { row: usize, col: usize },
    /// An effect is still playing on the target cell.
    AnimationInFlight { row: usize, col: usize },
    /// Effect already active on this cell.
    AlreadyActive { row: usize, col: usize },
    /// Attack attempted while it is not the player's turn.
    NotPlayerTurn,
    /// Fleet is frozen after submission.
    FleetSubmitted,
    /// Fleet submitted with unplaced ships.
    FleetIncomplete,
    /// Ship id does not exist in the fleet.
    UnknownShip(ShipId),
    /// Cell state would move backwards.
    InvalidTransition {
        row: usize,
        col: usize,
        from: Cell,
        to: Cell,
    },
}

impl EngineError {
    /// Rejections the presentation layer drops without surfacing: user-input
    /// races and duplicates the remote authority already settles.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidPlacement
                | EngineError::InvalidRotation
                | EngineError::CellAlreadyResolved { .. }
                | EngineError::AnimationInFlight { .. }
                | EngineError::AlreadyActive { .. }
        )
    }
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::OutOfBounds { row, col } => {
                write!(f, "Cell ({}, {}) is out of bounds", row, col)
            }
            EngineError::InvalidShipSize(size) => write!(f, "Invalid ship size: {}", size),
            EngineError::InvalidPlacement => write!(f, "Ship placement is not valid"),
            EngineError::InvalidRotation => write!(f, "Ship rotation is not valid"),
            EngineError::CellAlreadyResolved { row, col } => {
                write!(f, "Cell ({}, {}) is already resolved", row, col)
            }
            EngineError::AnimationInFlight { row, col } => {
                write!(f, "Cell ({}, {}) is still animating", row, col)
            }
            EngineError::AlreadyActive { row, col } => {
                write!(f, "Effect already active on cell ({}, {})", row, col)
            }
            EngineError::NotPlayerTurn => write!(f, "It is not the player's turn"),
            EngineError::FleetSubmitted => write!(f, "Fleet has already been submitted"),
            EngineError::FleetIncomplete => write!(f, "Fleet is not fully placed"),
            EngineError::UnknownShip(id) => write!(f, "Unknown ship id {}", id.0),
            EngineError::InvalidTransition { row, col, from, to } => write!(
                f,
                "Cell ({}, {}) cannot move from {:?} to {:?}",
                row, col, from, to
            ),
        }
    }
}
