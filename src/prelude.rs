//! Commonly used types and utilities for ease of import.

pub use crate::{
    BoardController, BoardSide, Cell, CellResolved, EngineConfig, EngineError, Fleet, GameStatus,
    Grid, Orientation, Outcome, ShipId, TurnPhase,
};

#[cfg(feature = "std")]
pub use crate::{GameSession, SessionEvent};

#[cfg(feature = "std")]
pub use crate::transport::{framed::FramedTransport, in_memory::InMemoryTransport, Transport};
