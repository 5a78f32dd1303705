//! Named events exchanged with the game authority.

use alloc::string::String;
use alloc::vec::Vec;

use crate::controller::CellResolved;
use crate::ship::Ship;

/// Events carried by the transport. Each variant maps to one named event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    /// Client hands its placed fleet to the authority.
    SubmitShips { ships: Vec<Ship> },
    /// Client fires at the opponent board.
    MakeMove { row: usize, col: usize },
    /// Authority reports a resolved cell.
    MoveResult(CellResolved),
    /// Authority says whose turn it is.
    TurnUpdate { player_turn: bool },
    GameStarted { player_first: bool },
    GameOver { player_won: bool },
    OpponentDisconnected,
    OpponentReconnected,
    /// Authority refused a client action.
    Rejected { reason: String },
}

impl Message {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Message::SubmitShips { .. } => "submit_ships",
            Message::MakeMove { .. } => "make_move",
            Message::MoveResult(_) => "move_result",
            Message::TurnUpdate { .. } => "turn_update",
            Message::GameStarted { .. } => "game_started",
            Message::GameOver { .. } => "game_over",
            Message::OpponentDisconnected => "opponent_disconnected",
            Message::OpponentReconnected => "opponent_reconnected",
            Message::Rejected { .. } => "rejected",
        }
    }
}
