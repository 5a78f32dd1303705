//! Gates the visible turn against in-flight shot feedback.
//!
//! Turn updates from the authority may outrun the hit/miss effect of the
//! shot that caused them. While anything is animating (or the player's own
//! shot still awaits its result) an incoming turn value is parked in a single
//! slot; later updates overwrite it. The slot is released on the first frame
//! in which nothing is animating.
//!
//! A resolved shot without an extra turn spends the player's turn: once its
//! effect is over the gate waits for the authority instead of reopening.

use log::debug;

use crate::common::EngineError;

/// Coarse state of the turn gate, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    WaitingForOpponent,
    PlayerTurn,
    AnimatingOwnShot,
    AnimatingIncomingShot,
}

/// What happened to a turn update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// Visible turn now equals the carried value.
    Applied(bool),
    /// Value parked until feedback settles.
    Deferred(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSynchronizer {
    player_turn: bool,
    phase: TurnPhase,
    pending: Option<bool>,
    shot_in_flight: Option<(usize, usize)>,
    turn_spent: bool,
}

impl Default for TurnSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSynchronizer {
    pub fn new() -> Self {
        Self {
            player_turn: false,
            phase: TurnPhase::WaitingForOpponent,
            pending: None,
            shot_in_flight: None,
            turn_spent: false,
        }
    }

    /// Resolved turn value shown to the player.
    pub fn is_player_turn(&self) -> bool {
        self.player_turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Parked turn value, if any.
    pub fn pending(&self) -> Option<bool> {
        self.pending
    }

    /// Target of the player's shot that has no result yet.
    pub fn shot_in_flight(&self) -> Option<(usize, usize)> {
        self.shot_in_flight
    }

    /// Whether a new attack may be issued.
    pub fn can_attack(&self) -> bool {
        self.phase == TurnPhase::PlayerTurn
    }

    fn gated(&self, animating: bool) -> bool {
        animating || self.shot_in_flight.is_some()
    }

    fn apply(&mut self, player_turn: bool) {
        self.turn_spent = false;
        self.player_turn = player_turn;
        self.phase = if player_turn {
            TurnPhase::PlayerTurn
        } else {
            TurnPhase::WaitingForOpponent
        };
    }

    /// Reset and seed the turn for a fresh game.
    pub fn start(&mut self, player_first: bool) {
        *self = Self::new();
        self.apply(player_first);
    }

    /// The player fired at `(row, col)`.
    pub fn begin_own_shot(&mut self, row: usize, col: usize) -> Result<(), EngineError> {
        if !self.can_attack() {
            return Err(EngineError::NotPlayerTurn);
        }
        self.shot_in_flight = Some((row, col));
        self.phase = TurnPhase::AnimatingOwnShot;
        Ok(())
    }

    /// The authority answered a shot at `(row, col)` on the opponent board.
    pub fn own_shot_resolved(&mut self, row: usize, col: usize, keep_turn: bool) {
        if self.shot_in_flight == Some((row, col)) {
            self.shot_in_flight = None;
        }
        if keep_turn {
            self.grant_extra_turn();
        } else {
            self.turn_spent = true;
        }
    }

    /// The authority refused the player's shot; nothing will resolve it.
    pub fn abort_own_shot(&mut self) {
        if self.shot_in_flight.take().is_some() && self.phase == TurnPhase::AnimatingOwnShot {
            self.apply(self.player_turn);
        }
    }

    /// Hand the turn back to the player at once, discarding any parked value.
    pub fn grant_extra_turn(&mut self) {
        if let Some(stale) = self.pending.take() {
            debug!("extra turn supersedes parked turn update ({})", stale);
        }
        self.apply(true);
    }

    /// The opponent's shot is animating on the player's board.
    pub fn incoming_shot(&mut self) {
        if self.phase != TurnPhase::AnimatingOwnShot {
            self.phase = TurnPhase::AnimatingIncomingShot;
        }
    }

    /// Handle a turn update. `animating` is the scheduler's gating predicate.
    pub fn on_turn_update(&mut self, player_turn: bool, animating: bool) -> TurnDecision {
        if self.gated(animating) {
            debug!("deferring turn update ({})", player_turn);
            self.pending = Some(player_turn);
            TurnDecision::Deferred(player_turn)
        } else {
            self.pending = None;
            self.apply(player_turn);
            TurnDecision::Applied(player_turn)
        }
    }

    /// Called once per frame after the scheduler's completions are drained.
    /// Returns the released value when a parked turn is applied.
    pub fn release(&mut self, animating: bool) -> Option<bool> {
        if self.gated(animating) {
            return None;
        }
        match self.pending.take() {
            Some(value) => {
                debug!("releasing parked turn update ({})", value);
                self.apply(value);
                Some(value)
            }
            None => {
                if self.turn_spent {
                    self.phase = TurnPhase::WaitingForOpponent;
                } else if matches!(
                    self.phase,
                    TurnPhase::AnimatingOwnShot | TurnPhase::AnimatingIncomingShot
                ) {
                    self.apply(self.player_turn);
                }
                None
            }
        }
    }

    /// Freeze at game end: nothing parked, nobody to move.
    pub fn finish(&mut self) {
        *self = Self::new();
    }
}
