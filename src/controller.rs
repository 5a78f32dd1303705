//! The single mutator of both boards.
//!
//! `BoardController` accepts setup actions, local attack requests and the
//! authority's events, applies them to the grids, runs sunk detection,
//! drives the animation scheduler and exposes the synchronized turn.

use alloc::vec::Vec;
use core::time::Duration;
use log::{debug, info, warn};
use rand::Rng;

use crate::animation::{AnimationEffect, AnimationScheduler, CompletedEffect, EffectId, EffectKind};
use crate::common::{BoardSide, EngineError, Outcome};
use crate::config::EngineConfig;
use crate::grid::{Cell, Grid, Transition};
use crate::ship::{Fleet, Orientation, Ship, ShipId};
use crate::sunk::{find_ship_extent, is_fully_hit};
use crate::turn::{TurnDecision, TurnPhase, TurnSynchronizer};

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    /// Ships may be placed and rotated.
    Setup,
    /// Fleet submitted, waiting for the authority to start.
    AwaitingStart,
    InProgress,
    Won,
    Lost,
}

/// A single resolved shot as announced by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CellResolved {
    pub row: usize,
    pub col: usize,
    pub outcome: Outcome,
    /// Board the shot landed on, from the receiving player's view.
    pub target: BoardSide,
    /// Authority granted the shooter another shot.
    pub keep_turn: bool,
}

/// What applying a move result changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveReport {
    /// False when the event was a redelivery of a known state.
    pub changed: bool,
    pub effect: Option<EffectId>,
    /// Cells that turned `Sunk` because of this event.
    pub sunk: Option<Vec<(usize, usize)>>,
}

/// Output of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub completed: Vec<CompletedEffect>,
    /// Parked turn value applied this frame.
    pub released_turn: Option<bool>,
}

/// Read-only view handed to the presentation layer each frame.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub own: Grid,
    pub opponent: Grid,
    pub player_turn: bool,
    pub phase: TurnPhase,
    pub status: GameStatus,
    pub effects: Vec<(AnimationEffect, f32)>,
}

#[derive(Debug, Clone)]
pub struct BoardController {
    config: EngineConfig,
    own: Grid,
    opponent: Grid,
    fleet: Fleet,
    submitted: bool,
    status: GameStatus,
    opponent_connected: bool,
    scheduler: AnimationScheduler,
    turn: TurnSynchronizer,
    opponent_sunk: Vec<Vec<(usize, usize)>>,
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl BoardController {
    /// Controller for the standard fleet.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_fleet(config, Fleet::standard())
    }

    pub fn with_fleet(config: EngineConfig, fleet: Fleet) -> Self {
        Self {
            config,
            own: Grid::new(config.board_size),
            opponent: Grid::new(config.board_size),
            fleet,
            submitted: false,
            status: GameStatus::Setup,
            opponent_connected: true,
            scheduler: AnimationScheduler::from_config(&config),
            turn: TurnSynchronizer::new(),
            opponent_sunk: Vec::new(),
        }
    }

    /// Discard boards, ships, effects and any parked turn in one step.
    pub fn reset(&mut self) {
        let fresh = Fleet::from_sizes(
            &self.fleet.ships().iter().map(|s| s.size).collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| Fleet::standard());
        *self = Self::with_fleet(self.config, fresh);
    }

    // ---- setup phase ----

    fn ensure_setup(&self) -> Result<(), EngineError> {
        if self.submitted {
            return Err(EngineError::FleetSubmitted);
        }
        Ok(())
    }

    fn rebuild_own_grid(&mut self) -> Result<(), EngineError> {
        let mut grid = Grid::new(self.config.board_size);
        for ship in self.fleet.ships() {
            for (r, c) in ship.cells() {
                grid = grid.set_cell(r, c, Cell::ShipPresent)?;
            }
        }
        self.own = grid;
        Ok(())
    }

    pub fn place_ship(
        &mut self,
        id: ShipId,
        row: usize,
        col: usize,
        orientation: Orientation,
    ) -> Result<(), EngineError> {
        self.ensure_setup()?;
        self.fleet
            .place(id, row, col, orientation, self.config.board_size)?;
        self.rebuild_own_grid()
    }

    /// Flip a ship about its anchor. A rejected rotation leaves it as it was.
    pub fn rotate_ship(&mut self, id: ShipId) -> Result<Orientation, EngineError> {
        self.ensure_setup()?;
        let orientation = self.fleet.rotate(id, self.config.board_size)?;
        self.rebuild_own_grid()?;
        Ok(orientation)
    }

    pub fn remove_ship(&mut self, id: ShipId) -> Result<(), EngineError> {
        self.ensure_setup()?;
        self.fleet.remove(id)?;
        self.rebuild_own_grid()
    }

    /// Place every remaining ship at random.
    pub fn auto_place<R: Rng>(&mut self, rng: &mut R) -> Result<(), EngineError> {
        self.ensure_setup()?;
        self.fleet.place_randomly(rng, self.config.board_size)?;
        self.rebuild_own_grid()
    }

    /// Whether the ready action may be offered.
    pub fn is_fleet_ready(&self) -> bool {
        !self.submitted && self.fleet.is_fully_placed()
    }

    /// Freeze placement and return the ships to send to the authority.
    pub fn submit_fleet(&mut self) -> Result<Vec<Ship>, EngineError> {
        self.ensure_setup()?;
        if !self.fleet.is_fully_placed() {
            return Err(EngineError::FleetIncomplete);
        }
        self.submitted = true;
        self.status = GameStatus::AwaitingStart;
        info!("fleet of {} ships submitted", self.fleet.len());
        Ok(self.fleet.ships().to_vec())
    }

    // ---- lifecycle ----

    pub fn game_started(&mut self, player_first: bool) {
        info!("game started, player moves first: {}", player_first);
        self.submitted = true;
        self.status = GameStatus::InProgress;
        self.turn.start(player_first);
    }

    pub fn game_over(&mut self, player_won: bool) {
        info!("game over, player won: {}", player_won);
        self.status = if player_won {
            GameStatus::Won
        } else {
            GameStatus::Lost
        };
        self.turn.finish();
    }

    pub fn set_opponent_connected(&mut self, connected: bool) {
        self.opponent_connected = connected;
    }

    // ---- combat ----

    /// Validate a local attack on the opponent board and mark the shot in flight.
    pub fn request_attack(&mut self, row: usize, col: usize) -> Result<(), EngineError> {
        let cell = self.opponent.get(row, col)?;
        if self.scheduler.is_active(BoardSide::Opponent, row, col) {
            return Err(EngineError::AnimationInFlight { row, col });
        }
        if cell.is_resolved() {
            return Err(EngineError::CellAlreadyResolved { row, col });
        }
        if self.status != GameStatus::InProgress {
            return Err(EngineError::NotPlayerTurn);
        }
        self.turn.begin_own_shot(row, col)?;
        debug!("attack requested at ({}, {})", row, col);
        Ok(())
    }

    /// Drop the shot in flight after the authority refused it.
    pub fn cancel_attack(&mut self) {
        if let Some((row, col)) = self.turn.shot_in_flight() {
            debug!("attack at ({}, {}) cancelled", row, col);
        }
        self.turn.abort_own_shot();
    }

    /// Apply an authority move result arriving at `now`. Its effect starts
    /// at `now`, so it plays in full even after a stalled frame loop.
    /// Redeliveries are no-ops.
    pub fn apply_move_result(
        &mut self,
        event: CellResolved,
        now: Duration,
    ) -> Result<MoveReport, EngineError> {
        let CellResolved {
            row,
            col,
            outcome,
            target,
            keep_turn,
        } = event;
        let grid = match target {
            BoardSide::Own => &self.own,
            BoardSide::Opponent => &self.opponent,
        };
        let current = grid.get(row, col)?;
        let next = if outcome.is_hit() { Cell::Hit } else { Cell::Miss };

        match current.transition_to(next) {
            Transition::Redundant => {
                debug!("redelivered {:?} at {:?} ({}, {})", outcome, target, row, col);
                return Ok(MoveReport::default());
            }
            Transition::Rejected => {
                warn!(
                    "ignoring {:?} at {:?} ({}, {}): cell is {:?}",
                    outcome, target, row, col, current
                );
                return Err(EngineError::InvalidTransition {
                    row,
                    col,
                    from: current,
                    to: next,
                });
            }
            Transition::Advance => {}
        }

        let updated = grid.set_cell(row, col, next)?;
        self.store(target, updated);

        let kind = if outcome.is_hit() {
            EffectKind::Hit
        } else {
            EffectKind::Miss
        };
        let effect = self.scheduler.enqueue(target, row, col, kind, now).ok();

        let detect = match target {
            BoardSide::Own => outcome.is_hit(),
            // No ship cells are known on the opponent board, so a lone hit
            // would always look complete; trust the authority's verdict.
            BoardSide::Opponent => outcome == Outcome::Sunk,
        };
        let sunk = if detect { self.sink_if_complete(target, row, col)? } else { None };

        match target {
            BoardSide::Opponent => self.turn.own_shot_resolved(row, col, keep_turn && outcome.is_hit()),
            BoardSide::Own => self.turn.incoming_shot(),
        }

        debug!("applied {:?} at {:?} ({}, {})", outcome, target, row, col);
        Ok(MoveReport {
            changed: true,
            effect,
            sunk,
        })
    }

    fn store(&mut self, side: BoardSide, grid: Grid) {
        match side {
            BoardSide::Own => self.own = grid,
            BoardSide::Opponent => self.opponent = grid,
        }
    }

    fn sink_if_complete(
        &mut self,
        side: BoardSide,
        row: usize,
        col: usize,
    ) -> Result<Option<Vec<(usize, usize)>>, EngineError> {
        let mut grid = self.board(side).clone();
        let extent = find_ship_extent(&grid, row, col)?;
        if !is_fully_hit(&extent, &grid) {
            return Ok(None);
        }
        for &(r, c) in &extent {
            grid = grid.set_cell(r, c, Cell::Sunk)?;
        }
        self.store(side, grid);
        match side {
            BoardSide::Own => {
                let name = self
                    .fleet
                    .ship_at(row, col)
                    .and_then(|ship| self.fleet.name_of(ship.id))
                    .unwrap_or("ship");
                info!("our {} was sunk ({} cells)", name, extent.len());
            }
            BoardSide::Opponent => {
                info!("opponent ship of length {} sunk", extent.len());
                self.opponent_sunk.push(extent.clone());
            }
        }
        Ok(Some(extent))
    }

    /// Handle the authority's turn update.
    pub fn apply_turn_update(&mut self, player_turn: bool) -> TurnDecision {
        self.turn
            .on_turn_update(player_turn, self.scheduler.has_active_effects())
    }

    /// Advance effects to `now`, then release a parked turn if feedback settled.
    pub fn tick(&mut self, now: Duration) -> FrameReport {
        let completed = self.scheduler.tick(now);
        let released_turn = self.turn.release(self.scheduler.has_active_effects());
        FrameReport {
            completed,
            released_turn,
        }
    }

    // ---- read side ----

    pub fn board(&self, side: BoardSide) -> &Grid {
        match side {
            BoardSide::Own => &self.own,
            BoardSide::Opponent => &self.opponent,
        }
    }

    pub fn own_board(&self) -> &Grid {
        &self.own
    }

    pub fn opponent_board(&self) -> &Grid {
        &self.opponent
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_opponent_connected(&self) -> bool {
        self.opponent_connected
    }

    pub fn is_player_turn(&self) -> bool {
        self.turn.is_player_turn()
    }

    pub fn phase(&self) -> TurnPhase {
        self.turn.phase()
    }

    pub fn pending_turn(&self) -> Option<bool> {
        self.turn.pending()
    }

    pub fn has_active_effects(&self) -> bool {
        self.scheduler.has_active_effects()
    }

    /// Active effects with their progress at the last tick.
    pub fn active_effects(&self) -> Vec<(AnimationEffect, f32)> {
        self.scheduler.active().map(|(e, p)| (*e, p)).collect()
    }

    /// Placed ships of the local fleet with at least one cell not yet sunk.
    pub fn own_ships_remaining(&self) -> usize {
        self.fleet
            .ships()
            .iter()
            .filter(|s| s.is_placed())
            .filter(|s| {
                s.cells()
                    .iter()
                    .any(|&(r, c)| !matches!(self.own.get(r, c), Ok(Cell::Sunk)))
            })
            .count()
    }

    /// Opponent ships not yet seen sinking; assumes both fleets match.
    pub fn opponent_ships_remaining(&self) -> usize {
        self.fleet.len().saturating_sub(self.opponent_sunk.len())
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            own: self.own.clone(),
            opponent: self.opponent.clone(),
            player_turn: self.turn.is_player_turn(),
            phase: self.turn.phase(),
            status: self.status,
            effects: self.active_effects(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BOARD_SIZE;

    fn started_with_destroyer() -> BoardController {
        let mut ctl = BoardController::with_fleet(
            EngineConfig::default(),
            Fleet::from_sizes(&[2]).unwrap(),
        );
        ctl.place_ship(ShipId(0), 3, 4, Orientation::Horizontal).unwrap();
        ctl.submit_fleet().unwrap();
        ctl.game_started(false);
        ctl
    }

    fn incoming(row: usize, col: usize, outcome: Outcome) -> CellResolved {
        CellResolved {
            row,
            col,
            outcome,
            target: BoardSide::Own,
            keep_turn: false,
        }
    }

    #[test]
    fn placement_frozen_after_submit() {
        let mut ctl = started_with_destroyer();
        assert_eq!(
            ctl.place_ship(ShipId(0), 0, 0, Orientation::Vertical).unwrap_err(),
            EngineError::FleetSubmitted
        );
        assert_eq!(ctl.own_board().get(3, 4).unwrap(), Cell::ShipPresent);
    }

    #[test]
    fn destroyer_sinks_on_second_hit() {
        let mut ctl = started_with_destroyer();
        let first = ctl.apply_move_result(incoming(3, 4, Outcome::Hit), Duration::ZERO).unwrap();
        assert!(first.sunk.is_none());
        assert_eq!(ctl.own_board().get(3, 4).unwrap(), Cell::Hit);
        let second = ctl.apply_move_result(incoming(3, 5, Outcome::Sunk), Duration::ZERO).unwrap();
        assert_eq!(second.sunk, Some(vec![(3, 4), (3, 5)]));
        assert_eq!(ctl.own_board().get(3, 4).unwrap(), Cell::Sunk);
        assert_eq!(ctl.own_ships_remaining(), 0);
    }

    #[test]
    fn redelivered_hit_is_noop() {
        let mut ctl = started_with_destroyer();
        ctl.apply_move_result(incoming(3, 4, Outcome::Hit), Duration::ZERO).unwrap();
        let before = ctl.own_board().clone();
        let again = ctl.apply_move_result(incoming(3, 4, Outcome::Hit), Duration::ZERO).unwrap();
        assert!(!again.changed);
        assert_eq!(ctl.own_board(), &before);
        assert_eq!(ctl.active_effects().len(), 1);
    }

    #[test]
    fn backwards_transition_is_rejected() {
        let mut ctl = started_with_destroyer();
        ctl.apply_move_result(incoming(0, 0, Outcome::Miss), Duration::ZERO).unwrap();
        let err = ctl.apply_move_result(incoming(0, 0, Outcome::Hit), Duration::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(ctl.own_board().get(0, 0).unwrap(), Cell::Miss);
    }

    #[test]
    fn attack_checks_cell_and_animation() {
        let mut ctl = started_with_destroyer();
        ctl.apply_turn_update(true);
        ctl.request_attack(0, 0).unwrap();
        ctl.apply_move_result(CellResolved {
            row: 0,
            col: 0,
            outcome: Outcome::Miss,
            target: BoardSide::Opponent,
            keep_turn: false,
        }, Duration::ZERO)
        .unwrap();
        assert_eq!(
            ctl.request_attack(0, 0).unwrap_err(),
            EngineError::AnimationInFlight { row: 0, col: 0 }
        );
        ctl.tick(Duration::from_secs(5));
        assert_eq!(
            ctl.request_attack(0, 0).unwrap_err(),
            EngineError::CellAlreadyResolved { row: 0, col: 0 }
        );
        assert_eq!(
            ctl.request_attack(BOARD_SIZE, 0).unwrap_err(),
            EngineError::OutOfBounds { row: BOARD_SIZE, col: 0 }
        );
    }

    #[test]
    fn reset_discards_parked_turn() {
        let mut ctl = started_with_destroyer();
        ctl.apply_move_result(incoming(3, 4, Outcome::Hit), Duration::ZERO).unwrap();
        ctl.apply_turn_update(true);
        assert_eq!(ctl.pending_turn(), Some(true));
        ctl.reset();
        assert_eq!(ctl.pending_turn(), None);
        assert!(!ctl.has_active_effects());
        assert_eq!(ctl.status(), GameStatus::Setup);
        assert_eq!(ctl.fleet().len(), 1);
        assert!(!ctl.fleet().is_fully_placed());
        assert_eq!(ctl.own_board().count(Cell::Empty), BOARD_SIZE * BOARD_SIZE);
    }
}
