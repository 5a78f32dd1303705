//! One client's game session: the board controller plus its transport.
//!
//! Inbound events are queued as they arrive and applied at the start of the
//! next frame, stamped with that frame's time. A frame runs in a fixed order:
//! queued events, effect ticking, then release of a parked turn. Listeners registered with
//! [`GameSession::subscribe`] see every resulting [`SessionEvent`].

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, warn};

use crate::animation::CompletedEffect;
use crate::common::BoardSide;
use crate::config::EngineConfig;
use crate::controller::{BoardController, BoardSnapshot, CellResolved, FrameReport};
use crate::protocol::Message;
use crate::transport::Transport;
use crate::turn::TurnDecision;

/// Something the presentation layer may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GameStarted { player_first: bool },
    CellResolved(CellResolved),
    ShipSunk { side: BoardSide, cells: Vec<(usize, usize)> },
    EffectCompleted(CompletedEffect),
    /// Visible turn now has this value.
    TurnChanged(bool),
    /// Turn update parked behind running effects.
    TurnDeferred(bool),
    GameOver { player_won: bool },
    OpponentConnection(bool),
    Rejected(String),
}

/// Returned by [`GameSession::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Listener = Box<dyn FnMut(&SessionEvent) + Send>;

/// Counters kept for the lifetime of one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub shots: u64,
    pub deferred_turns: u64,
    pub released_turns: u64,
    pub dropped_events: u64,
}

pub struct GameSession<T: Transport> {
    transport: T,
    controller: BoardController,
    inbox: VecDeque<Message>,
    listeners: Vec<(SubscriptionToken, Listener)>,
    next_token: u64,
    stats: SessionStats,
}

impl<T: Transport> GameSession<T> {
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self::with_controller(transport, BoardController::new(config))
    }

    pub fn with_controller(transport: T, controller: BoardController) -> Self {
        Self {
            transport,
            controller,
            inbox: VecDeque::new(),
            listeners: Vec::new(),
            next_token: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn controller(&self) -> &BoardController {
        &self.controller
    }

    /// Mutable access for setup actions (place, rotate, auto-place).
    pub fn controller_mut(&mut self) -> &mut BoardController {
        &mut self.controller
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.controller.snapshot()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Number of inbound events waiting for the next frame.
    pub fn queued(&self) -> usize {
        self.inbox.len()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionToken
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.listeners.push((token, Box::new(listener)));
        token
    }

    /// Remove a listener. Returns false for an unknown or already used token.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(t, _)| *t != token);
        self.listeners.len() != before
    }

    /// Queue an inbound message for the next frame.
    pub fn push_inbound(&mut self, msg: Message) {
        self.inbox.push_back(msg);
    }

    /// Wait for one message from the transport and queue it.
    pub async fn receive(&mut self) -> anyhow::Result<()> {
        let msg = self.transport.recv().await?;
        debug!("received {}", msg.name());
        self.inbox.push_back(msg);
        Ok(())
    }

    /// Queue every message the transport already holds.
    pub fn poll_transport(&mut self) -> anyhow::Result<usize> {
        let mut count = 0;
        while let Some(msg) = self.transport.try_recv()? {
            self.inbox.push_back(msg);
            count += 1;
        }
        Ok(count)
    }

    /// Freeze the fleet and send it to the authority.
    pub async fn submit_fleet(&mut self) -> anyhow::Result<()> {
        let ships = self
            .controller
            .submit_fleet()
            .map_err(|e| anyhow::anyhow!(e))?;
        self.transport.send(Message::SubmitShips { ships }).await
    }

    /// Fire at the opponent board. Returns `false` when the request was a
    /// duplicate or race that is dropped silently.
    pub async fn attack(&mut self, row: usize, col: usize) -> anyhow::Result<bool> {
        match self.controller.request_attack(row, col) {
            Ok(()) => {
                self.transport.send(Message::MakeMove { row, col }).await?;
                self.stats.shots += 1;
                Ok(true)
            }
            Err(e) if e.is_silent() => {
                debug!("dropping attack at ({}, {}): {}", row, col, e);
                Ok(false)
            }
            Err(e) => Err(anyhow::anyhow!(e)),
        }
    }

    /// Run one frame at timestamp `now`.
    pub fn frame(&mut self, now: Duration) -> FrameReport {
        let mut events = Vec::new();
        while let Some(msg) = self.inbox.pop_front() {
            self.apply(msg, now, &mut events);
        }

        let report = self.controller.tick(now);
        events.extend(report.completed.iter().copied().map(SessionEvent::EffectCompleted));
        if let Some(turn) = report.released_turn {
            self.stats.released_turns += 1;
            events.push(SessionEvent::TurnChanged(turn));
        }
        self.stats.frames += 1;
        self.notify(&events);
        report
    }

    fn apply(&mut self, msg: Message, now: Duration, events: &mut Vec<SessionEvent>) {
        match msg {
            Message::MoveResult(resolved) => match self.controller.apply_move_result(resolved, now) {
                Ok(report) if report.changed => {
                    events.push(SessionEvent::CellResolved(resolved));
                    if let Some(cells) = report.sunk {
                        events.push(SessionEvent::ShipSunk {
                            side: resolved.target,
                            cells,
                        });
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("dropping move result: {}", e);
                    self.stats.dropped_events += 1;
                }
            },
            Message::TurnUpdate { player_turn } => match self.controller.apply_turn_update(player_turn) {
                TurnDecision::Applied(turn) => events.push(SessionEvent::TurnChanged(turn)),
                TurnDecision::Deferred(turn) => {
                    self.stats.deferred_turns += 1;
                    events.push(SessionEvent::TurnDeferred(turn));
                }
            },
            Message::GameStarted { player_first } => {
                self.controller.game_started(player_first);
                events.push(SessionEvent::GameStarted { player_first });
                events.push(SessionEvent::TurnChanged(player_first));
            }
            Message::GameOver { player_won } => {
                self.controller.game_over(player_won);
                events.push(SessionEvent::GameOver { player_won });
            }
            Message::OpponentDisconnected => {
                self.controller.set_opponent_connected(false);
                events.push(SessionEvent::OpponentConnection(false));
            }
            Message::OpponentReconnected => {
                self.controller.set_opponent_connected(true);
                events.push(SessionEvent::OpponentConnection(true));
            }
            Message::Rejected { reason } => {
                warn!("authority rejected action: {}", reason);
                self.controller.cancel_attack();
                events.push(SessionEvent::Rejected(reason));
            }
            other => {
                warn!("unexpected inbound {}", other.name());
                self.stats.dropped_events += 1;
            }
        }
    }

    fn notify(&mut self, events: &[SessionEvent]) {
        for event in events {
            for (_, listener) in self.listeners.iter_mut() {
                listener(event);
            }
        }
    }

    /// Leave the game: boards, ships, effects, the parked turn and any queued
    /// events are discarded together. Listeners stay registered.
    pub fn leave(&mut self) {
        self.controller.reset();
        self.inbox.clear();
        self.stats = SessionStats::default();
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
