//! Plays two random clients against a scripted in-process authority and
//! prints a JSON summary. Every frame advances a synthetic clock, so runs
//! with the same seed are reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use battleship_sync::prelude::*;
use battleship_sync::{init_logging, Message, Ship};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value_t = 1, help = "RNG seed for fleets and targeting")]
    seed: u64,
    #[arg(long, default_value_t = 16, help = "Synthetic milliseconds per frame")]
    frame_ms: u64,
    #[arg(long, default_value_t = 200_000, help = "Abort after this many frames")]
    max_frames: u64,
}

/// Referee holding both fleets. Grants an extra shot on every hit.
struct Authority {
    links: [InMemoryTransport; 2],
    fleets: [Vec<Ship>; 2],
    hits: [Vec<(usize, usize)>; 2],
    shots: [Vec<(usize, usize)>; 2],
    turn: usize,
    started: bool,
    finished: bool,
}

impl Authority {
    fn new(links: [InMemoryTransport; 2]) -> Self {
        Self {
            links,
            fleets: [Vec::new(), Vec::new()],
            hits: [Vec::new(), Vec::new()],
            shots: [Vec::new(), Vec::new()],
            turn: 0,
            started: false,
            finished: false,
        }
    }

    async fn pump(&mut self) -> anyhow::Result<()> {
        for player in 0..2 {
            while let Some(msg) = self.links[player].try_recv()? {
                self.handle(player, msg).await?;
            }
        }
        Ok(())
    }

    async fn handle(&mut self, player: usize, msg: Message) -> anyhow::Result<()> {
        match msg {
            Message::SubmitShips { ships } => {
                self.fleets[player] = ships;
                if !self.started && self.fleets.iter().all(|f| !f.is_empty()) {
                    self.started = true;
                    for p in 0..2 {
                        self.links[p]
                            .send(Message::GameStarted { player_first: p == self.turn })
                            .await?;
                    }
                }
            }
            Message::MakeMove { row, col } => self.shoot(player, row, col).await?,
            other => log::warn!("authority ignoring {}", other.name()),
        }
        Ok(())
    }

    async fn shoot(&mut self, shooter: usize, row: usize, col: usize) -> anyhow::Result<()> {
        let target = 1 - shooter;
        if self.finished || shooter != self.turn || self.shots[shooter].contains(&(row, col)) {
            return self.links[shooter]
                .send(Message::Rejected {
                    reason: format!("shot at ({}, {}) refused", row, col),
                })
                .await;
        }
        self.shots[shooter].push((row, col));

        let struck = self.fleets[target]
            .iter()
            .find(|s| s.cells().contains(&(row, col)))
            .copied();
        let outcome = match struck {
            Some(ship) => {
                self.hits[target].push((row, col));
                if ship.cells().iter().all(|c| self.hits[target].contains(c)) {
                    Outcome::Sunk
                } else {
                    Outcome::Hit
                }
            }
            None => Outcome::Miss,
        };
        let keep_turn = outcome.is_hit();
        if !keep_turn {
            self.turn = target;
        }

        for (p, side) in [(shooter, BoardSide::Opponent), (target, BoardSide::Own)] {
            self.links[p]
                .send(Message::MoveResult(CellResolved {
                    row,
                    col,
                    outcome,
                    target: side,
                    keep_turn,
                }))
                .await?;
            self.links[p]
                .send(Message::TurnUpdate { player_turn: p == self.turn })
                .await?;
        }

        let cells: usize = self.fleets[target].iter().map(|s| s.size).sum();
        if self.hits[target].len() == cells {
            self.finished = true;
            for p in 0..2 {
                self.links[p]
                    .send(Message::GameOver { player_won: p == shooter })
                    .await?;
            }
        }
        Ok(())
    }
}

fn pick_target(rng: &mut SmallRng, grid: &Grid) -> Option<(usize, usize)> {
    let open: Vec<(usize, usize)> = grid
        .iter()
        .filter(|&(_, _, cell)| cell == Cell::Empty)
        .map(|(r, c, _)| (r, c))
        .collect();
    if open.is_empty() {
        None
    } else {
        Some(open[rng.random_range(0..open.len())])
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    let (c1, a1) = InMemoryTransport::pair();
    let (c2, a2) = InMemoryTransport::pair();
    let mut authority = Authority::new([a1, a2]);
    let mut players = [GameSession::new(c1, config), GameSession::new(c2, config)];
    let mut rngs = [
        SmallRng::seed_from_u64(cli.seed),
        SmallRng::seed_from_u64(cli.seed.wrapping_add(1)),
    ];

    let sunk = Arc::new(AtomicU64::new(0));
    for session in players.iter_mut() {
        let sunk = Arc::clone(&sunk);
        session.subscribe(move |event| {
            if let SessionEvent::ShipSunk { side: BoardSide::Opponent, .. } = event {
                sunk.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    for (session, rng) in players.iter_mut().zip(rngs.iter_mut()) {
        session
            .controller_mut()
            .auto_place(rng)
            .map_err(|e| anyhow::anyhow!(e))?;
        session.submit_fleet().await?;
    }

    let step = Duration::from_millis(cli.frame_ms);
    let mut now = Duration::ZERO;
    let mut frames = 0u64;
    while frames < cli.max_frames {
        authority.pump().await?;
        for (session, rng) in players.iter_mut().zip(rngs.iter_mut()) {
            session.poll_transport()?;
            session.frame(now);
            let ctl = session.controller();
            if ctl.status() == GameStatus::InProgress && ctl.phase() == TurnPhase::PlayerTurn {
                if let Some((r, c)) = pick_target(rng, ctl.opponent_board()) {
                    session.attack(r, c).await?;
                }
            }
        }
        if players
            .iter()
            .all(|s| matches!(s.controller().status(), GameStatus::Won | GameStatus::Lost))
        {
            break;
        }
        now += step;
        frames += 1;
    }

    let status: Vec<GameStatus> = players.iter().map(|s| s.controller().status()).collect();
    let winner = match (status[0], status[1]) {
        (GameStatus::Won, GameStatus::Lost) => Some("player1"),
        (GameStatus::Lost, GameStatus::Won) => Some("player2"),
        _ => None,
    };
    let summary = |s: &GameSession<InMemoryTransport>| {
        let stats = s.stats();
        json!({
            "status": format!("{:?}", s.controller().status()),
            "shots": stats.shots,
            "deferred_turns": stats.deferred_turns,
            "released_turns": stats.released_turns,
            "ships_left": s.controller().own_ships_remaining(),
        })
    };
    let result = json!({
        "frames": frames,
        "ships_sunk": sunk.load(Ordering::Relaxed),
        "player1": summary(&players[0]),
        "player2": summary(&players[1]),
        "winner": winner,
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
