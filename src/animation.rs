//! Time-bounded hit/miss effects keyed by cell.
//!
//! The scheduler never reads a clock. Callers feed timestamps through
//! [`AnimationScheduler::tick`], so a render callback, a timer or a test can
//! drive it alike. Each cell holds at most one effect; an effect lives from
//! the timestamp it was enqueued at until the first tick at which its full
//! duration has elapsed, and is reported complete exactly once.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::time::Duration;
use log::{debug, warn};

use crate::common::{BoardSide, EngineError};
use crate::config::EngineConfig;

/// Handle for one enqueued effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u64);

/// Visual feedback kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Hit,
    Miss,
}

type CellKey = (BoardSide, usize, usize);

/// An effect currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationEffect {
    pub id: EffectId,
    pub side: BoardSide,
    pub row: usize,
    pub col: usize,
    pub kind: EffectKind,
    pub start: Duration,
    pub duration: Duration,
}

impl AnimationEffect {
    /// Fraction of the effect elapsed at `now`, clamped to `[0, 1]`.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.start) >= self.duration
    }
}

/// Effect reported by [`AnimationScheduler::tick`] when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedEffect {
    pub id: EffectId,
    pub side: BoardSide,
    pub row: usize,
    pub col: usize,
    pub kind: EffectKind,
}

/// Owns every active effect and expires them as time advances.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    hit_duration: Duration,
    miss_duration: Duration,
    clock: Duration,
    next_id: u64,
    active: BTreeMap<CellKey, AnimationEffect>,
}

impl AnimationScheduler {
    pub fn new(hit_duration: Duration, miss_duration: Duration) -> Self {
        Self {
            hit_duration,
            miss_duration,
            clock: Duration::ZERO,
            next_id: 0,
            active: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.hit_duration, config.miss_duration)
    }

    /// Timestamp of the most recent tick.
    pub fn now(&self) -> Duration {
        self.clock
    }

    /// Configured duration for `kind`.
    pub fn duration_of(&self, kind: EffectKind) -> Duration {
        match kind {
            EffectKind::Hit => self.hit_duration,
            EffectKind::Miss => self.miss_duration,
        }
    }

    /// Start an effect on a cell at `now`. Rejected while that cell is still
    /// animating. A `now` behind the last tick starts at the last tick.
    pub fn enqueue(
        &mut self,
        side: BoardSide,
        row: usize,
        col: usize,
        kind: EffectKind,
        now: Duration,
    ) -> Result<EffectId, EngineError> {
        let key = (side, row, col);
        if self.active.contains_key(&key) {
            warn!("dropping duplicate {:?} effect on {:?} ({}, {})", kind, side, row, col);
            return Err(EngineError::AlreadyActive { row, col });
        }
        let id = EffectId(self.next_id);
        self.next_id += 1;
        let effect = AnimationEffect {
            id,
            side,
            row,
            col,
            kind,
            start: now.max(self.clock),
            duration: self.duration_of(kind),
        };
        self.active.insert(key, effect);
        debug!("effect {:?} {:?} started on {:?} ({}, {})", id, kind, side, row, col);
        Ok(id)
    }

    /// Advance to `now` and remove every expired effect, oldest first.
    /// Timestamps earlier than the last tick are treated as the last tick.
    pub fn tick(&mut self, now: Duration) -> Vec<CompletedEffect> {
        if now > self.clock {
            self.clock = now;
        }
        let clock = self.clock;
        let mut done: Vec<AnimationEffect> = Vec::new();
        self.active.retain(|_, effect| {
            if effect.expired(clock) {
                done.push(*effect);
                false
            } else {
                true
            }
        });
        done.sort_by_key(|e| (e.start, e.id));
        done.into_iter()
            .map(|e| CompletedEffect {
                id: e.id,
                side: e.side,
                row: e.row,
                col: e.col,
                kind: e.kind,
            })
            .collect()
    }

    pub fn has_active_effects(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether a specific cell is animating.
    pub fn is_active(&self, side: BoardSide, row: usize, col: usize) -> bool {
        self.active.contains_key(&(side, row, col))
    }

    /// Active effects paired with their progress at the last tick.
    pub fn active(&self) -> impl Iterator<Item = (&AnimationEffect, f32)> + '_ {
        let now = self.clock;
        self.active.values().map(move |e| (e, e.progress(now)))
    }

    /// Drop every effect without reporting completions.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn effect_completes_once() {
        let mut s = AnimationScheduler::new(ms(900), ms(600));
        s.tick(ms(100));
        let id = s.enqueue(BoardSide::Opponent, 1, 1, EffectKind::Miss, ms(100)).unwrap();
        assert!(s.tick(ms(699)).is_empty());
        let done = s.tick(ms(700));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, id);
        assert!(s.tick(ms(2000)).is_empty());
        assert!(!s.has_active_effects());
    }

    #[test]
    fn second_effect_on_same_cell_is_rejected() {
        let mut s = AnimationScheduler::new(ms(900), ms(600));
        s.enqueue(BoardSide::Own, 4, 4, EffectKind::Hit, ms(0)).unwrap();
        assert_eq!(
            s.enqueue(BoardSide::Own, 4, 4, EffectKind::Hit, ms(0)).unwrap_err(),
            EngineError::AlreadyActive { row: 4, col: 4 }
        );
        // same coordinates on the other board are a different cell
        assert!(s.enqueue(BoardSide::Opponent, 4, 4, EffectKind::Hit, ms(0)).is_ok());
        assert_eq!(s.active_count(), 2);
    }

    #[test]
    fn progress_is_clamped() {
        let mut s = AnimationScheduler::new(ms(1000), ms(1000));
        s.enqueue(BoardSide::Own, 0, 0, EffectKind::Hit, ms(0)).unwrap();
        s.tick(ms(250));
        let (effect, progress) = s.active().next().unwrap();
        assert!((progress - 0.25).abs() < 1e-6);
        assert_eq!(effect.progress(ms(5000)), 1.0);
        assert_eq!(effect.progress(Duration::ZERO), 0.0);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut s = AnimationScheduler::new(ms(500), ms(500));
        s.tick(ms(1000));
        s.enqueue(BoardSide::Own, 2, 2, EffectKind::Hit, ms(10)).unwrap();
        assert!(s.tick(ms(10)).is_empty());
        assert_eq!(s.now(), ms(1000));
        assert_eq!(s.tick(ms(1500)).len(), 1);
    }

    #[test]
    fn effect_starts_when_enqueued_not_at_last_tick() {
        let mut s = AnimationScheduler::new(ms(900), ms(600));
        s.tick(ms(0));
        s.enqueue(BoardSide::Own, 5, 5, EffectKind::Miss, ms(5000)).unwrap();
        assert!(s.tick(ms(5000)).is_empty());
        assert!(s.tick(ms(5599)).is_empty());
        assert_eq!(s.tick(ms(5600)).len(), 1);
    }
}
