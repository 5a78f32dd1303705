use core::time::Duration;

use crate::ship::ShipDef;

pub const BOARD_SIZE: usize = 10;
/// The standard fleet, in ship id order.
pub const SHIPS: [ShipDef; 5] = [
    ShipDef::new("Carrier", 5),
    ShipDef::new("Battleship", 4),
    ShipDef::new("Cruiser", 3),
    ShipDef::new("Submarine", 3),
    ShipDef::new("Destroyer", 2),
];

/// Total number of ship segments used in the standard configuration.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Default length of the splash shown when a shot lands on a ship.
pub const HIT_EFFECT_MS: u64 = 900;
/// Default length of the splash shown when a shot lands in open water.
pub const MISS_EFFECT_MS: u64 = 600;

/// Tunables for a single engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub board_size: usize,
    pub hit_duration: Duration,
    pub miss_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            hit_duration: Duration::from_millis(HIT_EFFECT_MS),
            miss_duration: Duration::from_millis(MISS_EFFECT_MS),
        }
    }
}

#[cfg(feature = "std")]
impl EngineConfig {
    /// Build a config from `BATTLESHIP_HIT_MS` and `BATTLESHIP_MISS_MS`.
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        fn millis(var: &str) -> Option<Duration> {
            std::env::var(var)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        }

        let defaults = Self::default();
        Self {
            board_size: defaults.board_size,
            hit_duration: millis("BATTLESHIP_HIT_MS").unwrap_or(defaults.hit_duration),
            miss_duration: millis("BATTLESHIP_MISS_MS").unwrap_or(defaults.miss_duration),
        }
    }
}

