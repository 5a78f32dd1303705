#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod animation;
mod common;
mod config;
mod controller;
mod grid;
pub mod placement;
pub mod prelude;
pub mod protocol;
mod ship;
pub mod sunk;
mod turn;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use animation::*;
pub use common::*;
pub use config::*;
pub use controller::*;
pub use grid::*;
pub use protocol::Message;
pub use ship::*;
pub use turn::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use session::{GameSession, SessionEvent, SessionStats, SubscriptionToken};
