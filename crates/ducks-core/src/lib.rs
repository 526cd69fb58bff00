//! Ducks Core - Core types and utilities shared by the Ducks crates
//!
//! This crate provides the foundational types used throughout the game:
//! - Process-unique identifiers for playback units
//! - Clock abstraction so schedulers can run on wall time or simulated time

pub mod time;
pub mod types;

pub use time::{Clock, ManualClock, SystemClock};
pub use types::{IdAllocator, UnitId};
