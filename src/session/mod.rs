//! Hike session tracking
//!
//! This module provides:
//! - `Session`: the Idle/Tracking state machine and its accumulators
//! - `HikeTracker`: drives a session from a position stream and a 1s tick
//! - `HikeSummary`: the finalized snapshot returned at stop

mod config;
mod state;
mod stats;
mod tracker;

pub use config::{SessionConfig, MIN_DISTANCE_METERS, TICK_INTERVAL};
pub use state::{Session, SessionState};
pub use stats::{HikeSummary, SessionStats};
pub use tracker::HikeTracker;
