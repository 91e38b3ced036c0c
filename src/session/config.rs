use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum movement between reported samples
pub const MIN_DISTANCE_METERS: f64 = 5.0;

/// Period of the elapsed-time refresh while tracking
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for a hike tracking session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum distance in meters between consecutive position samples
    /// Default: 5 meters
    pub min_distance_meters: f64,

    /// How often the elapsed duration is recomputed
    /// Default: 1 second
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_distance_meters: MIN_DISTANCE_METERS,
            tick_interval: TICK_INTERVAL,
        }
    }
}
