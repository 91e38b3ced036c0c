use super::state::SessionState;
use crate::location::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finalized snapshot of a stopped session
///
/// Owns its own copy of the path; later sessions never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikeSummary {
    /// Recorded fixes in arrival order
    pub path: Vec<Position>,

    /// Sum of great-circle distances between consecutive path points
    pub distance_meters: f64,

    /// Whole seconds between start and stop
    pub duration_seconds: u64,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl HikeSummary {
    /// True when no fix arrived during the session, i.e. no hike occurred
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Live view of the tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub state: SessionState,

    /// When the current (or last) session started
    pub started_at: Option<DateTime<Utc>>,

    pub elapsed_seconds: u64,

    pub distance_meters: f64,

    /// Number of path points recorded so far
    pub point_count: usize,

    /// Most recent recorded fix
    pub last_fix: Option<Position>,
}
