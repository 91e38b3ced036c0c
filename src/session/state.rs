use super::stats::{HikeSummary, SessionStats};
use crate::geofence::haversine_meters;
use crate::location::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Tracking,
}

/// Hike session state machine: `Idle -> start -> Tracking -> stop -> Idle`
///
/// Holds no tasks or subscriptions; `HikeTracker` drives it from the
/// position stream and the tick. Elapsed time is always derived from the
/// monotonic start instant, never accumulated from ticks.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    path: Vec<Position>,
    distance_meters: f64,
    started_at: Option<DateTime<Utc>>,
    started_instant: Option<Instant>,
    elapsed_seconds: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    /// Reset the accumulators and begin tracking.
    ///
    /// Returns false (and changes nothing) if already tracking.
    pub fn start(&mut self, started_at: DateTime<Utc>, now: Instant) -> bool {
        if self.is_tracking() {
            return false;
        }

        self.state = SessionState::Tracking;
        self.path.clear();
        self.distance_meters = 0.0;
        self.started_at = Some(started_at);
        self.started_instant = Some(now);
        self.elapsed_seconds = 0;
        true
    }

    /// Append a fix and add the leg from the previous fix to the total.
    ///
    /// Returns false if the session is not tracking; the fix is ignored.
    pub fn record_position(&mut self, position: Position) -> bool {
        if !self.is_tracking() {
            return false;
        }

        if let Some(last) = self.path.last() {
            self.distance_meters += haversine_meters(last, &position);
        }
        self.path.push(position);
        true
    }

    /// Recompute elapsed whole seconds from the start instant
    pub fn refresh_elapsed(&mut self, now: Instant) -> u64 {
        match self.started_instant {
            Some(started) if self.is_tracking() => {
                self.elapsed_seconds = now.saturating_duration_since(started).as_secs();
            }
            _ => {}
        }
        self.elapsed_seconds
    }

    /// Freeze the path and return to Idle.
    ///
    /// Returns `None` if the session was not tracking.
    pub fn stop(&mut self, ended_at: DateTime<Utc>, now: Instant) -> Option<HikeSummary> {
        if !self.is_tracking() {
            return None;
        }

        let duration_seconds = self.refresh_elapsed(now);
        self.state = SessionState::Idle;

        Some(HikeSummary {
            path: self.path.clone(),
            distance_meters: self.distance_meters,
            duration_seconds,
            start_time: self.started_at.unwrap_or(ended_at),
            end_time: ended_at,
        })
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state,
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds,
            distance_meters: self.distance_meters,
            point_count: self.path.len(),
            last_fix: self.path.last().copied(),
        }
    }
}
