//! Geofence evaluation
//!
//! Pure functions over an explicitly passed position: no latest-fix state is
//! read from anywhere. A caller without a fix gets `None` distances rather
//! than a synthetic zero.

use crate::location::Position;
use geo::{geometry::Point, Distance as _, Haversine};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Acceptance radius for both targets.
///
/// The physical marker tolerance is ~0.91m (3 feet); 5m is used because raw
/// GPS accuracy is worse than that.
pub const GEOFENCE_RADIUS_METERS: f64 = 5.0;

/// Tumamoc Hill trailhead
pub const START: GeofenceTarget =
    GeofenceTarget::new(TargetKind::Start, 32.2259035, -111.001116, GEOFENCE_RADIUS_METERS);

/// Tumamoc Hill summit
pub const SUMMIT: GeofenceTarget =
    GeofenceTarget::new(TargetKind::Summit, 32.214089, -111.0054714, GEOFENCE_RADIUS_METERS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Start,
    Summit,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Start => f.write_str("start"),
            TargetKind::Summit => f.write_str("summit"),
        }
    }
}

/// A circular boundary around a fixed reference point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceTarget {
    pub kind: TargetKind,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

impl GeofenceTarget {
    pub const fn new(kind: TargetKind, latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Self {
            kind,
            latitude,
            longitude,
            radius_meters,
        }
    }

    /// Great-circle distance from `current` to the reference point, ignoring altitude
    pub fn distance_meters(&self, current: &Position) -> f64 {
        Haversine.distance(
            Point::new(current.longitude, current.latitude),
            Point::new(self.longitude, self.latitude),
        )
    }

    /// Inclusive: a fix exactly on the boundary is inside
    pub fn is_within(&self, current: &Position) -> bool {
        self.distance_meters(current) <= self.radius_meters
    }
}

/// Great-circle distance between two fixes in meters
pub fn haversine_meters(a: &Position, b: &Position) -> f64 {
    Haversine.distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

/// The pair of targets a hike runs between
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    pub start: GeofenceTarget,
    pub summit: GeofenceTarget,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            start: START,
            summit: SUMMIT,
        }
    }
}

impl GeofenceConfig {
    pub fn target(&self, kind: TargetKind) -> &GeofenceTarget {
        match kind {
            TargetKind::Start => &self.start,
            TargetKind::Summit => &self.summit,
        }
    }

    pub fn status(&self, current: Option<&Position>) -> GeofenceStatus {
        let distance_to_start = current.map(|p| self.start.distance_meters(p));
        let distance_to_summit = current.map(|p| self.summit.distance_meters(p));

        GeofenceStatus {
            distance_to_start,
            distance_to_summit,
            near_start: distance_to_start.is_some_and(|d| d <= self.start.radius_meters),
            near_summit: distance_to_summit.is_some_and(|d| d <= self.summit.radius_meters),
        }
    }
}

/// Distances to both targets for the latest fix; `None` while no fix exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceStatus {
    pub distance_to_start: Option<f64>,
    pub distance_to_summit: Option<f64>,
    pub near_start: bool,
    pub near_summit: bool,
}

impl GeofenceStatus {
    /// Display line for one target, e.g. "12m to start"
    pub fn describe(&self, kind: TargetKind) -> String {
        let distance = match kind {
            TargetKind::Start => self.distance_to_start,
            TargetKind::Summit => self.distance_to_summit,
        };
        match distance {
            Some(d) => format!("{}m to {}", d.round(), kind),
            None => "Calculating distance...".to_string(),
        }
    }
}
