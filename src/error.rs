use crate::geofence::TargetKind;
use crate::store::StoreError;
use thiserror::Error;

/// Everything that can end a start or finish attempt.
///
/// None of these are retried; after any of them the tracker is back in a
/// well-defined state (Idle, or still Tracking when a finish was rejected by
/// the summit gate).
#[derive(Debug, Error)]
pub enum HikeError {
    #[error("Permission to access location was denied")]
    PermissionDenied,

    /// No fix has arrived yet, so the distance to `target` is unknown.
    #[error("Calculating distance to the {target}...")]
    PositionUnknown { target: TargetKind },

    #[error("You are {}m away from the {target}", .distance_meters.round())]
    OutsideGeofence {
        target: TargetKind,
        distance_meters: f64,
    },

    #[error("No hike in progress")]
    NotTracking,

    #[error("No hike data: no positions were recorded")]
    EmptyHike,

    #[error("Failed to save hike: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Location(#[from] anyhow::Error),
}
