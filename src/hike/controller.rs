use super::format::format_duration;
use crate::error::HikeError;
use crate::geofence::{GeofenceConfig, GeofenceStatus, TargetKind};
use crate::location::{LocationSource, PermissionStatus, Position};
use crate::session::{HikeTracker, SessionConfig, SessionStats};
use crate::store::{HikeRecord, HikeStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Geofence distances plus the live session, for one fix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HikeStatus {
    pub geofence: GeofenceStatus,
    pub session: SessionStats,
}

/// Result of a successfully persisted hike
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedHike {
    pub record: HikeRecord,
    pub distance_meters: f64,
    /// e.g. "You hiked 1402m in 24:13"
    pub message: String,
}

/// Start/finish flow between the trailhead and the summit
///
/// A hike may only begin inside the start geofence and only finish inside
/// the summit geofence. Finished hikes are saved once; a failed save is
/// reported and the record dropped.
pub struct HikeController {
    tracker: HikeTracker,
    source: Arc<dyn LocationSource>,
    store: Arc<dyn HikeStore>,
    geofence: GeofenceConfig,
    permission: PermissionStatus,
}

impl HikeController {
    /// Prompts for location permission once; a denial is kept and reported
    /// by every later `begin`.
    pub async fn new(
        source: Arc<dyn LocationSource>,
        store: Arc<dyn HikeStore>,
        geofence: GeofenceConfig,
        session_config: SessionConfig,
    ) -> Result<Self, HikeError> {
        let permission = source.request_permission().await?;
        if !permission.is_granted() {
            warn!("{}", HikeError::PermissionDenied);
        }

        info!(
            "Hike controller ready (source={}, store={})",
            source.name(),
            store.name()
        );

        Ok(Self {
            tracker: HikeTracker::new(session_config, Arc::clone(&source)),
            source,
            store,
            geofence,
            permission,
        })
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn geofence(&self) -> &GeofenceConfig {
        &self.geofence
    }

    pub fn tracker(&self) -> &HikeTracker {
        &self.tracker
    }

    /// Latest known fix from the source, `None` if there is none yet
    pub async fn current_position(&self) -> Option<Position> {
        match self.source.current_position().await {
            Ok(position) => position,
            Err(e) => {
                warn!("Failed to read current position: {}", e);
                None
            }
        }
    }

    pub async fn status(&self, current: Option<&Position>) -> HikeStatus {
        HikeStatus {
            geofence: self.geofence.status(current),
            session: self.tracker.stats().await,
        }
    }

    /// Start a hike from `current`, which must be inside the start geofence
    pub async fn begin(&self, current: Option<&Position>) -> Result<(), HikeError> {
        if !self.permission.is_granted() {
            return Err(HikeError::PermissionDenied);
        }

        self.gate(TargetKind::Start, current)?;
        self.tracker.start().await
    }

    /// Finish the hike at `current`, which must be inside the summit
    /// geofence, and save it for `user_id`
    ///
    /// A rejected summit gate leaves the hike running. Once stopped, an
    /// empty hike is discarded without touching the store.
    pub async fn finish(
        &self,
        user_id: &str,
        current: Option<&Position>,
    ) -> Result<SavedHike, HikeError> {
        if !self.tracker.is_tracking().await {
            return Err(HikeError::NotTracking);
        }

        self.gate(TargetKind::Summit, current)?;

        let summary = self.tracker.stop().await.ok_or(HikeError::NotTracking)?;
        if summary.is_empty() {
            warn!("Discarding hike for {}: no positions recorded", user_id);
            return Err(HikeError::EmptyHike);
        }

        let record = HikeRecord::from_summary(user_id, &summary);
        if let Err(e) = self.store.save(&record).await {
            error!("Failed to save hike {} for {}: {}", record.id, user_id, e);
            return Err(HikeError::Persistence(e));
        }

        let message = format!(
            "You hiked {}m in {}",
            summary.distance_meters.round(),
            format_duration(summary.duration_seconds)
        );
        info!("{} ({})", message, user_id);

        Ok(SavedHike {
            record,
            distance_meters: summary.distance_meters,
            message,
        })
    }

    pub async fn total_hikes(&self, user_id: &str) -> Result<u64, HikeError> {
        Ok(self.store.count_for_user(user_id).await?)
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<HikeRecord>, HikeError> {
        Ok(self.store.hikes_for_user(user_id).await?)
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<HikeRecord>, HikeError> {
        Ok(self.store.leaderboard(limit).await?)
    }

    fn gate(&self, kind: TargetKind, current: Option<&Position>) -> Result<(), HikeError> {
        let target = self.geofence.target(kind);
        let Some(current) = current else {
            return Err(HikeError::PositionUnknown { target: kind });
        };

        let distance_meters = target.distance_meters(current);
        if distance_meters > target.radius_meters {
            info!("Rejected at {}: {:.1}m away", kind, distance_meters);
            return Err(HikeError::OutsideGeofence {
                target: kind,
                distance_meters,
            });
        }

        Ok(())
    }
}
