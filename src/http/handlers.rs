use super::state::AppState;
use crate::error::HikeError;
use crate::geofence::GeofenceStatus;
use crate::hike::SavedHike;
use crate::location::Position;
use crate::store::{HikeRecord, LEADERBOARD_SIZE};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,

    /// Epoch milliseconds; defaults to the time of receipt
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    /// Subscribers the fix was delivered to (0 if filtered as too close)
    pub delivered: usize,
    pub geofence: GeofenceStatus,
}

#[derive(Debug, Serialize)]
pub struct StartHikeResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishHikeRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserHikesResponse {
    pub user_id: String,
    pub total: u64,
    pub hikes: Vec<HikeRecord>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for HikeError {
    fn into_response(self) -> Response {
        let status = match &self {
            HikeError::PermissionDenied => StatusCode::FORBIDDEN,
            HikeError::PositionUnknown { .. }
            | HikeError::OutsideGeofence { .. }
            | HikeError::NotTracking => StatusCode::CONFLICT,
            HikeError::EmptyHike => StatusCode::UNPROCESSABLE_ENTITY,
            HikeError::Persistence(_) => StatusCode::BAD_GATEWAY,
            HikeError::Location(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /location
/// Push a position fix into the feed
pub async fn push_location(
    State(state): State<AppState>,
    Json(update): Json<LocationUpdate>,
) -> impl IntoResponse {
    let position = match update.timestamp {
        Some(timestamp) => Position::new(update.latitude, update.longitude, timestamp),
        None => Position::now(update.latitude, update.longitude),
    };

    let delivered = state.feed.push(position).await;
    let geofence = state.controller.geofence().status(Some(&position));

    (StatusCode::OK, Json(LocationResponse { delivered, geofence }))
}

/// GET /geofence
/// Distances to both targets for the latest known fix
pub async fn get_geofence(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.controller.current_position().await;
    let status = state.controller.geofence().status(current.as_ref());

    (StatusCode::OK, Json(status))
}

/// POST /hikes/start
/// Start a hike at the latest known fix
pub async fn start_hike(State(state): State<AppState>) -> Result<Json<StartHikeResponse>, HikeError> {
    let current = state.controller.current_position().await;

    state.controller.begin(current.as_ref()).await.inspect_err(|e| {
        info!("Start rejected: {}", e);
    })?;

    Ok(Json(StartHikeResponse {
        status: "tracking".to_string(),
        message: "Hike started".to_string(),
    }))
}

/// POST /hikes/finish
/// Finish the hike at the latest known fix and save it
pub async fn finish_hike(
    State(state): State<AppState>,
    Json(req): Json<FinishHikeRequest>,
) -> Result<(StatusCode, Json<SavedHike>), HikeError> {
    let current = state.controller.current_position().await;

    let saved = state
        .controller
        .finish(&req.user_id, current.as_ref())
        .await
        .inspect_err(|e| {
            info!("Finish rejected for {}: {}", req.user_id, e);
        })?;

    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /hikes/status
/// Geofence distances plus live session statistics
pub async fn get_hike_status(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.controller.current_position().await;
    let status = state.controller.status(current.as_ref()).await;

    (StatusCode::OK, Json(status))
}

/// GET /users/:user_id/hikes
/// Hike count and history for one user
pub async fn get_user_hikes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserHikesResponse>, HikeError> {
    let total = state.controller.total_hikes(&user_id).await.inspect_err(|e| {
        error!("Failed to count hikes for {}: {}", user_id, e);
    })?;
    let hikes = state.controller.history(&user_id).await.inspect_err(|e| {
        error!("Failed to load hikes for {}: {}", user_id, e);
    })?;

    Ok(Json(UserHikesResponse {
        user_id,
        total,
        hikes,
    }))
}

/// GET /leaderboard
/// Fastest hikes, shortest first
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<HikeRecord>>, HikeError> {
    let limit = query.limit.unwrap_or(LEADERBOARD_SIZE);
    let hikes = state.controller.leaderboard(limit).await.inspect_err(|e| {
        error!("Failed to load leaderboard: {}", e);
    })?;

    Ok(Json(hikes))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
