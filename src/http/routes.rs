use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Position feed and geofence
        .route("/location", post(handlers::push_location))
        .route("/geofence", get(handlers::get_geofence))
        // Hike control
        .route("/hikes/start", post(handlers::start_hike))
        .route("/hikes/finish", post(handlers::finish_hike))
        .route("/hikes/status", get(handlers::get_hike_status))
        // Store queries
        .route("/users/:user_id/hikes", get(handlers::get_user_hikes))
        .route("/leaderboard", get(handlers::get_leaderboard))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
