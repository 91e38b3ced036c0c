//! HTTP API for driving the tracker from a device or a simulator
//!
//! - POST /location - Push a position fix
//! - GET /geofence - Distances to start and summit for the latest fix
//! - POST /hikes/start - Start a hike (must be at the start)
//! - POST /hikes/finish - Finish and save a hike (must be at the summit)
//! - GET /hikes/status - Geofence plus live session statistics
//! - GET /users/:user_id/hikes - A user's hike count and history
//! - GET /leaderboard - Fastest hikes
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{FinishHikeRequest, LocationUpdate};
pub use routes::create_router;
pub use state::AppState;
