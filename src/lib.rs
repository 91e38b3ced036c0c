pub mod config;
pub mod error;
pub mod geofence;
pub mod hike;
pub mod http;
pub mod location;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::HikeError;
pub use geofence::{GeofenceConfig, GeofenceStatus, GeofenceTarget, TargetKind};
pub use hike::{format_duration, HikeController, HikeStatus, SavedHike};
pub use http::{create_router, AppState};
pub use location::{
    FeedLocationSource, GpxTrack, LocationSource, LocationSubscription, PermissionStatus,
    Position, SubscriptionId,
};
pub use session::{HikeSummary, HikeTracker, Session, SessionConfig, SessionState, SessionStats};
pub use store::{HikeRecord, HikeStore, StoreError};
