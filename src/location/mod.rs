pub mod feed;
pub mod gpx;
pub mod source;

pub use feed::FeedLocationSource;
pub use gpx::GpxTrack;
pub use source::{LocationSource, LocationSubscription, PermissionStatus, Position, SubscriptionId};
