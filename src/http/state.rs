use crate::hike::HikeController;
use crate::location::FeedLocationSource;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Start/finish flow and store queries
    pub controller: Arc<HikeController>,

    /// Position feed the controller's tracker subscribes to
    pub feed: Arc<FeedLocationSource>,
}

impl AppState {
    pub fn new(controller: Arc<HikeController>, feed: Arc<FeedLocationSource>) -> Self {
        Self { controller, feed }
    }
}
