use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A single fix from the device location subsystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Fix stamped with the current wall-clock time
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, chrono::Utc::now().timestamp_millis())
    }
}

/// Outcome of the one-shot location permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Identifies a live position subscription for `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live stream of position updates
///
/// Updates arrive in the order the source emitted them. The stream ends
/// (`recv` returns `None`) once the source drops the subscription.
#[derive(Debug)]
pub struct LocationSubscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::Receiver<Position>,
}

/// Device location boundary
///
/// Implementations:
/// - Feed: positions pushed in by the caller (HTTP endpoint, GPX replay, tests)
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    /// Ask for location access. Repeated calls return the recorded answer.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Latest known fix, or `None` if no fix has arrived yet
    async fn current_position(&self) -> Result<Option<Position>>;

    /// Start receiving updates, filtered so that consecutive samples are at
    /// least `min_distance_meters` apart
    async fn subscribe(&self, min_distance_meters: f64) -> Result<LocationSubscription>;

    /// Stop delivering updates to the given subscription
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Get source name for logging
    fn name(&self) -> &str;
}
