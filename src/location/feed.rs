use super::source::{LocationSource, LocationSubscription, PermissionStatus, Position, SubscriptionId};
use crate::geofence::haversine_meters;
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Buffered updates per subscriber before `push` waits on the consumer
const SUBSCRIBER_BUFFER: usize = 100;

struct Subscriber {
    id: SubscriptionId,
    min_distance_meters: f64,
    last_emitted: Option<Position>,
    sender: mpsc::Sender<Position>,
}

impl Subscriber {
    fn wants(&self, position: &Position) -> bool {
        match &self.last_emitted {
            Some(last) => haversine_meters(last, position) >= self.min_distance_meters,
            None => true,
        }
    }
}

struct FeedState {
    permission: PermissionStatus,
    latest: Option<Position>,
    subscribers: Vec<Subscriber>,
}

/// Location source fed by the caller
///
/// Every pushed fix becomes the latest known position. Each subscriber only
/// sees a fix once it is at least its minimum distance away from the last
/// fix that subscriber was sent, the way a device applies its distance
/// interval.
pub struct FeedLocationSource {
    name: String,
    state: Mutex<FeedState>,
    push_lock: Mutex<()>,
    next_id: AtomicU64,
}

impl FeedLocationSource {
    /// Source with location access granted
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_permission(name, PermissionStatus::Granted)
    }

    pub fn with_permission(name: impl Into<String>, permission: PermissionStatus) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(FeedState {
                permission,
                latest: None,
                subscribers: Vec::new(),
            }),
            push_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Feed a new fix. Returns how many subscribers it was delivered to.
    ///
    /// Waits when a subscriber's buffer is full rather than dropping the fix.
    /// The state lock is not held while waiting, so the latest position and
    /// (un)subscription stay available; pushes themselves are serialized to
    /// keep every subscriber's stream in order.
    pub async fn push(&self, position: Position) -> usize {
        let _push = self.push_lock.lock().await;

        let targets: Vec<(SubscriptionId, mpsc::Sender<Position>)> = {
            let mut state = self.state.lock().await;
            if !state.permission.is_granted() {
                debug!("Ignoring fix on {}: permission denied", self.name);
                return 0;
            }

            state.latest = Some(position);
            state
                .subscribers
                .iter_mut()
                .filter(|subscriber| subscriber.wants(&position))
                .map(|subscriber| {
                    subscriber.last_emitted = Some(position);
                    (subscriber.id, subscriber.sender.clone())
                })
                .collect()
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sender) in targets {
            if sender.send(position).await.is_err() {
                closed.push(id);
            } else {
                delivered += 1;
            }
        }

        if !closed.is_empty() {
            debug!("Pruning {} closed subscription(s) on {}", closed.len(), self.name);
            let mut state = self.state.lock().await;
            state.subscribers.retain(|s| !closed.contains(&s.id));
        }

        delivered
    }

    /// Number of live subscriptions
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }
}

#[async_trait::async_trait]
impl LocationSource for FeedLocationSource {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.state.lock().await.permission)
    }

    async fn current_position(&self) -> Result<Option<Position>> {
        Ok(self.state.lock().await.latest)
    }

    async fn subscribe(&self, min_distance_meters: f64) -> Result<LocationSubscription> {
        let mut state = self.state.lock().await;
        if !state.permission.is_granted() {
            anyhow::bail!("Location permission denied for {}", self.name);
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        state.subscribers.push(Subscriber {
            id,
            min_distance_meters,
            last_emitted: None,
            sender,
        });

        info!(
            "Subscribed to {} (id={}, min_distance={}m)",
            self.name, id.0, min_distance_meters
        );

        Ok(LocationSubscription { id, receiver })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut state = self.state.lock().await;
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != id);

        if state.subscribers.len() == before {
            warn!("Unknown subscription {} on {}", id.0, self.name);
        } else {
            info!("Unsubscribed from {} (id={})", self.name, id.0);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    // ~1.11m of latitude per 0.00001 degrees
    fn north_of(origin: &Position, meters: f64, timestamp: i64) -> Position {
        Position::new(origin.latitude + meters / 111_195.0, origin.longitude, timestamp)
    }

    #[tokio::test]
    async fn test_distance_filter_drops_small_moves() {
        let feed = FeedLocationSource::new("test");
        let mut sub = feed.subscribe(5.0).await.unwrap();

        let a = Position::new(32.2259035, -111.001116, 0);
        let b = north_of(&a, 3.0, 1_000);
        let c = north_of(&a, 6.0, 2_000);

        assert_eq!(feed.push(a).await, 1);
        assert_eq!(feed.push(b).await, 0, "3m from last emitted fix");
        assert_eq!(feed.push(c).await, 1);

        assert_eq!(sub.receiver.recv().await, Some(a));
        assert_eq!(sub.receiver.recv().await, Some(c));
        assert_eq!(feed.current_position().await.unwrap(), Some(c));
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_stream() {
        let feed = FeedLocationSource::new("test");
        let mut sub = feed.subscribe(0.0).await.unwrap();

        feed.unsubscribe(sub.id).await.unwrap();
        assert_eq!(feed.subscriber_count().await, 0);
        assert_eq!(feed.push(Position::new(1.0, 1.0, 0)).await, 0);
        assert_eq!(sub.receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_denied_source_refuses_subscription() {
        let feed = FeedLocationSource::with_permission("test", PermissionStatus::Denied);

        assert_eq!(feed.request_permission().await.unwrap(), PermissionStatus::Denied);
        assert!(feed.subscribe(5.0).await.is_err());
        assert_eq!(feed.push(Position::new(1.0, 1.0, 0)).await, 0);
        assert_eq!(feed.current_position().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let feed = FeedLocationSource::new("test");
        let sub = feed.subscribe(0.0).await.unwrap();
        drop(sub);

        assert_eq!(feed.push(Position::new(1.0, 1.0, 0)).await, 0);
        assert_eq!(feed.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_block_readers() {
        let feed = Arc::new(FeedLocationSource::new("test"));
        let mut sub = feed.subscribe(0.0).await.unwrap();

        for i in 0..SUBSCRIBER_BUFFER {
            assert_eq!(feed.push(Position::new(1.0, 1.0, i as i64)).await, 1);
        }

        let overflow = Position::new(2.0, 2.0, 1_000);
        let pending = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.push(overflow).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished(), "buffer is full");

        let latest = tokio::time::timeout(Duration::from_secs(1), feed.current_position())
            .await
            .expect("current_position blocked behind a full subscriber")
            .unwrap();
        assert_eq!(latest, Some(overflow));

        assert_eq!(sub.receiver.recv().await, Some(Position::new(1.0, 1.0, 0)));
        assert_eq!(pending.await.unwrap(), 1);
    }
}
