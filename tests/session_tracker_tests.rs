// Integration tests for the hike session tracker
//
// These tests drive a HikeTracker from a feed location source and check the
// accumulated path, distance and duration it reports at stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tumamoc_tracker::geofence::{haversine_meters, START, SUMMIT};
use tumamoc_tracker::{
    FeedLocationSource, HikeError, HikeTracker, LocationSource, LocationSubscription,
    PermissionStatus, Position, SessionConfig, SessionState, SubscriptionId,
};

const METERS_PER_DEGREE_LAT: f64 = 111_195.08;

fn start_fix() -> Position {
    Position::new(START.latitude, START.longitude, 0)
}

fn north_of(origin: &Position, meters: f64, timestamp: i64) -> Position {
    Position::new(
        origin.latitude + meters / METERS_PER_DEGREE_LAT,
        origin.longitude,
        timestamp,
    )
}

fn tracker_with_feed() -> (HikeTracker, Arc<FeedLocationSource>) {
    let feed = Arc::new(FeedLocationSource::new("test-feed"));
    let tracker = HikeTracker::new(SessionConfig::default(), feed.clone());
    (tracker, feed)
}

#[tokio::test]
async fn test_two_updates_accumulate_distance() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    // P1 is 10m from the start, P2 is 15m further on
    let p1 = north_of(&start_fix(), 10.0, 1_000);
    let p2 = north_of(&p1, 15.0, 2_000);
    assert_eq!(feed.push(p1).await, 1);
    assert_eq!(feed.push(p2).await, 1);

    let summary = tracker.stop().await.expect("was tracking");

    assert_eq!(summary.path, vec![p1, p2]);
    assert!((summary.distance_meters - 15.0).abs() < 0.01, "got {}", summary.distance_meters);
}

#[tokio::test]
async fn test_start_fix_counts_toward_distance_when_delivered() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    let p0 = start_fix();
    let p1 = north_of(&p0, 10.0, 1_000);
    let p2 = north_of(&p1, 15.0, 2_000);
    for p in [p0, p1, p2] {
        feed.push(p).await;
    }

    let summary = tracker.stop().await.unwrap();

    assert_eq!(summary.path.len(), 3);
    assert!((summary.distance_meters - 25.0).abs() < 0.01, "got {}", summary.distance_meters);
}

#[tokio::test]
async fn test_every_delivered_update_recorded_once() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    let mut expected = Vec::new();
    let mut current = start_fix();
    for i in 0..250 {
        current = north_of(&current, 6.0, i * 1_000);
        expected.push(current);
        feed.push(current).await;
    }

    let summary = tracker.stop().await.unwrap();

    assert_eq!(summary.path, expected);
    let legs: f64 = expected.windows(2).map(|w| haversine_meters(&w[0], &w[1])).sum();
    assert!((summary.distance_meters - legs).abs() < 1e-6);
}

#[tokio::test]
async fn test_stop_without_updates_returns_empty_path() {
    let (tracker, _feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    let summary = tracker.stop().await.unwrap();

    assert!(summary.is_empty());
    assert_eq!(summary.distance_meters, 0.0);
}

#[tokio::test]
async fn test_second_stop_is_noop() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();
    feed.push(start_fix()).await;

    assert!(tracker.stop().await.is_some());
    assert!(tracker.stop().await.is_none());
    assert_eq!(tracker.stats().await.state, SessionState::Idle);
}

#[tokio::test]
async fn test_restart_while_tracking_keeps_single_subscription() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();
    feed.push(start_fix()).await;

    tracker.start().await.unwrap();

    assert_eq!(feed.subscriber_count().await, 1);
    let summary = tracker.stop().await.unwrap();
    assert_eq!(summary.path.len(), 1, "second start must not reset the path");
}

#[tokio::test]
async fn test_updates_after_stop_not_attributed() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();
    feed.push(start_fix()).await;

    let summary = tracker.stop().await.unwrap();
    assert_eq!(feed.subscriber_count().await, 0);

    assert_eq!(feed.push(north_of(&start_fix(), 20.0, 5_000)).await, 0);
    let stats = tracker.stats().await;

    assert_eq!(summary.path.len(), 1);
    assert_eq!(stats.point_count, 1);
}

#[tokio::test]
async fn test_new_session_resets_accumulators() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();
    feed.push(start_fix()).await;
    feed.push(north_of(&start_fix(), 30.0, 1_000)).await;
    let first = tracker.stop().await.unwrap();

    tracker.start().await.unwrap();
    let stats = tracker.stats().await;
    assert_eq!(stats.point_count, 0);
    assert_eq!(stats.distance_meters, 0.0);

    let summit = Position::new(SUMMIT.latitude, SUMMIT.longitude, 9_000);
    feed.push(summit).await;
    let second = tracker.stop().await.unwrap();

    assert_eq!(first.path.len(), 2);
    assert_eq!(second.path, vec![summit]);
}

#[tokio::test]
async fn test_permission_denied_prevents_start() {
    let feed = Arc::new(FeedLocationSource::with_permission(
        "denied-feed",
        PermissionStatus::Denied,
    ));
    let tracker = HikeTracker::new(SessionConfig::default(), feed.clone());

    let result = tracker.start().await;

    assert!(matches!(result, Err(HikeError::PermissionDenied)));
    assert!(!tracker.is_tracking().await);
    assert_eq!(feed.subscriber_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_duration_from_wall_clock_not_ticks() {
    let (tracker, _feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    tokio::time::advance(Duration::from_secs(65)).await;

    assert_eq!(tracker.stats().await.elapsed_seconds, 65);
    let summary = tracker.stop().await.unwrap();
    assert_eq!(summary.duration_seconds, 65);
}

#[tokio::test(start_paused = true)]
async fn test_tick_refreshes_elapsed() {
    let (tracker, _feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    // Sleeping lets the tick task run at each second boundary
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let stats = tracker.stats().await;
    assert_eq!(stats.state, SessionState::Tracking);
    assert_eq!(stats.elapsed_seconds, 3);
}

#[tokio::test]
async fn test_small_moves_filtered_by_source() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();

    let p0 = start_fix();
    feed.push(p0).await;
    feed.push(north_of(&p0, 2.0, 1_000)).await;
    feed.push(north_of(&p0, 4.0, 2_000)).await;
    feed.push(north_of(&p0, 5.5, 3_000)).await;

    let summary = tracker.stop().await.unwrap();
    assert_eq!(summary.path.len(), 2);
    assert_eq!(feed.current_position().await.unwrap(), Some(north_of(&p0, 5.5, 3_000)));
}

/// Feed wrapper whose first unsubscribe hangs for ten seconds
struct SlowUnsubscribeSource {
    inner: Arc<FeedLocationSource>,
    stalled: AtomicBool,
}

#[async_trait::async_trait]
impl LocationSource for SlowUnsubscribeSource {
    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        self.inner.request_permission().await
    }

    async fn current_position(&self) -> anyhow::Result<Option<Position>> {
        self.inner.current_position().await
    }

    async fn subscribe(&self, min_distance_meters: f64) -> anyhow::Result<LocationSubscription> {
        self.inner.subscribe(min_distance_meters).await
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> anyhow::Result<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        self.inner.unsubscribe(id).await
    }

    fn name(&self) -> &str {
        "slow-unsubscribe"
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_stop_still_tears_down() {
    let feed = Arc::new(FeedLocationSource::new("test-feed"));
    let source = Arc::new(SlowUnsubscribeSource {
        inner: feed.clone(),
        stalled: AtomicBool::new(false),
    });
    let tracker = HikeTracker::new(SessionConfig::default(), source);

    tracker.start().await.unwrap();
    assert_eq!(feed.push(start_fix()).await, 1);

    let stopped = tokio::time::timeout(Duration::from_secs(1), tracker.stop()).await;
    assert!(stopped.is_err(), "caller gave up while unsubscribe was stalled");

    // Teardown carries on without the caller
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(!tracker.is_tracking().await);
    assert_eq!(feed.subscriber_count().await, 0);
    assert!(tracker.stop().await.is_none());

    tracker.start().await.unwrap();
    let stats = tracker.stats().await;
    assert_eq!(stats.state, SessionState::Tracking);
    assert_eq!(stats.point_count, 0, "new hike must not inherit the old path");
    assert_eq!(stats.distance_meters, 0.0);
    assert_eq!(feed.subscriber_count().await, 1);
}

#[tokio::test]
async fn test_dropped_tracker_releases_subscription() {
    let (tracker, feed) = tracker_with_feed();
    tracker.start().await.unwrap();
    assert_eq!(feed.subscriber_count().await, 1);

    drop(tracker);
    for _ in 0..10 {
        if feed.subscriber_count().await == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(feed.subscriber_count().await, 0);
}
