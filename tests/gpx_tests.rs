// Tests for loading and replaying GPX tracks

use std::sync::Arc;
use std::time::Duration;
use tumamoc_tracker::{FeedLocationSource, GpxTrack, HikeTracker, SessionConfig};

const TIMED_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Tumamoc morning</name>
    <trkseg>
      <trkpt lat="32.2259035" lon="-111.001116"><time>2025-10-09T08:53:20Z</time></trkpt>
      <trkpt lat="32.2250000" lon="-111.001500"><time>2025-10-09T08:54:20Z</time></trkpt>
      <trkpt lat="32.2200000" lon="-111.003000"><time>2025-10-09T09:05:20Z</time></trkpt>
      <trkpt lat="32.214089" lon="-111.0054714"><time>2025-10-09T09:18:20Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const UNTIMED_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="32.2259035" lon="-111.001116"></trkpt>
      <trkpt lat="32.214089" lon="-111.0054714"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

#[test]
fn test_gpx_track_loads_points_in_order() {
    let track = GpxTrack::from_reader(TIMED_TRACK.as_bytes()).unwrap();

    assert_eq!(track.name.as_deref(), Some("Tumamoc morning"));
    assert_eq!(track.points.len(), 4);

    let first = track.first().unwrap();
    assert_eq!(first.latitude, 32.2259035);
    assert_eq!(first.longitude, -111.001116);
    assert_eq!(first.timestamp, 1_760_000_000_000);

    let last = track.last().unwrap();
    assert_eq!(last.latitude, 32.214089);
    assert_eq!(last.timestamp, 1_760_001_500_000);
}

#[test]
fn test_untimed_points_spaced_one_second() {
    let track = GpxTrack::from_reader(UNTIMED_TRACK.as_bytes()).unwrap();

    assert_eq!(track.points[1].timestamp - track.points[0].timestamp, 1_000);
}

#[test]
fn test_gpx_without_points_rejected() {
    let empty = r#"<?xml version="1.0"?><gpx version="1.1" creator="test"></gpx>"#;
    assert!(GpxTrack::from_reader(empty.as_bytes()).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_replay_feeds_tracker() {
    let track = GpxTrack::from_reader(TIMED_TRACK.as_bytes()).unwrap();
    let feed = Arc::new(FeedLocationSource::new("replay"));
    let tracker = HikeTracker::new(SessionConfig::default(), feed.clone());

    tracker.start().await.unwrap();
    let delivered = track.replay(&feed, Duration::from_secs(10)).await;
    let summary = tracker.stop().await.unwrap();

    assert_eq!(delivered, 4);
    assert_eq!(summary.path.len(), 4);
    assert!(summary.distance_meters > 1_300.0);
    assert_eq!(summary.duration_seconds, 30);
}
