use super::feed::FeedLocationSource;
use super::source::Position;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// A recorded track loaded from a GPX file, flattened to one ordered path
pub struct GpxTrack {
    pub name: Option<String>,
    pub points: Vec<Position>,
}

impl GpxTrack {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening GPX track: {}", path.display());

        let file = File::open(path).context("Failed to open GPX file")?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let gpx = ::gpx::read(reader).context("Failed to parse GPX")?;

        let name = gpx.tracks.iter().find_map(|t| t.name.clone());
        let mut points = Vec::new();
        let mut last_timestamp = 0;

        for waypoint in gpx
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|s| s.points.iter())
        {
            let point = waypoint.point();
            // Untimed points are spaced one second after their predecessor
            let timestamp = match waypoint.time {
                Some(t) => {
                    let t: time::OffsetDateTime = t.into();
                    (t.unix_timestamp_nanos() / 1_000_000) as i64
                }
                None => last_timestamp + 1_000,
            };
            last_timestamp = timestamp;
            points.push(Position::new(point.y(), point.x(), timestamp));
        }

        if points.is_empty() {
            anyhow::bail!("GPX contains no track points");
        }

        info!(
            "GPX track loaded: {} ({} points)",
            name.as_deref().unwrap_or("unnamed"),
            points.len()
        );

        Ok(Self { name, points })
    }

    pub fn first(&self) -> Option<&Position> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Position> {
        self.points.last()
    }

    /// Push every point into `feed`, one per `interval`, restamped with the
    /// replay time. Returns the number of fixes delivered to subscribers.
    pub async fn replay(&self, feed: &FeedLocationSource, interval: Duration) -> usize {
        let mut ticker = tokio::time::interval(interval);
        let mut delivered = 0;

        for point in &self.points {
            ticker.tick().await;
            delivered += feed
                .push(Position::now(point.latitude, point.longitude))
                .await;
        }

        info!(
            "Replayed {} points ({} delivered)",
            self.points.len(),
            delivered
        );
        delivered
    }
}
