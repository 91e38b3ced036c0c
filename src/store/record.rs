use crate::location::Position;
use crate::session::HikeSummary;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finished hike in the shape of the `hikes` table
///
/// `id` is generated locally for the memory and file stores. The REST store
/// leaves it out of inserts and reads back the id the table assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikeRecord {
    pub id: Uuid,
    pub user_id: String,
    /// ISO-8601, millisecond precision, UTC
    pub start_time: String,
    /// ISO-8601, millisecond precision, UTC
    pub end_time: String,
    pub duration_seconds: u64,
    pub path_points: Vec<Position>,
}

impl HikeRecord {
    pub fn from_summary(user_id: impl Into<String>, summary: &HikeSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            start_time: iso8601(&summary.start_time),
            end_time: iso8601(&summary.end_time),
            duration_seconds: summary.duration_seconds,
            path_points: summary.path.clone(),
        }
    }
}

fn iso8601(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
