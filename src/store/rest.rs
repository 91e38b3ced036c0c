use super::{HikeRecord, HikeStore, StoreError};
use crate::location::Position;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{error, info};

/// Insert payload: the table assigns its own `id`
#[derive(Debug, Serialize)]
struct NewHike<'a> {
    user_id: &'a str,
    start_time: &'a str,
    end_time: &'a str,
    duration_seconds: u64,
    path_points: &'a [Position],
}

impl<'a> From<&'a HikeRecord> for NewHike<'a> {
    fn from(record: &'a HikeRecord) -> Self {
        Self {
            user_id: &record.user_id,
            start_time: &record.start_time,
            end_time: &record.end_time,
            duration_seconds: record.duration_seconds,
            path_points: &record.path_points,
        }
    }
}

/// PostgREST-backed hike store (`/rest/v1/<table>`)
pub struct RestHikeStore {
    client: Client,
    table_url: String,
}

impl RestHikeStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).context("Invalid API key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).context("Invalid API key")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        let table_url = table_url(base_url, table);
        info!("Using REST hike store at {}", table_url);

        Ok(Self { client, table_url })
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Hike store returned {}: {}", status, body);
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl HikeStore for RestHikeStore {
    async fn save(&self, record: &HikeRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=minimal")
            .json(&NewHike::from(record))
            .send()
            .await?;
        Self::check(response).await?;

        info!("Saved hike for {}", record.user_id);
        Ok(())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let response = self
            .client
            .head(&self.table_url)
            .query(&[("select", "id".to_string()), ("user_id", format!("eq.{}", user_id))])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::InvalidResponse("missing Content-Range".to_string()))?;

        parse_total(content_range)
            .ok_or_else(|| StoreError::InvalidResponse(format!("bad Content-Range: {}", content_range)))
    }

    async fn hikes_for_user(&self, user_id: &str) -> Result<Vec<HikeRecord>, StoreError> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("order", "start_time.desc".to_string()),
            ])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<HikeRecord>, StoreError> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[
                ("order", "duration_seconds.asc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    fn name(&self) -> &str {
        "rest"
    }
}

fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// Total from a PostgREST `Content-Range` header, e.g. `0-9/42` or `*/0`
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}
