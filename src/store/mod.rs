//! Hike persistence
//!
//! The store is an external collaborator: a record is written once and
//! never queued or retried here. Backends:
//! - `memory`: in-process, for tests and throwaway runs
//! - `file`: append-only JSON lines on local disk
//! - `rest`: PostgREST `hikes` table (the hosted backend)

mod jsonl;
mod memory;
mod record;
mod rest;

pub use jsonl::JsonlHikeStore;
pub use memory::MemoryHikeStore;
pub use record::HikeRecord;
pub use rest::RestHikeStore;

use crate::config::{StoreBackend, StoreConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use thiserror::Error;

/// Number of entries on the leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),
}

#[async_trait::async_trait]
pub trait HikeStore: Send + Sync {
    /// Durably store one record
    async fn save(&self, record: &HikeRecord) -> Result<(), StoreError>;

    /// Total hikes recorded by `user_id`
    async fn count_for_user(&self, user_id: &str) -> Result<u64, StoreError>;

    /// Hikes recorded by `user_id`, newest first
    async fn hikes_for_user(&self, user_id: &str) -> Result<Vec<HikeRecord>, StoreError>;

    /// Fastest hikes overall, shortest duration first
    async fn leaderboard(&self, limit: usize) -> Result<Vec<HikeRecord>, StoreError>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

/// Hike store factory
pub struct HikeStoreFactory;

impl HikeStoreFactory {
    /// Create the store selected by configuration
    pub fn create(config: &StoreConfig) -> Result<Arc<dyn HikeStore>> {
        match config.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryHikeStore::new())),
            StoreBackend::File => Ok(Arc::new(JsonlHikeStore::new(&config.path))),
            StoreBackend::Rest => {
                let url = config
                    .url
                    .as_deref()
                    .context("store.url is required for the rest backend")?;
                let api_key = config
                    .api_key
                    .as_deref()
                    .context("store.api_key is required for the rest backend")?;
                let store = RestHikeStore::new(url, api_key, &config.table)?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Newest first; ISO-8601 UTC strings of equal precision sort chronologically
pub(crate) fn sort_newest_first(records: &mut [HikeRecord]) {
    records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}

/// Shortest duration first, ties broken by who finished earlier
pub(crate) fn fastest(mut records: Vec<HikeRecord>, limit: usize) -> Vec<HikeRecord> {
    records.sort_by(|a, b| {
        a.duration_seconds
            .cmp(&b.duration_seconds)
            .then_with(|| a.end_time.cmp(&b.end_time))
    });
    records.truncate(limit);
    records
}
