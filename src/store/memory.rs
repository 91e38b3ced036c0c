use super::{fastest, sort_newest_first, HikeRecord, HikeStore, StoreError};
use tokio::sync::RwLock;
use tracing::info;

/// In-process hike store
#[derive(Default)]
pub struct MemoryHikeStore {
    records: RwLock<Vec<HikeRecord>>,
}

impl MemoryHikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in save order
    pub async fn records(&self) -> Vec<HikeRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl HikeStore for MemoryHikeStore {
    async fn save(&self, record: &HikeRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        info!("Saved hike {} for {}", record.id, record.user_id);
        Ok(())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.user_id == user_id).count() as u64)
    }

    async fn hikes_for_user(&self, user_id: &str) -> Result<Vec<HikeRecord>, StoreError> {
        let mut hikes: Vec<HikeRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut hikes);
        Ok(hikes)
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<HikeRecord>, StoreError> {
        Ok(fastest(self.records.read().await.clone(), limit))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
