use super::{fastest, sort_newest_first, HikeRecord, HikeStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Append-only JSON-lines hike store, one record per line
pub struct JsonlHikeStore {
    path: PathBuf,
    /// Serializes appends
    write_lock: Mutex<()>,
}

impl JsonlHikeStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<HikeRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HikeRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // A torn final line from an interrupted append is skipped
                    warn!("Skipping line {} of {}: {}", line_no + 1, self.path.display(), e);
                }
            }
        }

        Ok(records)
    }
}

#[async_trait::async_trait]
impl HikeStore for JsonlHikeStore {
    async fn save(&self, record: &HikeRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(
            "Saved hike {} for {} to {}",
            record.id,
            record.user_id,
            self.path.display()
        );
        Ok(())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let records = self.read_all().await?;
        Ok(records.iter().filter(|r| r.user_id == user_id).count() as u64)
    }

    async fn hikes_for_user(&self, user_id: &str) -> Result<Vec<HikeRecord>, StoreError> {
        let mut hikes: Vec<HikeRecord> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        sort_newest_first(&mut hikes);
        Ok(hikes)
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<HikeRecord>, StoreError> {
        Ok(fastest(self.read_all().await?, limit))
    }

    fn name(&self) -> &str {
        "file"
    }
}
