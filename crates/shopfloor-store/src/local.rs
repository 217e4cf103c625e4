use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{ObjectStore, StoreConfig, StoreError};

/// Filesystem-backed store for development and offline use.
///
/// Access URLs are `file://` URLs; they never expire. The bucket name only
/// prefixes persisted storage paths; objects live directly under `base_dir`.
pub struct LocalStore {
    base_dir: PathBuf,
    bucket: String,
}

const DEFAULT_BUCKET: &str = "documents";

impl LocalStore {
    pub fn new(config: &StoreConfig) -> Self {
        let base_dir = config
            .local_data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let bucket = config
            .bucket
            .clone()
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        Self { base_dir, bucket }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_dir.join(key.trim_start_matches('/'))
    }
}

fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("shopfloor")
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn bucket(&self) -> Option<&str> {
        Some(&self.bucket)
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Internal(format!("mkdir: {e}")))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StoreError::Internal(format!("write {}: {e}", path.display())))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.resolve(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Internal(format!(
                "exists {}: {e}",
                path.display()
            ))),
        }
    }

    async fn signed_url(&self, key: &str, _ttl: Duration) -> Result<String, StoreError> {
        if key.is_empty() || !self.exists(key).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let path = self.resolve(key);
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| StoreError::Internal(format!("current dir: {e}")))?
                .join(path)
        };
        let url = url::Url::from_file_path(&path)
            .map_err(|_| StoreError::Internal(format!("not a file path: {}", path.display())))?;
        debug!("local access url for {key}: {url}");
        Ok(url.to_string())
    }

    async fn check_session(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| StoreError::Internal(format!("data dir {}: {e}", self.base_dir.display())))
    }
}
