use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use shopfloor_core::mime::sanitize_filename;
use tracing::{debug, info};

use crate::OpenError;

/// Local copies of downloaded attachments, one file per sanitized filename.
///
/// A cached file is reused as long as it exists; there is no freshness check
/// against the remote copy. Downloads of the same filename are serialized, and
/// each lands in a temporary sibling that is renamed into place.
pub struct AttachmentCache {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Where a cached attachment lives and whether this call downloaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub path: PathBuf,
    pub downloaded: bool,
}

impl AttachmentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(sanitize_filename(filename))
    }

    pub async fn ensure_dir(&self) -> Result<(), OpenError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| OpenError::Io(format!("create {}: {e}", self.dir.display())))
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Drop the lock entry for `name` unless another open is holding or
    /// waiting on it.
    fn release_lock(&self, name: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(name);
        }
    }

    /// Return the cached copy of `filename`, calling `download` only when
    /// there is none yet.
    pub async fn get_or_download<F, Fut>(
        &self,
        filename: &str,
        download: F,
    ) -> Result<CachedFile, OpenError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, OpenError>>,
    {
        self.ensure_dir().await?;
        let name = sanitize_filename(filename);

        let lock = self.lock_for(&name);
        let result = {
            let _guard = lock.lock().await;
            self.fill(&name, download).await
        };
        self.release_lock(&name, lock);
        result
    }

    async fn fill<F, Fut>(&self, name: &str, download: F) -> Result<CachedFile, OpenError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, OpenError>>,
    {
        let path = self.dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("reusing cached {}", path.display());
            return Ok(CachedFile {
                path,
                downloaded: false,
            });
        }

        let data = download().await?;
        // Unique per download: other processes may fill the same directory.
        let partial = self
            .dir
            .join(format!(".{name}.{}.part", uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&partial, &data).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(OpenError::Io(format!("write {}: {e}", partial.display())));
        }
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("{} was filled concurrently", path.display());
                return Ok(CachedFile {
                    path,
                    downloaded: true,
                });
            }
            return Err(OpenError::Io(format!("rename into {}: {e}", path.display())));
        }
        info!("cached {} ({} bytes)", path.display(), data.len());

        Ok(CachedFile {
            path,
            downloaded: true,
        })
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
