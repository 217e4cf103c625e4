mod local;
pub mod mock;
mod probe;
#[cfg(feature = "s3")]
mod s3;
mod signed;
mod upload;

pub use local::LocalStore;
pub use probe::{HttpProbe, UrlProbe};
#[cfg(feature = "s3")]
pub use s3::S3Store;
pub use signed::{AccessUrl, SignedUrlProvider, PRIMARY_TTL, RETRY_TTL};
pub use upload::upload_attachment;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use shopfloor_core::ParentKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not get an access URL: {0}")]
    SignedUrl(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// Client interface to the object store holding attachment content.
///
/// Passed around as `Arc<dyn ObjectStore>` so the resolver, the signed URL
/// provider and the opener can all run against a test double.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, if the backend has one. Used to strip bucket prefixes
    /// from persisted storage references.
    fn bucket(&self) -> Option<&str> {
        None
    }

    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Unauthenticated URL for an object, when the backend serves one.
    /// The URL is not checked; callers probe it before use.
    fn public_url(&self, _key: &str) -> Option<String> {
        None
    }

    /// Time-limited read URL for an object.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Verify the store session/credentials are usable.
    async fn check_session(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// -- Key helpers --

/// Key for a newly uploaded attachment. The timestamp keeps repeated uploads
/// of the same filename from overwriting each other.
pub fn attachment_key(kind: ParentKind, parent_id: &str, stamp_millis: i64, filename: &str) -> String {
    format!("{}/{parent_id}/{stamp_millis}_{filename}", kind.as_str())
}

/// The `storage_path` persisted on an attachment: `<bucket>/<key>` when the
/// store has a bucket, else the bare key.
pub fn storage_path(bucket: Option<&str>, key: &str) -> String {
    match bucket {
        Some(b) if !b.is_empty() => format!("{b}/{key}"),
        _ => key.to_string(),
    }
}

// -- Configuration --

/// Configuration for the object store backend.
pub struct StoreConfig {
    /// S3-compatible endpoint URL (e.g., "http://127.0.0.1:3900").
    /// When `None`, use local filesystem.
    pub endpoint_url: Option<String>,
    /// Base URL that serves public objects as `<public_endpoint>/<bucket>/<key>`.
    pub public_endpoint: Option<String>,
    /// S3 region (e.g., "garage", "us-east-1").
    pub region: Option<String>,
    /// S3 bucket name.
    pub bucket: Option<String>,
    /// AWS access key ID.
    pub access_key_id: Option<String>,
    /// AWS secret access key.
    pub secret_access_key: Option<String>,
    /// Local filesystem base directory (used when S3 is not configured).
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from environment variables.
    /// If `SHOPFLOOR_S3_ENDPOINT` (or `AWS_ENDPOINT_URL`) is set along with
    /// credentials and a bucket name, use S3. Otherwise, fall back to local filesystem.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: std::env::var("SHOPFLOOR_S3_ENDPOINT")
                .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
                .ok(),
            public_endpoint: std::env::var("SHOPFLOOR_S3_PUBLIC_ENDPOINT").ok(),
            region: std::env::var("SHOPFLOOR_S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .ok(),
            bucket: std::env::var("SHOPFLOOR_S3_BUCKET").ok(),
            access_key_id: std::env::var("SHOPFLOOR_S3_ACCESS_KEY_ID")
                .or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_access_key: std::env::var("SHOPFLOOR_S3_SECRET_ACCESS_KEY")
                .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            local_data_dir: std::env::var("SHOPFLOOR_DATA_DIR").ok(),
        }
    }

    pub fn is_s3(&self) -> bool {
        self.endpoint_url.is_some()
            && self.access_key_id.is_some()
            && self.secret_access_key.is_some()
            && self.bucket.is_some()
    }
}

// -- Factory --

/// Create an `ObjectStore` from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    if config.is_s3() {
        #[cfg(feature = "s3")]
        {
            Ok(Arc::new(S3Store::new(config)?))
        }
        #[cfg(not(feature = "s3"))]
        {
            Err(StoreError::Internal(
                "S3 configuration detected but the 's3' feature is not enabled".into(),
            ))
        }
    } else {
        Ok(Arc::new(LocalStore::new(config)))
    }
}
