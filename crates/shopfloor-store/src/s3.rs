use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;
use shopfloor_core::mime::mime_for_filename;
use tracing::debug;

use crate::{ObjectStore, StoreConfig, StoreError};

/// Presigned URLs are capped at seven days by the S3 signature scheme.
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

pub struct S3Store {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_endpoint: Option<String>,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket_name)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let region = Region::Custom {
            region: config.region.clone().unwrap_or_else(|| "us-east-1".into()),
            endpoint: config.endpoint_url.clone().unwrap_or_default(),
        };

        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Internal(format!("credentials: {e}")))?;

        let bucket_name = config
            .bucket
            .as_deref()
            .ok_or_else(|| StoreError::Internal("bucket name required".into()))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StoreError::Internal(format!("bucket: {e}")))?;
        bucket.set_path_style();

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            public_endpoint: config
                .public_endpoint
                .as_deref()
                .map(|e| e.trim_end_matches('/').to_string())
                .filter(|e| !e.is_empty()),
        })
    }
}

fn map_s3_error(e: S3Error) -> StoreError {
    StoreError::Internal(format!("s3: {e}"))
}

fn presign_secs(ttl: Duration) -> u32 {
    ttl.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> Option<&str> {
        Some(&self.bucket_name)
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let content_type = mime_for_filename(key);
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(map_s3_error)?;
        if response.status_code() >= 300 {
            return Err(StoreError::Internal(format!(
                "s3 put {key}: status {}",
                response.status_code()
            )));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.bucket.head_object(key).await {
            Ok((_, code)) => Ok(code < 400),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("404") || msg.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(map_s3_error(e))
                }
            }
        }
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_endpoint.as_ref().map(|endpoint| {
            format!(
                "{endpoint}/{}/{}",
                self.bucket_name,
                key.trim_start_matches('/')
            )
        })
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidInput("empty object key".into()));
        }
        // Presigning is local; a missing object would only show up as a
        // 404 on first use, so check first to let callers fall back.
        if !self.exists(key).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let url = self
            .bucket
            .presign_get(key, presign_secs(ttl), None)
            .await
            .map_err(map_s3_error)?;
        debug!("presigned {key} for {}s", presign_secs(ttl));
        Ok(url)
    }

    async fn check_session(&self) -> Result<(), StoreError> {
        self.bucket
            .list("__session_check__/".to_string(), Some("/".to_string()))
            .await
            .map(|_| ())
            .map_err(map_s3_error)
    }
}
