use std::sync::Arc;
use std::time::Duration;

use shopfloor_core::storage_ref::{self, CandidateKeys, Resolution};
use tracing::{debug, info, warn};

use crate::{ObjectStore, StoreError, UrlProbe};

/// Expiry requested first.
pub const PRIMARY_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Shorter expiry requested once the primary window is refused.
pub const RETRY_TTL: Duration = Duration::from_secs(60 * 60);

/// An access URL good for a single open/download. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrl {
    pub url: String,
    /// The object key (or pass-through reference) the URL was issued for.
    pub key: String,
    /// `None` for public and pass-through URLs.
    pub ttl: Option<Duration>,
}

/// Obtains a fetchable URL for a stored attachment.
///
/// Attempts, first success wins:
/// 1. public URL for the primary key, if it answers a probe
/// 2. signed URL for the primary key, 24h
/// 3. signed URL for the fallback filename, 24h
/// 4. primary key again, 1h
/// 5. fallback filename again, 1h
pub struct SignedUrlProvider {
    store: Arc<dyn ObjectStore>,
    probe: Arc<dyn UrlProbe>,
}

impl SignedUrlProvider {
    pub fn new(store: Arc<dyn ObjectStore>, probe: Arc<dyn UrlProbe>) -> Self {
        Self { store, probe }
    }

    /// Resolve a persisted storage reference and get an access URL for it.
    /// Full URLs and local URIs come back untouched without any store call.
    pub async fn resolve(
        &self,
        reference: &str,
        fallback_filename: Option<&str>,
    ) -> Result<AccessUrl, StoreError> {
        let bucket = self.store.bucket().unwrap_or_default();
        match storage_ref::resolve(reference, fallback_filename, bucket) {
            Resolution::PassThrough(url) => {
                debug!("storage reference is already a URL: {url}");
                Ok(AccessUrl {
                    key: url.clone(),
                    url,
                    ttl: None,
                })
            }
            Resolution::Keys(keys) => self.access_url(&keys).await,
            Resolution::Empty => Err(StoreError::SignedUrl(
                "attachment has no storage reference or filename".into(),
            )),
        }
    }

    pub async fn access_url(&self, keys: &CandidateKeys) -> Result<AccessUrl, StoreError> {
        if let Some(url) = self.store.public_url(&keys.primary) {
            if self.probe.is_reachable(&url).await {
                info!("using public url for {}", keys.primary);
                return Ok(AccessUrl {
                    url,
                    key: keys.primary.clone(),
                    ttl: None,
                });
            }
            debug!("public url for {} not reachable", keys.primary);
        }

        if let Err(e) = self.store.check_session().await {
            warn!("store session check failed: {e}");
        }

        let mut attempts = Vec::with_capacity(4);
        for ttl in [PRIMARY_TTL, RETRY_TTL] {
            for key in keys.ranked() {
                attempts.push((key, ttl));
            }
        }

        let mut last_error = String::from("no attempt made");
        for (key, ttl) in attempts {
            match self.store.signed_url(key, ttl).await {
                Ok(url) if !url.trim().is_empty() => {
                    info!("signed url for {key} ({}s)", ttl.as_secs());
                    return Ok(AccessUrl {
                        url,
                        key: key.to_string(),
                        ttl: Some(ttl),
                    });
                }
                Ok(_) => last_error = format!("store returned no signed URL for {key}"),
                Err(e) => last_error = e.to_string(),
            }
            warn!("signing {key} ({}s) failed: {last_error}", ttl.as_secs());
        }

        Err(StoreError::SignedUrl(format!(
            "{}: {last_error}",
            keys.primary
        )))
    }
}
