use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{ObjectStore, StoreError};

/// In-memory store for tests. Records every signing request and can be told
/// to refuse particular expiry windows or to fail its session check.
pub struct MockStore {
    bucket: Option<String>,
    url_base: String,
    public_base: Option<String>,
    objects: Mutex<HashMap<String, Bytes>>,
    refused_ttls: Vec<Duration>,
    session_ok: bool,
    empty_urls: bool,
    sign_calls: Mutex<Vec<(String, Duration)>>,
}

impl MockStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: Some(bucket.to_string()),
            url_base: "https://storage.test".to_string(),
            public_base: None,
            objects: Mutex::new(HashMap::new()),
            refused_ttls: Vec::new(),
            session_ok: true,
            empty_urls: false,
            sign_calls: Mutex::new(Vec::new()),
        }
    }

    /// Seed objects that exist in the store.
    pub fn with_objects<D: AsRef<[u8]>>(self, objects: Vec<(&str, D)>) -> Self {
        {
            let mut map = self.objects.lock().unwrap_or_else(|e| e.into_inner());
            for (key, data) in objects {
                map.insert(key.to_string(), Bytes::copy_from_slice(data.as_ref()));
            }
        }
        self
    }

    /// Base of the URLs handed out by `signed_url`.
    pub fn with_url_base(mut self, base: &str) -> Self {
        self.url_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Serve public URLs under this base.
    pub fn with_public_base(mut self, base: &str) -> Self {
        self.public_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    /// Fail every signing request made with this expiry.
    pub fn refusing_ttl(mut self, ttl: Duration) -> Self {
        self.refused_ttls.push(ttl);
        self
    }

    pub fn with_failing_session(mut self) -> Self {
        self.session_ok = false;
        self
    }

    /// Answer signing requests with an empty URL.
    pub fn with_empty_urls(mut self) -> Self {
        self.empty_urls = true;
        self
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Signing requests seen so far, in order.
    pub fn sign_calls(&self) -> Vec<(String, Duration)> {
        self.sign_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key))
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_base.as_ref().map(|base| format!("{base}/{key}"))
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        self.sign_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key.to_string(), ttl));
        if self.refused_ttls.contains(&ttl) {
            return Err(StoreError::Internal(format!(
                "signing refused for {}s expiry",
                ttl.as_secs()
            )));
        }
        if !self.exists(key).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        if self.empty_urls {
            return Ok(String::new());
        }
        Ok(format!("{}/{key}?expires={}", self.url_base, ttl.as_secs()))
    }

    async fn check_session(&self) -> Result<(), StoreError> {
        if self.session_ok {
            Ok(())
        } else {
            Err(StoreError::Internal("session expired".into()))
        }
    }
}
