use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Cheap existence check for a URL, used before trusting a public URL.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Probes `http(s)` URLs with `HEAD` and `file://` URLs on disk.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        if let Ok(parsed) = url::Url::parse(url) {
            if parsed.scheme() == "file" {
                return match parsed.to_file_path() {
                    Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
                    Err(()) => false,
                };
            }
        }
        match self.client.head(url).send().await {
            Ok(resp) => {
                debug!("probe {url}: {}", resp.status());
                resp.status().is_success()
            }
            Err(e) => {
                debug!("probe {url} failed: {e}");
                false
            }
        }
    }
}
