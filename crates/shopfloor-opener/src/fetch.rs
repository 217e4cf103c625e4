use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use shopfloor_core::mime::is_image_mime;
use tracing::debug;

use crate::OpenError;

/// Bodies larger than this are never sniffed for a JSON error envelope.
const ENVELOPE_SNIFF_LIMIT: usize = 64 * 1024;

/// Raw result of fetching an access URL.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedBody {
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, OpenError>;
}

/// Fetches `http(s)` URLs with reqwest and `file://` URLs from disk.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, OpenError> {
        if let Ok(parsed) = url::Url::parse(url) {
            if parsed.scheme() == "file" {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| OpenError::Transfer(format!("bad file url: {url}")))?;
                return match tokio::fs::read(&path).await {
                    Ok(data) => Ok(FetchedBody {
                        status: 200,
                        content_type: None,
                        body: Bytes::from(data),
                    }),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(OpenError::LocalNotFound(path.display().to_string()))
                    }
                    Err(e) => Err(OpenError::Io(format!("read {}: {e}", path.display()))),
                };
            }
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OpenError::Transfer(format!("request failed: {e}")))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .map_err(|e| OpenError::Transfer(format!("read body: {e}")))?;
        debug!("fetched {} bytes (status {status})", body.len());
        Ok(FetchedBody {
            status,
            content_type,
            body,
        })
    }
}

/// Reject responses that are not the attachment: non-2xx statuses, JSON
/// error envelopes served with a 200, and empty bodies for non-images.
pub fn validate_download(fetched: FetchedBody, mime_type: &str) -> Result<Bytes, OpenError> {
    if !fetched.is_success() {
        return Err(OpenError::Transfer(format!(
            "server responded with status {}",
            fetched.status
        )));
    }

    if let Some(msg) = error_envelope(&fetched, mime_type) {
        return Err(OpenError::Transfer(format!("storage returned an error: {msg}")));
    }

    if fetched.body.is_empty() && !is_image_mime(mime_type) {
        return Err(OpenError::Transfer("the downloaded file is empty".into()));
    }

    Ok(fetched.body)
}

fn error_envelope(fetched: &FetchedBody, mime_type: &str) -> Option<String> {
    if mime_type.contains("json") || fetched.body.len() > ENVELOPE_SNIFF_LIMIT {
        return None;
    }
    let json_typed = fetched
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    let parsed = serde_json::from_slice::<serde_json::Value>(&fetched.body).ok();
    if let Some(serde_json::Value::Object(map)) = &parsed {
        for field in ["error", "message", "statusCode"] {
            if let Some(value) = map.get(field) {
                return Some(match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            }
        }
    }
    json_typed.then(|| "unexpected JSON response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: &str, body: &'static [u8]) -> FetchedBody {
        FetchedBody {
            status,
            content_type: Some(content_type.into()),
            body: Bytes::from_static(body),
        }
    }

    #[test]
    fn rejects_non_success_status() {
        let err = validate_download(response(403, "text/html", b"denied"), "application/pdf")
            .unwrap_err();
        assert!(matches!(err, OpenError::Transfer(_)));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn rejects_json_error_envelope_with_ok_status() {
        let body = br#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#;
        let err = validate_download(response(200, "application/octet-stream", body), "application/pdf")
            .unwrap_err();
        assert!(err.to_string().contains("not_found"), "{err}");

        let err = validate_download(response(200, "application/json", b"[]"), "image/png")
            .unwrap_err();
        assert!(err.to_string().contains("unexpected JSON"));
    }

    #[test]
    fn empty_body_only_allowed_for_images() {
        let err = validate_download(response(200, "application/pdf", b""), "application/pdf")
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(validate_download(response(200, "image/png", b""), "image/png").is_ok());
    }

    #[test]
    fn accepts_regular_content() {
        let body = validate_download(response(200, "application/pdf", b"%PDF-1.4"), "application/pdf")
            .unwrap();
        assert_eq!(body.as_ref(), b"%PDF-1.4");

        // A CSV that happens to be valid JSON text is still content.
        let body = validate_download(response(200, "text/csv", b"42"), "text/csv").unwrap();
        assert_eq!(body.as_ref(), b"42");
    }

    #[tokio::test]
    async fn file_urls_read_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();
        let fetcher = HttpFetcher::new();

        let url = url::Url::from_file_path(&path).unwrap();
        let got = fetcher.fetch(url.as_str()).await.unwrap();
        assert!(got.is_success());
        assert_eq!(got.body.as_ref(), b"hello");

        let missing = url::Url::from_file_path(tmp.path().join("b.txt")).unwrap();
        let err = fetcher.fetch(missing.as_str()).await.unwrap_err();
        assert!(matches!(err, OpenError::LocalNotFound(_)));
    }
}
