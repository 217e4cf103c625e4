//! Test doubles for the host and the network.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::fetch::{FetchedBody, Fetcher};
use crate::host::HostServices;
use crate::OpenError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SaveAs { filename: String, len: usize },
    View { uri: String, mime_type: String },
    Share { uri: String, mime_type: String },
    Alert { title: String, message: String },
}

/// Host that records what the opener asked of it.
pub struct RecordingHost {
    view_works: bool,
    share_available: bool,
    content: HashSet<String>,
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            view_works: true,
            share_available: true,
            content: HashSet::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_view(mut self) -> Self {
        self.view_works = false;
        self
    }

    pub fn without_share(mut self) -> Self {
        self.share_available = false;
        self
    }

    /// Make a content:// URI resolvable.
    pub fn with_content(mut self, uri: &str) -> Self {
        self.content.insert(uri.to_string());
        self
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, event: HostEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostServices for RecordingHost {
    fn name(&self) -> &str {
        "recording"
    }

    async fn save_as(&self, filename: &str, _mime_type: &str, data: Bytes) -> Result<(), OpenError> {
        self.record(HostEvent::SaveAs {
            filename: filename.to_string(),
            len: data.len(),
        });
        Ok(())
    }

    async fn content_uri(&self, path: &Path) -> Result<String, OpenError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(format!("content://shopfloor.fileprovider/attachments/{name}"))
    }

    async fn content_exists(&self, uri: &str) -> bool {
        self.content.contains(uri)
    }

    async fn view(&self, uri: &str, mime_type: &str) -> Result<(), OpenError> {
        if !self.view_works {
            return Err(OpenError::Unavailable("a viewer".into()));
        }
        self.record(HostEvent::View {
            uri: uri.to_string(),
            mime_type: mime_type.to_string(),
        });
        Ok(())
    }

    fn share_available(&self) -> bool {
        self.share_available
    }

    async fn share(&self, uri: &str, mime_type: &str) -> Result<(), OpenError> {
        if !self.share_available {
            return Err(OpenError::Unavailable("sharing".into()));
        }
        self.record(HostEvent::Share {
            uri: uri.to_string(),
            mime_type: mime_type.to_string(),
        });
        Ok(())
    }

    fn alert(&self, title: &str, message: &str) {
        self.record(HostEvent::Alert {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Fetcher that answers every URL with the same response and counts calls.
pub struct StaticFetcher {
    response: FetchedBody,
    urls: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(response: FetchedBody) -> Self {
        Self {
            response,
            urls: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, OpenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        Ok(self.response.clone())
    }
}
