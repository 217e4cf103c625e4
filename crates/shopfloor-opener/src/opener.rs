use std::path::PathBuf;
use std::sync::Arc;

use shopfloor_core::mime::mime_for_filename;
use shopfloor_core::storage_ref::is_local_uri;
use shopfloor_core::AttachmentRef;
use shopfloor_store::SignedUrlProvider;
use tracing::{error, info, warn};

use crate::cache::AttachmentCache;
use crate::fetch::{validate_download, Fetcher};
use crate::host::HostServices;
use crate::{OpenError, Platform};

const ALERT_TITLE: &str = "Could not open attachment";

/// What an open ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// Browser: bytes handed to a save-as download.
    Saved { filename: String },
    /// Native viewer launched.
    Viewed { uri: String },
    /// Share sheet presented.
    Shared { uri: String },
}

/// Downloads or locates an attachment and opens it the way the host platform
/// expects.
pub struct AttachmentOpener {
    platform: Platform,
    urls: SignedUrlProvider,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn HostServices>,
    cache: AttachmentCache,
}

impl AttachmentOpener {
    pub fn new(
        platform: Platform,
        urls: SignedUrlProvider,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn HostServices>,
        cache: AttachmentCache,
    ) -> Self {
        Self {
            platform,
            urls,
            fetcher,
            host,
            cache,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Open an attachment, reporting any failure to the user as one alert.
    /// Returns whether the attachment was opened.
    pub async fn open_or_alert(&self, attachment: &AttachmentRef) -> bool {
        match self.open(attachment).await {
            Ok(opened) => {
                info!("opened {}: {opened:?}", attachment.filename);
                true
            }
            Err(e) => {
                error!(
                    "failed to open {} ({}) on {}: {e}",
                    attachment.filename, attachment.storage_path, self.platform
                );
                self.host.alert(ALERT_TITLE, &e.to_string());
                false
            }
        }
    }

    pub async fn open(&self, attachment: &AttachmentRef) -> Result<Opened, OpenError> {
        let mime = mime_type(attachment);
        match &self.platform {
            Platform::Browser => self.open_in_browser(attachment, &mime).await,
            Platform::Android => self.open_on_device(attachment, &mime, false).await,
            Platform::Ios => self.open_on_device(attachment, &mime, true).await,
            Platform::Unsupported(name) => Err(OpenError::Unsupported(name.clone())),
        }
    }

    async fn open_in_browser(
        &self,
        attachment: &AttachmentRef,
        mime: &str,
    ) -> Result<Opened, OpenError> {
        let filename = display_filename(attachment);
        let data = self.download(attachment, &filename, mime).await?;
        self.host.save_as(&filename, mime, data).await?;
        Ok(Opened::Saved { filename })
    }

    async fn open_on_device(
        &self,
        attachment: &AttachmentRef,
        mime: &str,
        share_only: bool,
    ) -> Result<Opened, OpenError> {
        let reference = attachment.storage_path.trim();
        let uri = if is_local_uri(reference) {
            self.locate_local(reference, share_only).await?
        } else {
            let filename = display_filename(attachment);
            let cached = self
                .cache
                .get_or_download(&filename, || self.download(attachment, &filename, mime))
                .await?;
            self.device_uri(cached.path, share_only).await?
        };

        if share_only {
            return self.share(&uri, mime).await;
        }

        match self.host.view(&uri, mime).await {
            Ok(()) => Ok(Opened::Viewed { uri }),
            Err(e) => {
                warn!("view failed on {}: {e}; trying share sheet", self.host.name());
                if !self.host.share_available() {
                    return Err(OpenError::Unavailable(
                        "an app that can open this file".into(),
                    ));
                }
                self.share(&uri, mime).await
            }
        }
    }

    async fn share(&self, uri: &str, mime: &str) -> Result<Opened, OpenError> {
        if !self.host.share_available() {
            return Err(OpenError::Unavailable("sharing".into()));
        }
        self.host.share(uri, mime).await?;
        Ok(Opened::Shared {
            uri: uri.to_string(),
        })
    }

    /// A reference that already points at the device: check it is still
    /// there and return the URI to hand to the host.
    async fn locate_local(&self, reference: &str, share_only: bool) -> Result<String, OpenError> {
        let Ok(parsed) = url::Url::parse(reference) else {
            return Err(OpenError::LocalNotFound(reference.to_string()));
        };
        if parsed.scheme() != "file" {
            if self.host.content_exists(reference).await {
                return Ok(reference.to_string());
            }
            return Err(OpenError::LocalNotFound(reference.to_string()));
        }
        let path = parsed
            .to_file_path()
            .map_err(|_| OpenError::LocalNotFound(reference.to_string()))?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(OpenError::LocalNotFound(path.display().to_string()));
        }
        self.device_uri(path, share_only).await
    }

    /// Android hands out content URIs; iOS shares the file URL itself.
    async fn device_uri(&self, path: PathBuf, share_only: bool) -> Result<String, OpenError> {
        if share_only {
            url::Url::from_file_path(&path)
                .map(|u| u.to_string())
                .map_err(|_| OpenError::Io(format!("not an absolute path: {}", path.display())))
        } else {
            self.host.content_uri(&path).await
        }
    }

    async fn download(
        &self,
        attachment: &AttachmentRef,
        filename: &str,
        mime: &str,
    ) -> Result<bytes::Bytes, OpenError> {
        let access = self
            .urls
            .resolve(&attachment.storage_path, Some(filename))
            .await?;
        info!("downloading {filename} from {}", access.key);
        let fetched = self.fetcher.fetch(&access.url).await?;
        validate_download(fetched, mime)
    }
}

fn mime_type(attachment: &AttachmentRef) -> String {
    if attachment.mime_type.trim().is_empty() {
        mime_for_filename(&display_filename(attachment)).to_string()
    } else {
        attachment.mime_type.clone()
    }
}

/// The filename to save or cache under; falls back to the last segment of
/// the storage reference for records without one.
fn display_filename(attachment: &AttachmentRef) -> String {
    if !attachment.filename.trim().is_empty() {
        return attachment.filename.clone();
    }
    let last = attachment
        .storage_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if last.is_empty() {
        "attachment".to_string()
    } else {
        last.to_string()
    }
}
