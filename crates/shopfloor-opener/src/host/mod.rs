pub mod command;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::OpenError;

/// Native capabilities of the device or browser the opener runs in.
///
/// The opener only decides *which* of these to use and in what order;
/// each implementation maps them onto what the host actually offers.
#[async_trait]
pub trait HostServices: Send + Sync {
    /// Human-readable host name for logging.
    fn name(&self) -> &str;

    /// Hand downloaded bytes to a client-side save-as download (browser).
    async fn save_as(&self, filename: &str, mime_type: &str, data: Bytes) -> Result<(), OpenError>;

    /// Turn a local file into a URI other apps may read (content URI on Android).
    async fn content_uri(&self, path: &Path) -> Result<String, OpenError>;

    /// Whether a non-file local URI (content://, ph://) still resolves.
    async fn content_exists(&self, uri: &str) -> bool;

    /// Launch the native viewer for a URI.
    async fn view(&self, uri: &str, mime_type: &str) -> Result<(), OpenError>;

    fn share_available(&self) -> bool;

    /// Present the generic share sheet for a URI.
    async fn share(&self, uri: &str, mime_type: &str) -> Result<(), OpenError>;

    /// Show a single human-readable alert.
    fn alert(&self, title: &str, message: &str);
}
