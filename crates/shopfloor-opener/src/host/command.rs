use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use shopfloor_core::mime::sanitize_filename;
use tokio::process::Command;
use tracing::{debug, info};

use super::HostServices;
use crate::OpenError;

/// Host backed by external commands and a downloads directory.
///
/// Used by the command-line tool: "save as" writes into `downloads_dir`,
/// viewing runs `viewer <uri>`, sharing runs `share_command <uri>` when one is
/// configured, and alerts go to stderr.
pub struct CommandHost {
    downloads_dir: PathBuf,
    viewer: String,
    share_command: Option<String>,
}

impl CommandHost {
    pub fn new(downloads_dir: PathBuf, viewer: &str, share_command: Option<String>) -> Self {
        Self {
            downloads_dir,
            viewer: viewer.to_string(),
            share_command: share_command.filter(|c| !c.trim().is_empty()),
        }
    }

    /// The desktop opener for the current OS.
    pub fn default_viewer() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }

    async fn run(program: &str, uri: &str, what: &str) -> Result<(), OpenError> {
        let mut parts = program.split_whitespace();
        let Some(bin) = parts.next() else {
            return Err(OpenError::Unavailable(what.to_string()));
        };
        debug!("running {program} {uri}");
        let status = Command::new(bin)
            .args(parts)
            .arg(uri)
            .status()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OpenError::Unavailable(what.to_string()),
                _ => OpenError::Io(format!("{bin}: {e}")),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(OpenError::Unavailable(format!("{what} ({bin} exited with {status})")))
        }
    }
}

#[async_trait]
impl HostServices for CommandHost {
    fn name(&self) -> &str {
        "command"
    }

    async fn save_as(&self, filename: &str, _mime_type: &str, data: Bytes) -> Result<(), OpenError> {
        tokio::fs::create_dir_all(&self.downloads_dir)
            .await
            .map_err(|e| OpenError::Io(format!("mkdir {}: {e}", self.downloads_dir.display())))?;
        let path = self.downloads_dir.join(sanitize_filename(filename));
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| OpenError::Io(format!("write {}: {e}", path.display())))?;
        info!("saved {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    async fn content_uri(&self, path: &Path) -> Result<String, OpenError> {
        url::Url::from_file_path(path)
            .map(|u| u.to_string())
            .map_err(|_| OpenError::Io(format!("not an absolute path: {}", path.display())))
    }

    async fn content_exists(&self, _uri: &str) -> bool {
        false
    }

    async fn view(&self, uri: &str, _mime_type: &str) -> Result<(), OpenError> {
        Self::run(&self.viewer, uri, "a viewer").await
    }

    fn share_available(&self) -> bool {
        self.share_command.is_some()
    }

    async fn share(&self, uri: &str, _mime_type: &str) -> Result<(), OpenError> {
        match &self.share_command {
            Some(cmd) => Self::run(cmd, uri, "sharing").await,
            None => Err(OpenError::Unavailable("sharing".into())),
        }
    }

    fn alert(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}
