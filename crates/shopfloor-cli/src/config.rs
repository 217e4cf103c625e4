use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shopfloor_core::ParentKind;
use shopfloor_opener::{CommandHost, Platform};

#[derive(Debug, Parser)]
#[command(name = "shopfloor-attach", about = "Upload, resolve and open shopfloor attachments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download (if needed) and open an attachment
    Open(OpenArgs),
    /// Print the access URL for a storage reference
    Resolve {
        /// Persisted storage reference (key, bucket-prefixed key or URL)
        reference: String,
        /// Display filename, tried when the reference is an opaque id
        #[arg(long)]
        filename: Option<String>,
    },
    /// Upload a file for an event, work order or production order and print
    /// the attachment record as JSON
    Upload {
        /// Parent kind: event, work_order or production_order
        #[arg(long, value_parser = parse_parent_kind)]
        kind: ParentKind,
        /// Parent record id
        #[arg(long)]
        parent_id: String,
        /// File to upload
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Persisted storage reference of the attachment
    pub storage_path: String,

    /// Display filename of the attachment
    #[arg(long)]
    pub filename: String,

    /// MIME type; inferred from the filename when omitted
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Host environment: auto, browser, android or ios
    #[arg(long, env = "SHOPFLOOR_PLATFORM", default_value = "auto")]
    pub platform: String,

    /// Directory holding cached downloads
    #[arg(long, env = "SHOPFLOOR_ATTACHMENTS_DIR")]
    pub attachments_dir: Option<PathBuf>,

    /// Directory browser-style downloads are saved into
    #[arg(long, env = "SHOPFLOOR_DOWNLOADS_DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Command used to view a file
    #[arg(long, env = "SHOPFLOOR_VIEWER")]
    pub viewer: Option<String>,

    /// Command used to share a file; sharing is unavailable without one
    #[arg(long, env = "SHOPFLOOR_SHARE_COMMAND")]
    pub share_command: Option<String>,
}

impl OpenArgs {
    pub fn platform(&self) -> Platform {
        Platform::parse_str(&self.platform)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.attachments_dir
            .clone()
            .unwrap_or_else(|| data_home().join("shopfloor/attachments"))
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.downloads_dir.clone().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|h| PathBuf::from(h).join("Downloads"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn viewer(&self) -> String {
        self.viewer
            .clone()
            .unwrap_or_else(|| CommandHost::default_viewer().to_string())
    }
}

fn data_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    }
}

fn parse_parent_kind(s: &str) -> Result<ParentKind, String> {
    ParentKind::parse_str(s)
        .ok_or_else(|| format!("unknown parent kind '{s}' (expected event, work_order or production_order)"))
}
