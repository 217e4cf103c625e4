use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use shopfloor_core::{AttachmentRef, ParentKind, ParentRecord};
use shopfloor_opener::{AttachmentCache, AttachmentOpener, CommandHost, HttpFetcher};
use shopfloor_store::{upload_attachment, HttpProbe, ObjectStore, SignedUrlProvider};
use tracing::info;

use crate::config::OpenArgs;

fn provider(store: Arc<dyn ObjectStore>) -> SignedUrlProvider {
    SignedUrlProvider::new(store, Arc::new(HttpProbe::new()))
}

/// Open an attachment. Failures are shown as an alert rather than returned;
/// the result says whether the open went through.
pub async fn open(args: &OpenArgs, store: Arc<dyn ObjectStore>) -> bool {
    let platform = args.platform();
    info!("opening {} on {platform}", args.filename);

    let mut attachment = AttachmentRef::new(&args.filename, &args.storage_path);
    if let Some(mime) = &args.mime_type {
        attachment.mime_type = mime.clone();
    }

    let host = Arc::new(CommandHost::new(
        args.downloads_dir(),
        &args.viewer(),
        args.share_command.clone(),
    ));
    let opener = AttachmentOpener::new(
        platform,
        provider(store),
        Arc::new(HttpFetcher::new()),
        host,
        AttachmentCache::new(args.attachments_dir()),
    );
    opener.open_or_alert(&attachment).await
}

pub async fn resolve(
    store: Arc<dyn ObjectStore>,
    reference: &str,
    filename: Option<&str>,
) -> Result<String> {
    let access = provider(store)
        .resolve(reference, filename)
        .await
        .with_context(|| format!("resolve {reference}"))?;
    Ok(access.url)
}

pub async fn upload(
    store: &dyn ObjectStore,
    kind: ParentKind,
    parent_id: &str,
    file: &Path,
) -> Result<AttachmentRef> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("upload path has no file name")?;
    let parent = ParentRecord::new(kind, parent_id);
    let attachment = upload_attachment(store, &parent, &filename, Bytes::from(data)).await?;
    Ok(attachment)
}
