use bytes::Bytes;
use chrono::Utc;
use shopfloor_core::mime::sanitize_filename;
use shopfloor_core::{AttachmentRef, ParentRecord};
use tracing::info;

use crate::{attachment_key, storage_path, ObjectStore, StoreError};

/// Store a user-picked file for a parent record and return the record to
/// persist in the parent's attachment list.
///
/// The caller adds the returned ref to the parent; nothing is attached here.
pub async fn upload_attachment(
    store: &dyn ObjectStore,
    parent: &ParentRecord,
    filename: &str,
    data: Bytes,
) -> Result<AttachmentRef, StoreError> {
    if data.is_empty() {
        return Err(StoreError::InvalidInput(format!("{filename} is empty")));
    }
    let safe_name = sanitize_filename(filename);
    let key = attachment_key(
        parent.kind,
        &parent.id,
        Utc::now().timestamp_millis(),
        &safe_name,
    );
    store.put(&key, data).await?;
    info!("uploaded {filename} for {} {} as {key}", parent.kind, parent.id);

    Ok(AttachmentRef::new(
        filename,
        &storage_path(store.bucket(), &key),
    ))
}
