use shopfloor_store::StoreError;
use thiserror::Error;

/// Why an attachment could not be opened. `Display` is the text shown to the user.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("{0}")]
    AccessUrl(#[from] StoreError),

    #[error("download failed: {0}")]
    Transfer(String),

    #[error("file not found on this device: {0}")]
    LocalNotFound(String),

    #[error("{0} is not available on this device")]
    Unavailable(String),

    #[error("opening attachments is not supported on {0}")]
    Unsupported(String),

    #[error("file system error: {0}")]
    Io(String),
}
