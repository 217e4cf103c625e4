pub mod attachment;
pub mod error;
pub mod mime;
pub mod storage_ref;

pub use attachment::{AttachmentRef, ParentKind, ParentRecord};
pub use error::CoreError;
pub use storage_ref::{CandidateKeys, Resolution};
