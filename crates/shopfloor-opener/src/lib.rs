mod cache;
mod error;
mod fetch;
pub mod host;
pub mod mock;
mod opener;
mod platform;

pub use cache::{AttachmentCache, CachedFile};
pub use error::OpenError;
pub use fetch::{validate_download, FetchedBody, Fetcher, HttpFetcher};
pub use host::command::CommandHost;
pub use host::HostServices;
pub use opener::{AttachmentOpener, Opened};
pub use platform::Platform;
