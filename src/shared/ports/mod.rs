pub mod job_provider;
pub mod media_store;
pub mod reply;
pub mod session_store;

pub use job_provider::{JobProviderPort, ProviderFuture, ProviderStatus};
pub use media_store::{MediaStorePort, StoreError, StoreFuture};
pub use reply::{ReplyFuture, ReplyPort};
pub use session_store::SessionStorePort;
