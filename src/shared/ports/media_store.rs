use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub type StoreFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
}

pub trait MediaStorePort: Send + Sync {
    /// Persists `bytes` and returns the server-relative path it is served under.
    fn put(&self, bytes: Vec<u8>, extension: &'static str) -> StoreFuture<Result<String, StoreError>>;
}
