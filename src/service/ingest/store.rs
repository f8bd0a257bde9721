use std::path::PathBuf;

use uuid::Uuid;

use crate::shared::ports::media_store::{MediaStorePort, StoreError, StoreFuture};

/// Route the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/static/uploads";

/// Writes uploads into a local directory that the HTTP layer serves
/// statically.
pub struct LocalMediaStore {
    dir: PathBuf,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MediaStorePort for LocalMediaStore {
    fn put(&self, bytes: Vec<u8>, extension: &'static str) -> StoreFuture<Result<String, StoreError>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
            let path = dir.join(&file_name);
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            log::info!("[ingest] stored {} bytes at {}", bytes.len(), path.display());
            Ok(format!("{}/{}", UPLOADS_ROUTE, file_name))
        })
    }
}
