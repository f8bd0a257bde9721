use thiserror::Error;

use crate::shared::ports::media_store::StoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("audio payload is empty")]
    EmptyPayload,
    #[error("audio could not be decoded: {0}")]
    InvalidAudio(String),
    #[error("media store failed: {0}")]
    Store(#[from] StoreError),
}
