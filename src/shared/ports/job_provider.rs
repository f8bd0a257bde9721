use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::shared::entities::{JobId, MediaRef};
use crate::shared::error::{ProviderError, SubmissionError};

pub type ProviderFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Normalized answer to one status query.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStatus {
    Pending,
    Running,
    Done(Value),
    Failed(String),
}

/// Remote "create job / get job status" API of an analysis provider.
pub trait JobProviderPort: Send + Sync {
    fn create_job(&self, media: MediaRef) -> ProviderFuture<Result<JobId, SubmissionError>>;
    fn job_status(&self, job_id: JobId) -> ProviderFuture<Result<ProviderStatus, ProviderError>>;
}
