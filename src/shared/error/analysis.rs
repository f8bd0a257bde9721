use thiserror::Error;

use crate::shared::entities::JobError;

/// Job creation failed; no job exists on the provider side.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("provider rejected job (status {status}): {body}")]
    ProviderRejected { status: u16, body: String },
    #[error("provider response carried no job id")]
    NoJobId,
    #[error("job submission transport error: {0}")]
    Transport(String),
    #[error("media could not be attached to the job: {0}")]
    InvalidMedia(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("status polling gave up after {attempts} attempts: {last_error}")]
    TransientExhausted { attempts: u32, last_error: String },
    #[error("provider reported job {job_id} failed: {reason}")]
    ProviderFailed { job_id: String, reason: String },
}

/// The provider answered, but not in the shape we expect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected response shape at {path}: {detail}")]
    UnexpectedShape { path: String, detail: String },
}

impl ParseError {
    pub fn shape(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// A single failed status query. Absorbed by the runner until the attempt
/// budget runs out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error("job {job_id} still pending after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },
    #[error("provider returned no predictions")]
    NoPredictions,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Job(#[from] JobError),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Submission(_) => "submission",
            Self::Poll(_) => "poll",
            Self::Timeout { .. } => "timeout",
            Self::NoPredictions => "no_predictions",
            Self::Parse(_) => "parse",
            Self::Job(_) => "job_state",
        }
    }
}
