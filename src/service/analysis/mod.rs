//! Emotion analysis against a remote job provider: submit, poll, extract.

pub mod extract;
pub mod retry;
pub mod runner;

pub use extract::{extract_emotions, rank_scores, ExtractionPaths};
pub use retry::RetryPolicy;
pub use runner::AsyncAnalysisJobRunner;
