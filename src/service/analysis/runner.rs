use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::sleep;

use crate::shared::entities::{AnalysisJob, EmotionResult, JobState, MediaRef};
use crate::shared::error::{AnalysisError, PollError, ProviderError};
use crate::shared::ports::{JobProviderPort, ProviderStatus};

use super::extract::{extract_emotions, ExtractionPaths};
use super::retry::RetryPolicy;

/// Drives one provider job from submission to a terminal state.
///
/// A job id, once obtained, is never resubmitted. Failed status queries count
/// against the same attempt budget as pending ones. When the budget runs out
/// the outcome depends on the last query: a transport failure yields
/// `PollError::TransientExhausted`, a pending answer yields `Timeout`.
pub struct AsyncAnalysisJobRunner {
    provider: Arc<dyn JobProviderPort>,
    paths: ExtractionPaths,
    policy: RetryPolicy,
}

impl AsyncAnalysisJobRunner {
    pub fn new(provider: Arc<dyn JobProviderPort>, paths: ExtractionPaths, policy: RetryPolicy) -> Self {
        Self {
            provider,
            paths,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs with the runner's default policy.
    pub async fn analyze(&self, media: MediaRef) -> Result<EmotionResult, AnalysisError> {
        self.submit_and_await(media, &self.policy).await
    }

    pub async fn submit_and_await(
        &self,
        media: MediaRef,
        policy: &RetryPolicy,
    ) -> Result<EmotionResult, AnalysisError> {
        let media_kind = media.kind();
        let job_id = self.provider.create_job(media).await.map_err(|err| {
            warn!("[analysis] job submission failed: {}", err);
            err
        })?;

        let mut job = AnalysisJob::new(job_id);
        job.transition(JobState::Pending)?;
        info!(
            "[analysis] job {} submitted (media={}, max_attempts={}, budget={:?})",
            job.id(),
            media_kind,
            policy.max_attempts,
            policy.budget()
        );

        let mut last_error: Option<ProviderError> = None;
        while job.attempts() < policy.max_attempts {
            let delay = policy.delay_for(job.attempts() + 1);
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let attempt = job.record_attempt()?;

            match self.provider.job_status(job.id().clone()).await {
                Ok(ProviderStatus::Pending) | Ok(ProviderStatus::Running) => {
                    last_error = None;
                    job.transition(JobState::Pending)?;
                    debug!("[analysis] job {} still pending (attempt {})", job.id(), attempt);
                }
                Ok(ProviderStatus::Done(payload)) => {
                    job.complete(payload)?;
                    info!(
                        "[analysis] job {} done after {} attempts ({} ms)",
                        job.id(),
                        attempt,
                        elapsed_ms(&job)
                    );
                    let Some(payload) = job.take_result() else {
                        return Err(AnalysisError::NoPredictions);
                    };
                    return extract_emotions(&payload, &self.paths).map_err(|err| {
                        warn!("[analysis] job {} result rejected: {}", job.id(), err);
                        err
                    });
                }
                Ok(ProviderStatus::Failed(reason)) => {
                    job.transition(JobState::Failed)?;
                    warn!("[analysis] job {} failed on provider: {}", job.id(), reason);
                    return Err(PollError::ProviderFailed {
                        job_id: job.id().to_string(),
                        reason,
                    }
                    .into());
                }
                Err(err) => {
                    warn!(
                        "[analysis] job {} status check {}/{} failed: {}",
                        job.id(),
                        attempt,
                        policy.max_attempts,
                        err
                    );
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => {
                job.transition(JobState::Failed)?;
                warn!(
                    "[analysis] job {} abandoned after {} failed status checks",
                    job.id(),
                    job.attempts()
                );
                Err(PollError::TransientExhausted {
                    attempts: job.attempts(),
                    last_error: err.to_string(),
                }
                .into())
            }
            None => {
                job.transition(JobState::TimedOut)?;
                warn!(
                    "[analysis] job {} timed out after {} attempts ({} ms)",
                    job.id(),
                    job.attempts(),
                    elapsed_ms(&job)
                );
                Err(AnalysisError::Timeout {
                    job_id: job.id().to_string(),
                    attempts: job.attempts(),
                })
            }
        }
    }
}

fn elapsed_ms(job: &AnalysisJob) -> i64 {
    (Utc::now() - job.submitted_at()).num_milliseconds()
}
