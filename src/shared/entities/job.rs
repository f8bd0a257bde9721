use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::shared::entities::identifiers::JobId;

/// One provider job as tracked by the runner. Dropped once the result is
/// consumed or the job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    id: JobId,
    state: JobState,
    submitted_at: DateTime<Utc>,
    attempts: u32,
    result: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Pending,
    Done,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::TimedOut)
    }
}

impl AnalysisJob {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            state: JobState::Submitted,
            submitted_at: Utc::now(),
            attempts: 0,
            result: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn transition(&mut self, to_state: JobState) -> Result<(), JobError> {
        match (self.state, to_state) {
            (JobState::Submitted, JobState::Pending) => Ok(()),
            (JobState::Submitted, JobState::Failed) => Ok(()),
            (JobState::Pending, JobState::Pending) => Ok(()),
            (JobState::Pending, JobState::Done) => Ok(()),
            (JobState::Pending, JobState::Failed) => Ok(()),
            (JobState::Pending, JobState::TimedOut) => Ok(()),
            (from, to) => Err(JobError::InvalidTransition { from, to }),
        }?;
        self.state = to_state;
        Ok(())
    }

    /// Counts one status query. Only valid while pending.
    pub fn record_attempt(&mut self) -> Result<u32, JobError> {
        if self.state != JobState::Pending {
            return Err(JobError::NotPending(self.state));
        }
        self.attempts += 1;
        Ok(self.attempts)
    }

    pub fn complete(&mut self, payload: Value) -> Result<(), JobError> {
        self.transition(JobState::Done)?;
        self.result = Some(payload);
        Ok(())
    }

    /// Hands the payload to the caller; the job keeps no copy afterwards.
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Invalid job state transition from {from:?} to {to:?}")]
    InvalidTransition { from: JobState, to: JobState },
    #[error("Job is not pending (state {0:?})")]
    NotPending(JobState),
}
