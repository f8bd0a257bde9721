use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::service::analysis::AsyncAnalysisJobRunner;
use crate::service::conversation::ConversationService;
use crate::service::ingest::MediaIngestClient;
use crate::shared::entities::{EmotionResult, MediaRef, SessionId};
use crate::shared::error::{AnalysisError, ConversationError, IngestError};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("analysis task failed: {0}")]
    Task(String),
}

/// Response body of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub emotion: String,
    pub probabilities: BTreeMap<String, f64>,
    pub reply: String,
    pub chat_id: SessionId,
}

/// Aborts the job task when the request future is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct PredictionService {
    ingest: Arc<MediaIngestClient>,
    runner: Arc<AsyncAnalysisJobRunner>,
    conversation: Arc<ConversationService>,
}

impl PredictionService {
    pub fn new(
        ingest: Arc<MediaIngestClient>,
        runner: Arc<AsyncAnalysisJobRunner>,
        conversation: Arc<ConversationService>,
    ) -> Self {
        Self {
            ingest,
            runner,
            conversation,
        }
    }

    /// Analyses an uploaded recording.
    pub async fn predict_upload(
        &self,
        raw: Vec<u8>,
        content_type: &str,
    ) -> Result<PredictionOutcome, PredictError> {
        let media = self.ingest.ingest(raw, content_type).await?;
        self.predict_media(media).await
    }

    /// Analyses audio the provider can fetch by URL.
    pub async fn predict_url(&self, audio_url: &str) -> Result<PredictionOutcome, PredictError> {
        if audio_url.trim().is_empty() {
            return Err(PredictError::BadRequest("audio_url is required".to_string()));
        }
        let media = self.ingest.resolve_url(audio_url).ok_or_else(|| {
            PredictError::BadRequest(format!(
                "audio_url {} is not absolute and no public base url is configured",
                audio_url.trim()
            ))
        })?;
        self.predict_media(media).await
    }

    pub async fn predict_media(&self, media: MediaRef) -> Result<PredictionOutcome, PredictError> {
        let emotion = self.run_job(media).await?;
        let (chat_id, reply) = self.conversation.start_session(&emotion.top_label).await?;
        info!(
            "[analysis] predicted {} for session {}",
            emotion.top_label, chat_id
        );
        Ok(PredictionOutcome {
            probabilities: emotion.probabilities(),
            emotion: emotion.top_label,
            reply,
            chat_id,
        })
    }

    async fn run_job(&self, media: MediaRef) -> Result<EmotionResult, PredictError> {
        let runner = self.runner.clone();
        let mut task = AbortOnDrop(tokio::spawn(async move { runner.analyze(media).await }));
        match (&mut task.0).await {
            Ok(result) => Ok(result?),
            Err(err) => {
                warn!("[analysis] job task ended abnormally: {}", err);
                Err(PredictError::Task(err.to_string()))
            }
        }
    }
}
