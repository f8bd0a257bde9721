use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::service::PredictError;
use crate::shared::error::{AnalysisError, ConversationError, IngestError, SubmissionError};

/// `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::warn!("[http] {} {}", self.status.as_u16(), self.message);
        } else {
            log::debug!("[http] {} {}", self.status.as_u16(), self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn analysis_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Submission(SubmissionError::InvalidMedia(_)) => StatusCode::BAD_REQUEST,
        AnalysisError::Submission(_)
        | AnalysisError::Poll(_)
        | AnalysisError::NoPredictions
        | AnalysisError::Parse(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ingest_status(err: &IngestError) -> StatusCode {
    match err {
        IngestError::EmptyPayload | IngestError::InvalidAudio(_) => StatusCode::BAD_REQUEST,
        IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn conversation_status(err: &ConversationError) -> StatusCode {
    match err {
        ConversationError::UnknownSession(_) | ConversationError::EmptyMessage => {
            StatusCode::BAD_REQUEST
        }
        ConversationError::ReplyFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let status = match &err {
            PredictError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PredictError::Ingest(e) => ingest_status(e),
            PredictError::Analysis(e) => analysis_status(e),
            PredictError::Conversation(e) => conversation_status(e),
            PredictError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self::new(ingest_status(&err), err.to_string())
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        Self::new(conversation_status(&err), err.to_string())
    }
}
