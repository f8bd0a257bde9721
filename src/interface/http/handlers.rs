use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::service::PredictionOutcome;

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_url: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionOutcome>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let audio_url = req
        .audio_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No audio URL received"))?;
    log::info!("[http] predict audio_url={}", audio_url);
    Ok(Json(state.predictions.predict_url(&audio_url).await?))
}

pub async fn analyze_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictionOutcome>, ApiError> {
    let (bytes, content_type) = read_file_field(multipart, "audio").await?;
    log::info!(
        "[http] analyze-audio {} bytes ({})",
        bytes.len(),
        content_type
    );
    Ok(Json(
        state.predictions.predict_upload(bytes, &content_type).await?,
    ))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (bytes, content_type) = read_file_field(multipart, "file").await?;
    let file_url = state.ingest.store_upload(bytes, &content_type).await?;
    log::info!("[http] upload stored at {}", file_url);
    Ok(Json(UploadResponse { file_url }))
}

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let chat_id = req.chat_id.unwrap_or_default();
    let message = req.message.unwrap_or_default();
    let reply = state.conversation.chat(&chat_id, &message).await?;
    Ok(Json(ChatResponse { reply }))
}

/// Returns the bytes and content type of the first field called `name`.
async fn read_file_field(
    mut multipart: Multipart,
    name: &str,
) -> Result<(Vec<u8>, String), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        return Ok((bytes.to_vec(), content_type));
    }
    Err(ApiError::new(
        StatusCode::BAD_REQUEST,
        format!("No {} uploaded", name),
    ))
}
