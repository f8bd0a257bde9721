//! reqwest adapter for a "create job / get job status" analysis API.
//! Defaults target the Hume batch API; every URL, header and JSON location
//! comes from [`ProviderConfig`].

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{multipart, Client, RequestBuilder};
use serde_json::{json, Value};

use crate::shared::config::ProviderConfig;
use crate::shared::entities::{JobId, MediaRef};
use crate::shared::error::{ProviderError, SubmissionError};
use crate::shared::ports::{JobProviderPort, ProviderFuture, ProviderStatus};
use crate::shared::utils::excerpt;

#[derive(Clone)]
pub struct HttpJobProvider {
    client: Client,
    cfg: Arc<ProviderConfig>,
}

impl HttpJobProvider {
    pub fn new(cfg: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(cfg.http_timeout).build()?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(self.cfg.api_key_header.as_str(), self.cfg.api_key.as_str())
    }
}

impl JobProviderPort for HttpJobProvider {
    fn create_job(&self, media: MediaRef) -> ProviderFuture<Result<JobId, SubmissionError>> {
        let this = self.clone();
        Box::pin(async move {
            let url = this.cfg.jobs_url();
            let request = match &media {
                MediaRef::Url(media_url) => this
                    .client
                    .post(&url)
                    .json(&json!({ "urls": [media_url], "models": this.cfg.models })),
                MediaRef::Inline {
                    content_type,
                    data_base64,
                } => this
                    .client
                    .post(&url)
                    .multipart(inline_form(&this.cfg.models, content_type, data_base64)?),
            };

            let resp = this
                .authorized(request)
                .send()
                .await
                .map_err(|e| SubmissionError::Transport(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| SubmissionError::Transport(e.to_string()))?;
            if !status.is_success() {
                return Err(SubmissionError::ProviderRejected {
                    status: status.as_u16(),
                    body: excerpt(&body),
                });
            }

            let job_id = parse_job_id(&body, &this.cfg.job_id_pointer)?;
            log::debug!("[provider] created job {} ({})", job_id, media.kind());
            Ok(job_id)
        })
    }

    fn job_status(&self, job_id: JobId) -> ProviderFuture<Result<ProviderStatus, ProviderError>> {
        let this = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", this.cfg.jobs_url(), job_id.as_str());
            let resp = this
                .authorized(this.client.get(&url))
                .send()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| ProviderError::Body(e.to_string()))?;
            if !status.is_success() {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: excerpt(&body),
                });
            }
            let payload: Value =
                serde_json::from_str(&body).map_err(|e| ProviderError::Body(e.to_string()))?;
            classify_status(payload, &this.cfg)
        })
    }
}

fn inline_form(
    models: &Value,
    content_type: &str,
    data_base64: &str,
) -> Result<multipart::Form, SubmissionError> {
    let bytes = BASE64
        .decode(data_base64)
        .map_err(|e| SubmissionError::InvalidMedia(e.to_string()))?;
    let file = multipart::Part::bytes(bytes)
        .file_name("audio")
        .mime_str(content_type)
        .map_err(|e| SubmissionError::InvalidMedia(e.to_string()))?;
    let options = multipart::Part::text(json!({ "models": models }).to_string())
        .mime_str("application/json")
        .map_err(|e| SubmissionError::InvalidMedia(e.to_string()))?;
    Ok(multipart::Form::new().part("json", options).part("file", file))
}

fn parse_job_id(body: &str, pointer: &str) -> Result<JobId, SubmissionError> {
    let payload: Value = serde_json::from_str(body).map_err(|_| SubmissionError::NoJobId)?;
    let raw = payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or(SubmissionError::NoJobId)?;
    JobId::new(raw).map_err(|_| SubmissionError::NoJobId)
}

/// Maps one status response onto [`ProviderStatus`]. A done payload is
/// returned whole; predictions are located later by the extractor.
fn classify_status(payload: Value, cfg: &ProviderConfig) -> Result<ProviderStatus, ProviderError> {
    let status = payload
        .pointer(&cfg.status_pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Body(format!("no status at {}", cfg.status_pointer)))?
        .trim()
        .to_string();

    if cfg.is_done_status(&status) {
        return Ok(ProviderStatus::Done(payload));
    }
    if cfg.is_failed_status(&status) {
        let reason = payload
            .get("message")
            .and_then(Value::as_str)
            .map(excerpt)
            .unwrap_or(status);
        return Ok(ProviderStatus::Failed(reason));
    }
    match status.to_ascii_lowercase().as_str() {
        "running" | "in_progress" | "processing" => Ok(ProviderStatus::Running),
        _ => Ok(ProviderStatus::Pending),
    }
}
