//! Turns uploaded audio into a [`MediaRef`] the analysis provider can consume.

pub mod store;
pub mod wav;

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{info, warn};

use crate::shared::config::{IngestConfig, IngestMode};
use crate::shared::entities::MediaRef;
use crate::shared::error::IngestError;
use crate::shared::ports::MediaStorePort;

pub use store::{LocalMediaStore, UPLOADS_ROUTE};

pub struct MediaIngestClient {
    store: Arc<dyn MediaStorePort>,
    mode: IngestMode,
    public_base_url: Option<String>,
    max_duration: Option<Duration>,
}

impl MediaIngestClient {
    pub fn new(store: Arc<dyn MediaStorePort>, cfg: &IngestConfig) -> Self {
        Self {
            store,
            mode: cfg.mode,
            public_base_url: cfg.public_base_url.clone(),
            max_duration: cfg.max_duration,
        }
    }

    /// Validates, optionally trims, and hands off `raw`.
    pub async fn ingest(&self, raw: Vec<u8>, content_type: &str) -> Result<MediaRef, IngestError> {
        if raw.is_empty() {
            return Err(IngestError::EmptyPayload);
        }
        let media_type = media_type(content_type);
        let bytes = self.normalize(raw, &media_type)?;

        match (self.mode, self.public_base_url.as_deref()) {
            (IngestMode::Url, Some(base)) => {
                let route = self.store.put(bytes, extension_for(&media_type)).await?;
                let url = join_url(base, &route);
                info!("[ingest] media available at {}", url);
                Ok(MediaRef::Url(url))
            }
            (mode, _) => {
                if mode == IngestMode::Url {
                    warn!("[ingest] url mode without public base url, sending inline");
                }
                info!("[ingest] sending {} bytes inline ({})", bytes.len(), media_type);
                Ok(MediaRef::Inline {
                    content_type: media_type,
                    data_base64: BASE64.encode(&bytes),
                })
            }
        }
    }

    /// Stores an upload without analysing it. Returns the server-relative route.
    pub async fn store_upload(&self, raw: Vec<u8>, content_type: &str) -> Result<String, IngestError> {
        if raw.is_empty() {
            return Err(IngestError::EmptyPayload);
        }
        let media_type = media_type(content_type);
        Ok(self.store.put(raw, extension_for(&media_type)).await?)
    }

    /// Maps a client-supplied `audio_url` to something the provider can fetch.
    /// Relative routes need a public base URL.
    pub fn resolve_url(&self, audio_url: &str) -> Option<MediaRef> {
        let audio_url = audio_url.trim();
        if audio_url.is_empty() {
            return None;
        }
        if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
            return Some(MediaRef::Url(audio_url.to_string()));
        }
        let base = self.public_base_url.as_deref()?;
        Some(MediaRef::Url(join_url(base, audio_url)))
    }

    fn normalize(&self, raw: Vec<u8>, media_type: &str) -> Result<Vec<u8>, IngestError> {
        let Some(max) = self.max_duration else {
            return Ok(raw);
        };
        if !wav::looks_like_wav(media_type, &raw) {
            return Ok(raw);
        }
        Ok(wav::trim_wav(&raw, max)?.unwrap_or(raw))
    }
}

/// `audio/webm;codecs=opus` → `audio/webm`.
fn media_type(content_type: &str) -> String {
    let base = content_type.split(';').next().unwrap_or("").trim();
    if base.is_empty() {
        "application/octet-stream".to_string()
    } else {
        base.to_ascii_lowercase()
    }
}

fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "audio/webm" | "video/webm" => "webm",
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "wav",
        "audio/ogg" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        _ => "bin",
    }
}

fn join_url(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::shared::ports::media_store::{StoreError, StoreFuture};

    #[derive(Default)]
    struct MemoryStore {
        puts: Mutex<Vec<(Vec<u8>, &'static str)>>,
    }

    impl MediaStorePort for MemoryStore {
        fn put(&self, bytes: Vec<u8>, extension: &'static str) -> StoreFuture<Result<String, StoreError>> {
            let mut puts = self.puts.lock().unwrap();
            puts.push((bytes, extension));
            let route = format!("/static/uploads/{}.{}", puts.len(), extension);
            Box::pin(async move { Ok(route) })
        }
    }

    fn cfg(mode: IngestMode, base: Option<&str>, max_secs: Option<u64>) -> IngestConfig {
        IngestConfig {
            mode,
            public_base_url: base.map(str::to_string),
            upload_dir: PathBuf::from("unused"),
            max_duration: max_secs.map(Duration::from_secs),
        }
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let client = MediaIngestClient::new(
            Arc::new(MemoryStore::default()),
            &cfg(IngestMode::Inline, None, None),
        );
        assert!(matches!(
            client.ingest(Vec::new(), "audio/webm").await,
            Err(IngestError::EmptyPayload)
        ));
        assert!(matches!(
            client.store_upload(Vec::new(), "audio/webm").await,
            Err(IngestError::EmptyPayload)
        ));
    }

    #[tokio::test]
    async fn url_mode_stores_and_builds_absolute_url() {
        let store = Arc::new(MemoryStore::default());
        let client = MediaIngestClient::new(
            store.clone(),
            &cfg(IngestMode::Url, Some("https://ora.example/"), None),
        );
        let media = client
            .ingest(vec![7; 32], "audio/webm;codecs=opus")
            .await
            .unwrap();
        assert_eq!(
            media,
            MediaRef::Url("https://ora.example/static/uploads/1.webm".to_string())
        );
        assert_eq!(store.puts.lock().unwrap()[0].1, "webm");
    }

    #[tokio::test]
    async fn inline_mode_encodes_base64() {
        let store = Arc::new(MemoryStore::default());
        let client =
            MediaIngestClient::new(store.clone(), &cfg(IngestMode::Inline, None, Some(5)));
        let media = client.ingest(b"hello".to_vec(), "Audio/Ogg").await.unwrap();
        assert_eq!(
            media,
            MediaRef::Inline {
                content_type: "audio/ogg".to_string(),
                data_base64: "aGVsbG8=".to_string(),
            }
        );
        assert!(store.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wav_uploads_are_trimmed_before_handoff() {
        let store = Arc::new(MemoryStore::default());
        let client = MediaIngestClient::new(
            store.clone(),
            &cfg(IngestMode::Url, Some("http://localhost:5000"), Some(5)),
        );
        let long = wav::sine_wav(8_000, 6.0);
        client.ingest(long.clone(), "audio/wav").await.unwrap();
        let stored = store.puts.lock().unwrap()[0].0.clone();
        assert!(stored.len() < long.len());
        let reader = hound::WavReader::new(Cursor::new(stored)).unwrap();
        assert_eq!(reader.duration(), 40_000);
    }

    #[tokio::test]
    async fn broken_wav_is_invalid_audio() {
        let client = MediaIngestClient::new(
            Arc::new(MemoryStore::default()),
            &cfg(IngestMode::Inline, None, Some(5)),
        );
        let err = client.ingest(b"not a wav".to_vec(), "audio/wav").await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidAudio(_)));
    }

    #[test]
    fn resolve_url_handles_relative_and_absolute() {
        let client = MediaIngestClient::new(
            Arc::new(MemoryStore::default()),
            &cfg(IngestMode::Url, Some("https://ora.example"), None),
        );
        assert_eq!(
            client.resolve_url("/static/uploads/a.webm"),
            Some(MediaRef::Url(
                "https://ora.example/static/uploads/a.webm".to_string()
            ))
        );
        assert_eq!(
            client.resolve_url("https://cdn.example/a.wav"),
            Some(MediaRef::Url("https://cdn.example/a.wav".to_string()))
        );
        assert_eq!(client.resolve_url("  "), None);

        let no_base = MediaIngestClient::new(
            Arc::new(MemoryStore::default()),
            &cfg(IngestMode::Inline, None, None),
        );
        assert_eq!(no_base.resolve_url("/static/uploads/a.webm"), None);
    }

    #[test]
    fn extensions_follow_media_type() {
        assert_eq!(extension_for(&media_type("audio/x-wav")), "wav");
        assert_eq!(extension_for(&media_type("")), "bin");
        assert_eq!(extension_for(&media_type("audio/mpeg")), "mp3");
    }
}
