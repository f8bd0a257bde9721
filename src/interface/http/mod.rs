//! axum front door: analysis, upload, chat and static serving of uploads.

pub mod error;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::interface::provider::HttpJobProvider;
use crate::service::analysis::{AsyncAnalysisJobRunner, ExtractionPaths, RetryPolicy};
use crate::service::conversation::{CannedReplies, ConversationService, InMemorySessionStore};
use crate::service::ingest::{LocalMediaStore, MediaIngestClient, UPLOADS_ROUTE};
use crate::service::PredictionService;
use crate::shared::config::{Config, ServerConfig};

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub predictions: Arc<PredictionService>,
    pub conversation: Arc<ConversationService>,
    pub ingest: Arc<MediaIngestClient>,
}

impl AppState {
    /// Wires the default adapters: HTTP job provider, local upload directory,
    /// in-memory sessions and canned replies.
    pub fn from_config(cfg: &Config) -> Result<Self, reqwest::Error> {
        let provider = Arc::new(HttpJobProvider::new(cfg.provider.clone())?);
        let runner = Arc::new(AsyncAnalysisJobRunner::new(
            provider,
            ExtractionPaths::from(&cfg.provider),
            RetryPolicy::from(&cfg.poll),
        ));
        let ingest = Arc::new(MediaIngestClient::new(
            Arc::new(LocalMediaStore::new(cfg.ingest.upload_dir.clone())),
            &cfg.ingest,
        ));
        let conversation = Arc::new(ConversationService::new(
            Arc::new(InMemorySessionStore::new(cfg.session.capacity)),
            Arc::new(CannedReplies::new()),
        ));
        let predictions = Arc::new(PredictionService::new(
            ingest.clone(),
            runner,
            conversation.clone(),
        ));
        Ok(Self {
            predictions,
            conversation,
            ingest,
        })
    }
}

/// Full application router for `cfg`.
pub fn app(cfg: &Config) -> Result<Router, reqwest::Error> {
    let state = AppState::from_config(cfg)?;
    Ok(router(state, &cfg.server, &cfg.ingest.upload_dir))
}

pub fn router(state: AppState, server: &ServerConfig, upload_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/analyze-audio", post(handlers::analyze_audio))
        .route("/upload", post(handlers::upload))
        .route("/chat", post(handlers::chat))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("[http] ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("[http] listening on {}", addr);
    }
    axum::serve(listener, app).await
}

pub fn spawn_with_listener(listener: TcpListener, app: Router) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            log::error!("[http] server error: {:?}", e);
        }
    })
}

