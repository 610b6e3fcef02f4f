//! HTTP surface of the upload endpoint.
//!
//! Every response from the upload route is `200 OK` with a JSON
//! [`UploadResult`]; failures are signalled by `success: false` only.

use crate::config::ServerConfig;
use crate::metrics::UploadMetrics;
use crate::upload::{IncomingFile, StoredPhoto, UploadError, UploadResult, UploadService, PHOTO_FIELD};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Errors that can occur while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<UploadService>,
    metrics: Arc<UploadMetrics>,
}

impl AppState {
    /// Wraps the service and metrics for sharing between handlers.
    pub fn new(service: UploadService, metrics: UploadMetrics) -> Self {
        Self {
            service: Arc::new(service),
            metrics: Arc::new(metrics),
        }
    }

    /// Converts an outcome into the response body, logging and counting it.
    fn finish(&self, outcome: Result<StoredPhoto, UploadError>) -> UploadResult {
        match &outcome {
            Ok(stored) => self.metrics.record_accepted(stored.size),
            Err(err) => {
                tracing::warn!(reason = err.reason(), error = %err, "Upload rejected");
                self.metrics.record_rejected(err.reason());
            }
        }
        UploadResult::from(&outcome)
    }
}

/// HTTP server accepting photo uploads.
pub struct UploadServer {
    config: ServerConfig,
    state: AppState,
}

impl UploadServer {
    /// Creates a server for `service`.
    pub fn new(config: ServerConfig, service: UploadService, metrics: UploadMetrics) -> Self {
        Self {
            config,
            state: AppState::new(service, metrics),
        }
    }

    /// Builds the router with all routes and layers.
    pub fn router(&self) -> Router {
        router(&self.config, self.state.clone())
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            path = %self.config.upload_path,
            dir = %self.state.service.store().dir().display(),
            "Upload server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Upload server stopped");
        Ok(())
    }
}

/// Builds the application router.
pub fn router(config: &ServerConfig, state: AppState) -> Router {
    let body_limit = state.service.policy().body_limit();

    let router = Router::new()
        .route(
            &config.upload_path,
            post(upload_handler).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Handler for `POST <upload_path>`.
async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<UploadResult> {
    let limits = BodyLimits {
        max_bytes: state.service.policy().max_bytes,
        declared: declared_length(&headers),
    };
    let outcome = match multipart {
        Ok(multipart) => receive(&state, multipart, limits).await,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(limits.too_large())
        }
        Err(rejection) => Err(UploadError::Transport(rejection.to_string())),
    };
    Json(state.finish(outcome))
}

/// Handler for any other method on the upload route.
async fn method_not_allowed(State(state): State<AppState>, method: Method) -> Json<UploadResult> {
    tracing::debug!(%method, "Non-POST request to upload route");
    Json(state.finish(Err(UploadError::MethodNotAllowed)))
}

/// What is known about the request size when the body gets cut off.
#[derive(Debug, Clone, Copy)]
struct BodyLimits {
    max_bytes: u64,
    declared: Option<u64>,
}

impl BodyLimits {
    fn too_large(self) -> UploadError {
        UploadError::PayloadTooLarge {
            size: self.declared,
            limit: self.max_bytes,
        }
    }

    /// Bodies over the HTTP limit are size failures, not transport ones.
    fn classify(self, err: MultipartError) -> UploadError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            self.too_large()
        } else {
            UploadError::Transport(err.to_string())
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

async fn receive(
    state: &AppState,
    mut multipart: Multipart,
    limits: BodyLimits,
) -> Result<StoredPhoto, UploadError> {
    let file = read_photo_field(&mut multipart, limits).await?;
    let service = Arc::clone(&state.service);

    tokio::task::spawn_blocking(move || service.accept(file))
        .await
        .map_err(|e| UploadError::StorageWrite(std::io::Error::other(e)))?
}

/// Pulls the `photo` field out of the form, skipping anything else.
async fn read_photo_field(
    multipart: &mut Multipart,
    limits: BodyLimits,
) -> Result<IncomingFile, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| limits.classify(e))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| limits.classify(e))?;
        return Ok(IncomingFile { file_name, bytes });
    }

    Err(UploadError::Transport(format!(
        "no file received in field `{PHOTO_FIELD}`"
    )))
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
