//! Application startup and lifecycle management.

use crate::config::GatewayConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::providers::GenerationProvider;
use crate::services::UploadStaging;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub provider: Arc<dyn GenerationProvider>,
    pub uploads: Arc<UploadStaging>,
}

/// Build the HTTP router for the given state.
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config.uploads.max_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/generate-text", post(handlers::generate_text))
        .route("/generate-from-image", post(handlers::generate_from_image))
        .route(
            "/generate-from-document",
            post(handlers::generate_from_document),
        )
        .route("/generate-from-audio", post(handlers::generate_from_audio))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Build the application backed by the Gemini API.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let provider = GeminiProvider::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: config.gemini.request_timeout(),
        })
        .map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::Error::new(e))
        })?;

        tracing::info!(
            text_model = %config.models.text_model,
            image_model = %config.models.image_model,
            document_model = %config.models.document_model,
            audio_model = %config.models.audio_model,
            timeout_secs = config.gemini.request_timeout_secs,
            "Initialized Gemini provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around any provider implementation.
    pub async fn build_with_provider(
        config: GatewayConfig,
        provider: Arc<dyn GenerationProvider>,
    ) -> Result<Self, AppError> {
        let uploads = UploadStaging::new(&config.uploads.dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize upload directory {}: {}",
                    config.uploads.dir,
                    e
                );
                e
            })?;

        let state = AppState {
            config: config.clone(),
            provider,
            uploads: Arc::new(uploads),
        };

        let app = router(state.clone());

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Gemini gateway is running at http://localhost:{}", port);
        tracing::info!("Text generation endpoint: POST /generate-text with {{ \"prompt\": \"Your text here\" }}");
        tracing::info!("Image generation endpoint: POST /generate-from-image with form-data (prompt, image)");
        tracing::info!("Document generation endpoint: POST /generate-from-document with form-data (prompt, document)");
        tracing::info!("Audio generation endpoint: POST /generate-from-audio with form-data (prompt, audio)");

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Directory uploads are staged in.
    pub fn uploads_dir(&self) -> &Path {
        self.state.uploads.dir()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
