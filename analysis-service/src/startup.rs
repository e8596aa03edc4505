//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers::{
    analyze::analyze_dog_health,
    health::{health_check, readiness_check},
    metrics::metrics,
};
use crate::middleware::{http_metrics_middleware, require_operator_token};
use crate::services::metrics::init_metrics;
use analysis_core::credential::{Credential, StaticCredential};
use analysis_core::providers::gemini::GeminiTextProvider;
use analysis_core::providers::TextProvider;
use analysis_core::relay::{AnalysisRelay, DirectSource, RELAY_ANALYZE_PATH};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<AnalysisRelay>,
    pub provider: Arc<dyn TextProvider>,
    pub model: String,
    pub operator_token: Secret<String>,
    /// False when `GOOGLE_AI_API_KEY` was absent at startup.
    pub provider_key_configured: bool,
}

impl AppState {
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let credentials = Arc::new(StaticCredential::new(
            config
                .google_api_key
                .as_ref()
                .map(|key| Credential::new(key.expose_secret().clone())),
        ));
        if config.google_api_key.is_none() {
            tracing::warn!("GOOGLE_AI_API_KEY is not set; analyses will fail until it is");
        }

        let provider: Arc<dyn TextProvider> = Arc::new(
            GeminiTextProvider::new(config.gemini.clone(), credentials)
                .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?,
        );
        tracing::info!(model = %config.gemini.model, "Initialized Gemini text provider");

        let source = DirectSource::new(provider.clone(), config.generation.clone());
        let relay = AnalysisRelay::new(Arc::new(source), config.retry.clone());

        Ok(Self {
            relay: Arc::new(relay),
            provider,
            model: config.gemini.model.clone(),
            operator_token: config.operator_token.clone(),
            provider_key_configured: config.google_api_key.is_some(),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    Router::new()
        .route(
            RELAY_ANALYZE_PATH,
            post(analyze_dog_health)
                .layer(from_fn_with_state(state.clone(), require_operator_token)),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .layer(from_fn(http_metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        init_metrics().map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        let state = AppState::from_config(&config)?;

        // Port 0 picks a random port, for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Analysis relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

pub async fn shutdown_signal() {
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
