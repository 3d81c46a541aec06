//! `LanaServer` — Axum HTTP server and shared request state.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use lana_llm::OpenRouterProvider;
use lana_settings::LanaSettings;
use lana_store::StoreClient;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Model provider handle.
    pub provider: Arc<OpenRouterProvider>,
    /// Store client handle.
    pub store: Arc<StoreClient>,
    /// Loaded settings.
    pub settings: Arc<LanaSettings>,
    /// When the server started.
    pub start_time: Instant,
}

/// The main Lana server.
pub struct LanaServer {
    config: ServerConfig,
    state: AppState,
    shutdown: Arc<ShutdownCoordinator>,
}

impl LanaServer {
    /// Create a new server.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        provider: OpenRouterProvider,
        store: StoreClient,
        settings: LanaSettings,
    ) -> Self {
        Self {
            config,
            state: AppState {
                provider: Arc::new(provider),
                store: Arc::new(store),
                settings: Arc::new(settings),
                start_time: Instant::now(),
            },
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Build the Axum router with all routes.
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Get the shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind and serve until the shutdown token fires.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening");

        let token: CancellationToken = self.shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    }
}

/// Build the router around a prepared state (used directly by tests).
#[must_use]
pub fn router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.settings.upload.max_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(api::chat::chat))
        .route("/api/chat/stream", post(api::chat_stream::chat_stream))
        .route(
            "/api/transacciones",
            get(api::transactions::list).post(api::transactions::create),
        )
        .route(
            "/api/objetivos",
            get(api::goals::list)
                .post(api::goals::create)
                .put(api::goals::update)
                .delete(api::goals::delete),
        )
        .route(
            "/api/objetivos/movimientos",
            get(api::goals::list_movements).post(api::goals::create_movement),
        )
        .route(
            "/api/gastos-recurrentes",
            get(api::recurring::list)
                .post(api::recurring::create)
                .put(api::recurring::update)
                .delete(api::recurring::delete),
        )
        .route(
            "/api/gastos-recurrentes/procesar",
            get(api::recurring::process_probe).post(api::recurring::process),
        )
        .route("/api/export", get(api::export::export))
        .route("/api/import", post(api::import::import))
        .route("/api/reset", post(api::reset::reset))
        .route("/api/upload-image", post(api::upload::upload_image))
        .layer(DefaultBodyLimit::max(max_upload.saturating_add(64 * 1024)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use lana_llm::OpenRouterConfig;
    use lana_store::StoreConfig;

    /// State wired to the given mock endpoints.
    pub fn state_for(store_url: &str, llm_url: &str) -> AppState {
        let mut provider_config =
            OpenRouterConfig::new("sk-or-test", "https://lana.example.com");
        provider_config.base_url = Some(llm_url.to_string());
        AppState {
            provider: Arc::new(OpenRouterProvider::new(provider_config)),
            store: Arc::new(StoreClient::new(StoreConfig {
                base_url: store_url.to_string(),
                anon_key: "anon-key".into(),
            })),
            settings: Arc::new(LanaSettings::default()),
            start_time: Instant::now(),
        }
    }
}
