use std::net::{SocketAddr, ToSocketAddrs};

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use atlas_core::config::DashboardConfig;
use atlas_core::error::{AtlasError, Result};

use crate::dashboard::{create_api_router, create_dashboard_router, DashboardState};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Rows in the startup snapshot.
    pub countries: usize,
}

/// Dashboard HTTP server.
pub struct DashboardServer {
    config: DashboardConfig,
    state: DashboardState,
}

impl DashboardServer {
    pub fn new(config: DashboardConfig, state: DashboardState) -> Self {
        Self { config, state }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .with_state(self.state.clone())
            .merge(create_dashboard_router(self.state.clone()))
            .nest("/api", create_api_router(self.state.clone()))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(request_id_middleware))
                    .layer(TraceLayer::new_for_http())
                    .layer(CompressionLayer::new()),
            )
    }

    /// Get the socket address to bind to. Host names are resolved and the
    /// first address wins.
    pub fn addr(&self) -> Result<SocketAddr> {
        let (host, port) = (self.config.host.as_str(), self.config.port);
        let invalid = |reason: String| {
            AtlasError::Config(format!("Invalid listen address {}:{}: {}", host, port, reason))
        };

        (host, port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("no addresses found".to_string()))
    }

    /// Run the server until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = self.addr()?;
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Dashboard stopped");
        Ok(())
    }
}

/// Health check handler.
async fn health_handler(State(state): State<DashboardState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        countries: state.snapshot.len(),
    })
}

/// Tags every request with an id, echoed in `x-request-id`.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use axum::http::header::HeaderName;

    let request_id = req
        .headers()
        .get(HeaderName::from_static("x-request-id"))
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = tracing::debug_span!("request", id = %request_id);
    span.in_scope(|| {
        tracing::debug!(method = %req.method(), uri = %req.uri(), "Request received");
    });
    let mut response = next.run(req).instrument(span).await;

    if let Ok(val) = request_id.parse() {
        response.headers_mut().insert("x-request-id", val);
    }

    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
