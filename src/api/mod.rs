//! HTTP API
//!
//! JSON endpoints over the ledger service. Handlers are stateless; the
//! shared state holds the service (and its connection pool) plus the
//! image store.

pub mod auth;
pub mod drawings;
pub mod error;
pub mod shop;
pub mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::{AppError, LedgerService};
use crate::config::Config;
use crate::domain::Stats;
use crate::images::ImageStore;

/// State shared by every handler
pub struct AppState {
    pub ledger: LedgerService,
    pub images: ImageStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(ledger: LedgerService, images: ImageStore) -> SharedState {
        Arc::new(Self { ledger, images })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: Stats,
}

/// Build the router with all routes and middleware.
pub fn router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/telegram-auth", post(auth::telegram_auth))
        .route("/api/drawings", get(drawings::list_drawings))
        .route("/api/drawings/upload", post(drawings::upload_drawing))
        .route("/api/drawings/:id/like", post(drawings::like_drawing))
        .route("/api/users/:id", get(users::get_user_profile))
        .route("/api/users/:id/purchases", get(users::list_user_purchases))
        .route("/api/shop/items", get(shop::list_items))
        .route("/api/shop/buy", post(shop::buy_item))
        .route("/api/stats", get(stats))
        // request_id runs first
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Connect to the database, then serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let ledger =
        LedgerService::init(&config.storage.database_path, config.ledger.clone()).await?;
    let images = ImageStore::new(&config.storage.upload_dir);
    images.ensure_dir().await?;

    let app = router(AppState::new(ledger, images), config.server.max_upload_bytes);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/stats - Totals of users, drawings and likes
pub async fn stats(State(state): State<SharedState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.ledger.stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
