//! Web layer module
//!
//! Thin HTTP surface over the store and the refresh service. Handlers
//! validate their parameters, call one store or service method, and wrap the
//! result in the standard `ApiResponse` envelope.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Config, database::Database, ingestor::RefreshService};

pub mod extractors;
pub mod handlers;
pub mod responses;

pub use extractors::DateRangeParams;
pub use responses::{handle_error, handle_result, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, database: Database, refresh: RefreshService) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = router(AppState { database, refresh });

        Ok(Self { app, addr })
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Listening on http://{}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Web server stopped");
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        // Middleware (applied in reverse order)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Refresh
        .route("/refresh", post(handlers::refresh::trigger_refresh))
        .route("/refresh/status", get(handlers::refresh::refresh_status))
        // Revenue aggregates
        .route("/revenue/product", get(handlers::revenue::revenue_by_product))
        .route("/revenue/category", get(handlers::revenue::revenue_by_category))
        .route("/revenue/region", get(handlers::revenue::revenue_by_region))
        .route("/revenue/total", get(handlers::revenue::total_revenue))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub refresh: RefreshService,
}
