//! wirecall Server: HTTP transport for named-method RPC.
//!
//! Mounts the RPC middleware in front of an axum application:
//! - `POST <prefix>/api/<method>` is dispatched to the handler registry
//! - everything else reaches the application, carrying a `RequestContext`
//!   in its extensions for in-process calls
//! - `GET /api/health` reports liveness
//!
//! This crate can be used standalone (see [`start_server`]) or embedded in
//! an existing axum app (see [`build_router`]).

pub mod error;
pub mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wirecall_core::RpcService;

use self::middleware::{with_rpc, RpcLayerState};

/// Default request body limit: 1 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Configuration for the wirecall HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix in front of `/api/<method>`, e.g. `"/app"`. Empty by default.
    pub route_prefix: String,
    /// Maximum accepted RPC request body, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3210,
            route_prefix: String::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Initialize the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wirecall_server=info,wirecall_core=info,tower_http=info".into()),
        )
        .try_init();
}

/// Wrap `app` with the RPC middleware, health check, CORS and tracing layers.
pub fn build_router(config: &ServerConfig, service: RpcService, app: Router) -> Router {
    let state = Arc::new(RpcLayerState::new(
        service,
        config.route_prefix.clone(),
        config.body_limit,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The fallback must exist before layering so unmatched paths still pass
    // through the middleware.
    let app = app
        .route("/api/health", axum::routing::get(health_check))
        .fallback(not_found);

    with_rpc(app, state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the server with no application routes besides RPC and health.
///
/// Returns the actual address the server is listening on.
pub async fn start_server(config: ServerConfig, service: RpcService) -> Result<SocketAddr, String> {
    start_server_with_app(config, service, Router::new()).await
}

/// Start the server in front of an existing application router.
pub async fn start_server_with_app(
    config: ServerConfig,
    service: RpcService,
    app: Router,
) -> Result<SocketAddr, String> {
    init_tracing();

    tracing::info!(
        "Starting wirecall server on {}:{} (route prefix {:?}, {} methods)",
        config.host,
        config.port,
        config.route_prefix,
        service.registry().len()
    );

    let app = build_router(&config, service, app);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("wirecall server listening on {}", local_addr);

    // Spawn the server in a background task
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "wirecall-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
