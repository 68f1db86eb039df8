//! `wirecall serve`: Start the HTTP server with the demo handlers.

use std::sync::Arc;

use wirecall_core::telemetry::TracingEmitter;
use wirecall_core::RpcService;
use wirecall_server::ServerConfig;

use crate::handlers::demo_registry;

pub async fn run(host: String, port: u16, route_prefix: String) -> Result<(), String> {
    let config = ServerConfig {
        host: host.clone(),
        port,
        route_prefix,
        ..ServerConfig::default()
    };

    let registry = demo_registry();
    tracing::info!(methods = ?registry.method_names(), "Serving demo handlers");
    let service =
        RpcService::new(Arc::new(registry)).with_emitters(Arc::new(TracingEmitter::new()));

    println!("Starting wirecall server on {}:{}...", host, port);

    let addr = wirecall_server::start_server(config, service).await?;
    println!("wirecall server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    tracing::info!("Received Ctrl+C, shutting down");
    println!("\nShutting down...");
    Ok(())
}
