/**
 * Portal Realtime Server Entry Point
 *
 * Loads configuration, wires the collaborators and serves the WebSocket and
 * notification routes until Ctrl-C, then waits for in-flight email
 * deliveries before exiting.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use portal_realtime::backend::routes::create_router;
    use portal_realtime::backend::server::{build_state, ServerConfig};

    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[Startup] Server initialization started");

    let config = ServerConfig::load()?;

    let port = config.server_port;
    let app_state = build_state(config).await?;
    let dispatcher = app_state.dispatcher.clone();
    let app = create_router(app_state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Startup] Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[Shutdown] Could not listen for Ctrl-C: {}", e);
            }
            tracing::info!("[Shutdown] Signal received");
        })
        .await?;

    tracing::info!("[Shutdown] Waiting for pending email deliveries");
    dispatcher.drain_deliveries().await;
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin portal-realtime-server --features ssr");
    std::process::exit(1);
}
