/**
 * XFChat Server Entry Point
 *
 * This is the main entry point for the xfchat realtime server. It loads the
 * configuration, initializes tracing and serves the Axum app.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,xfchat=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = xfchat::backend::server::config::ServerConfig::load()?;
    tracing::info!("[Server] Configuration loaded: {:?}", config);

    let app = xfchat::backend::server::init::create_app(&config).await;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("[Server] Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("[Server] Shut down");
    Ok(())
}

#[cfg(feature = "ssr")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Server] Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Server] Shutdown signal received");
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin xfchat-server --features ssr");
    std::process::exit(1);
}
