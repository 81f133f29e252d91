//! quill-server - REST API server binary.

use std::net::SocketAddr;

use quill_core::StudioConfig;
use quill_server::{create_server, AppState};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; QUILL_LOG_JSON switches to structured output
    let json_logs = std::env::var("QUILL_LOG_JSON").is_ok();
    tracing_subscriber::registry()
        .with((!json_logs).then(|| fmt::layer()))
        .with(json_logs.then(|| fmt::layer().json()))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("quill_server=debug".parse()?),
        )
        .init();

    let config = StudioConfig::load()?;
    if config.llm.config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set; generation requests must supply apiKey");
    }

    let state = AppState::from_config(&config)?;
    info!(
        database = %config.database.path.display(),
        model = %state.generator.model_name(),
        "Content store and providers ready"
    );

    let app = create_server(state, &config.server.cors_origins);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting quill-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
