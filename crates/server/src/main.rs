use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lipsync_core::{
    load_config, validate_config, HttpFetcher, LipSyncOrchestrator, LipSyncTool,
    SanitizedConfig, Wav2LipTool, Workspace,
};
use lipsync_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var("LIPSYNC_LOG_FORMAT").is_ok_and(|v| v == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<()> {
    init_logging();

    // An explicitly configured file must exist; the default one is optional
    let (config_path, require_file) = match std::env::var("LIPSYNC_CONFIG") {
        Ok(path) => (PathBuf::from(path), true),
        Err(_) => (PathBuf::from("config.toml"), false),
    };

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path, require_file)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    match serde_json::to_string(&SanitizedConfig::from(&config)) {
        Ok(sanitized) => info!(config = %sanitized, "Effective configuration"),
        Err(e) => warn!("Failed to serialize configuration: {}", e),
    }

    // Workspace directories
    let workspace = Workspace::new(&config.workspace);
    workspace
        .ensure_dirs()
        .await
        .context("Failed to create workspace directories")?;
    info!(
        temp_dir = %workspace.temp_dir().display(),
        output_dir = %workspace.output_dir().display(),
        "Workspace ready"
    );

    // Capabilities
    let fetcher = Arc::new(
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP fetcher")?,
    );
    let tool = Arc::new(Wav2LipTool::new(config.tool.clone()));
    match tool.validate().await {
        Ok(()) => info!("Lip-sync tool validated"),
        // Not fatal, /health reports model availability
        Err(e) => warn!("Lip-sync tool is not ready: {}", e),
    }

    let orchestrator = Arc::new(LipSyncOrchestrator::new(
        tool,
        fetcher,
        workspace,
        config.jobs.clone(),
    ));
    orchestrator.start().await;

    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    orchestrator.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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
