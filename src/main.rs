use anyhow::{Context, Result};
use axum::serve;
use pastebin::core::config::Config;
use pastebin::core::routes::build_router;
use pastebin::core::startup::seed_accounts;
use pastebin::core::state::AppState;
use pastebin::core::tracing_init::init_tracing;
use pastebin::stores::presence_store::spawn_sweeper;
use pastebin::stores::user_store::{InMemoryUserStore, UserStore};
use pastebin::utils::time::SystemClock;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path)
        .context(format!(
            "Failed to load configuration from '{}'. \
            If this is your first time running the server, copy config.example.toml to config.toml and adjust the values.",
            config_path.display()
        ))?;

    init_tracing(&config.logging);

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = config.server.port,
        num_threads = config.server.num_threads,
        public_root = %config.media.public_root.display(),
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Pastebin server starting"
    );

    let user_store = Arc::new(InMemoryUserStore::new());

    if let Some(seed_file) = &config.accounts.seed_file {
        seed_accounts(user_store.as_ref(), seed_file)
            .context("Failed to seed accounts")?;
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        user_store.clone() as Arc<dyn UserStore>,
        Arc::new(SystemClock),
    )?);

    state
        .layout
        .ensure_directories()
        .context("Failed to prepare media directories")?;

    info!(
        media_root = %state.layout.media_root().display(),
        accounts = user_store.len(),
        "Media directories ready"
    );

    spawn_sweeper(
        Arc::clone(&state.presence),
        Duration::from_millis(config.presence.sweep_interval_ms),
    );

    info!(
        sweep_interval_ms = config.presence.sweep_interval_ms,
        ttl_ms = config.presence.ttl_ms,
        "Presence sweep task started"
    );

    let app = build_router(state).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let addr = format!("0.0.0.0:{}", config.server.port);
    info!(address = %addr, "Starting TCP listener");

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind TCP listener to {}", addr))?;

    info!(address = %addr, "HTTP server started, waiting for shutdown signal");

    if let Err(e) = serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!(error = %e, "HTTP server failed");
        return Err(e).context("HTTP server error");
    }

    info!("Shutting down gracefully");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
