//! Matchday server
//!
//! Keeps chat rooms' live match snapshots fresh and fans new notifications
//! out to browser push endpoints.

use clap::Parser;
use matchday_core::events::ChangeSenders;
use matchday_core::processors::ChangeListener;
use matchday_core::providers::ApiFootballProvider;
use matchday_server::config::{ConfigLoader, get_database_url};
use matchday_server::server::{build_router, run_server};
use matchday_server::shutdown::spawn_config_reload_handler;
use matchday_server::state::{AppState, PushService};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Matchday - live match sync and push notification delivery
#[derive(Parser, Debug)]
#[command(name = "matchday-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./matchday-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting matchday-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let provider = Arc::new(ApiFootballProvider::new(&loaded_config.football));
    let push_config = loaded_config.push.clone();
    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!().run(&db_pool).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;
        tracing::info!("Migrations completed successfully");
    }

    let changes = ChangeSenders::new();
    let state = AppState::new(
        db_pool.clone(),
        shared_config,
        changes.clone(),
        provider,
        None,
    );
    match push_config {
        Some(push) => {
            let service = PushService::from_config(&push, state.subscription_store())?;
            *state.push.write().await = Some(service);
            tracing::info!("Web Push enabled");
        }
        None => tracing::warn!("No [push] section, notification webhook will answer 500"),
    }

    // Row change listener feeding room views and notification streams
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_handle =
        tokio::spawn(ChangeListener::new(db_pool.clone(), changes).run(shutdown_rx));

    let reload_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = listener_handle.await {
        tracing::error!(error = %e, "Change listener task failed");
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
