use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use floodwatch_engine::{CachedThresholds, StateRegistry};
use floodwatch_events::Broadcaster;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use floodwatch_api::config::{FusionConfig, ServerConfig};
use floodwatch_api::router::build_app_router;
use floodwatch_api::sources::{PgLocationDirectory, PgReadingStore, SettingsThresholds};
use floodwatch_api::state::AppState;
use floodwatch_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "floodwatch_api=debug,floodwatch_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let fusion = FusionConfig::from_env().expect("Invalid fusion configuration");
    tracing::info!(
        unknown_location_policy = %fusion.unknown_location_policy,
        "Loaded fusion configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = floodwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    floodwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    floodwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Broadcaster ---
    let broadcaster = Arc::new(Broadcaster::new(fusion.subscriber_send_timeout));

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&broadcaster));

    // --- State registry ---
    let store = Arc::new(PgReadingStore::new(pool.clone()));
    let thresholds = CachedThresholds::new(
        SettingsThresholds::new(pool.clone()),
        fusion.threshold_cache_ttl,
    );
    let registry = Arc::new(StateRegistry::new(
        Arc::new(thresholds),
        store.clone(),
        Arc::new(PgLocationDirectory::new(pool.clone())),
        Arc::clone(&broadcaster) as _,
        fusion.registry_config(),
    ));
    let started = registry
        .start_all()
        .await
        .expect("Failed to start location workers");
    tracing::info!(started, "State registry started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        fusion: Arc::new(fusion),
        broadcaster: Arc::clone(&broadcaster),
        registry: Arc::clone(&registry),
        store,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_timeout, registry.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("State registry did not shut down in time");
    }

    let ws_count = broadcaster.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    broadcaster.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
