use axum::{routing::get_service, Router};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sports_equipment::api::{self, AppState};
use sports_equipment::config::Config;
use sports_equipment::db;
use sports_equipment::jobs::overdue_reminder;
use sports_equipment::services::{loans::LoanPolicy, notifier::LogNotifier};
use sports_equipment::store::{LoanStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sports_equipment=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sports equipment desk...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        db_host = %config.db_host,
        db_name = %config.db_name,
        loan_duration_secs = config.loan_duration.as_secs(),
        "Configuration loaded successfully"
    );

    // Create database pool
    let pool = db::create_pool(config.connect_options()).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let store: Arc<dyn LoanStore> = Arc::new(PgStore::new(pool));
    let policy = LoanPolicy::new(config.loan_duration)?;

    // The sweeper gets its own handles, shared with requests only through the database
    let mut scheduler = overdue_reminder::start_scheduler(
        store.clone(),
        Arc::new(LogNotifier::new(config.display_offset)),
        config.sweep_interval,
    )
    .await?;

    // Serve static assets from web/static
    let static_routes = Router::new().nest_service(
        "/static",
        get_service(ServeDir::new(Path::new("web").join("static"))),
    );

    // Build router
    let app = api::router(AppState::new(store, policy, config.display_offset))
        .merge(static_routes)
        .layer(TraceLayer::new_for_http());

    let host: std::net::IpAddr = config.bind_host.parse()?;
    let addr = SocketAddr::from((host, config.port));
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    tracing::info!("Overdue reminder job stopped");

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
