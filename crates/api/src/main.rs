use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};

use crowdstack_api::app::{self, AppState, Stores};
use crowdstack_api::config::Config;
use crowdstack_api::middleware;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    if let Err(e) = middleware::init_metrics() {
        warn!(error = %e, "Prometheus recorder not installed; /metrics will be empty");
    }

    info!("Starting CrowdStack API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    // Run migrations
    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let addr = config.socket_addr()?;
    info!(
        check_in_policy = %config.door_pass.check_in_policy,
        pass_ttl_secs = config.door_pass.ttl_secs,
        "Door pass settings loaded"
    );

    // Build application
    let state = AppState::new(config, Stores::postgres(&pool), Some(pool))?;
    let app = app::create_app(state);

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
