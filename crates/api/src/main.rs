use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use domain::services::{SystemClock, NOTIFICATION_TEMPLATE};
use ecards_api::app::{create_app, AppState, Collaborators};
use ecards_api::config::Config;
use ecards_api::jobs::{DeliveryPassJob, JobScheduler, PoolMetricsJob, RetentionSweepJob};
use ecards_api::middleware::{init_metrics, logging::init_logging};
use ecards_api::services::{
    EmailNotificationSender, EmailService, EmailTemplates, LocalArtworkStore,
};
use persistence::repositories::{CardRepository, TemplateRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.logging);
    init_metrics().context("Failed to install metrics recorder")?;

    info!("Starting {} API v{}", config.app.name, env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;
    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    let artwork = LocalArtworkStore::new(&config.storage.custom_art_path);
    artwork
        .ensure_root()
        .await
        .with_context(|| format!("Cannot create {}", config.storage.custom_art_path))?;
    let premade_art = LocalArtworkStore::new(&config.storage.premade_art_path);

    let templates = if config.email.templates_dir.is_empty() {
        EmailTemplates::default()
    } else {
        EmailTemplates::load(Path::new(&config.email.templates_dir), NOTIFICATION_TEMPLATE).await?
    };
    let notifier = EmailNotificationSender::new(
        EmailService::new(config.email.clone(), &config.app.name),
        templates,
        config.app.frontend_url.clone(),
        config.app.name.clone(),
    );
    if config.app.frontend_url.is_empty() {
        tracing::warn!("app.frontend_url is not set; notifications will fail until it is");
    }

    let collaborators = Collaborators {
        cards: Arc::new(CardRepository::new(pool.clone())),
        templates: Arc::new(TemplateRepository::new(pool.clone())),
        artwork: Arc::new(artwork),
        premade_art: Arc::new(premade_art),
        notifier: Arc::new(notifier),
        clock: Arc::new(SystemClock),
    };

    let mut scheduler = JobScheduler::new(config.jobs.startup_delay());
    scheduler.register(RetentionSweepJob::new(
        collaborators.retention_sweeper(),
        config.jobs.retention_interval_secs,
    ));
    scheduler.register(DeliveryPassJob::new(
        collaborators.delivery_scheduler(),
        config.jobs.delivery_interval_secs,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    let addr = config.socket_addr().context("Invalid server address")?;
    let shutdown_timeout = config.jobs.shutdown_timeout();
    let state = AppState::new(config, &collaborators).context("Invalid auth configuration")?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(shutdown_timeout).await;
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
