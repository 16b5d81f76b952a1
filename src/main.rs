use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sync_wizard::api::{self, auth::AuthService, validation, wizard::WizardService};
use sync_wizard::clock::{Clock, SystemClock};
use sync_wizard::config::{Cli, Config};
use sync_wizard::gateway::SimulatedGateway;
use sync_wizard::session::{SessionManager, SimulatedAuthProvider};
use sync_wizard::shutdown::ShutdownCoordinator;
use sync_wizard::storage::{FileStore, KeyValueStore};
use sync_wizard::wizard::{DraftStore, WizardController};
use sync_wizard::worker::SessionTicker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment first, then command-line overrides
    let Config {
        bind_addr,
        storage_dir,
        log_dir,
        max_payload_size,
        session_timeout_minutes,
        session_check_interval_secs,
        simulated_latency_ms,
    } = Config::from_env()
        .map(|config| config.with_cli(Cli::parse()))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    std::fs::create_dir_all(&log_dir)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    // Daily rotating files per level, e.g. logs/info.log.2026-10-19
    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, "info.log"))
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, "warn.log"))
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, "error.log"))
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, "debug.log"))
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();

    info!("Starting sync-wizard application");
    info!("Configuration loaded successfully:");
    info!("  - Storage directory: {}", storage_dir.display());
    info!("  - Max payload size: {} bytes", max_payload_size);
    info!("  - Session timeout: {} minutes", session_timeout_minutes);
    info!("  - Session check interval: {} seconds", session_check_interval_secs);
    info!("  - Simulated latency: {} ms", simulated_latency_ms);

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&storage_dir)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let latency = Duration::from_millis(simulated_latency_ms);

    let sessions = SessionManager::new(
        store.clone(),
        clock.clone(),
        chrono::Duration::minutes(session_timeout_minutes),
    );
    let auth = Arc::new(AuthService::new(
        sessions,
        Arc::new(SimulatedAuthProvider::new(latency)),
    ));

    let mut controller = WizardController::new(clock);
    let drafts = DraftStore::new(store.clone());
    if controller.load_draft(&drafts) {
        info!("Resumed saved wizard draft");
    }
    let wizard = Arc::new(WizardService::new(
        controller,
        Arc::new(SimulatedGateway::new(latency)),
        drafts,
    ));

    // watch channel lets every worker observe the same shutdown flag
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let ticker = SessionTicker::new(auth.clone(), Duration::from_secs(session_check_interval_secs));
    let ticker_handle = tokio::spawn(async move { ticker.run(shutdown_rx).await });

    let server_auth = web::Data::from(auth);
    let server_wizard = web::Data::from(wizard.clone());
    let server_store: web::Data<dyn KeyValueStore> = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_auth.clone())
            .app_data(server_wizard.clone())
            .app_data(server_store.clone())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(validation::json_config().limit(max_payload_size))
            .app_data(validation::query_config())
            .configure(api::routes)
    });

    info!("Server starting on http://{}", bind_addr);

    let server = server.bind(bind_addr.as_str())?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(
        server_handle,
        server_task,
        vec![ticker_handle],
        shutdown_tx,
        wizard,
    );

    coordinator.wait_for_shutdown().await
}
