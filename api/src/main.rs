use api::routes::routes;
use api::state::AppState;
use axum::Router;
use db::store::MemoryStore;
use services::notifier::LogNotifier;
use services::question_generator::GeneratorWithFallback;
use services::{EvaluationService, Scheduler, SchedulerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_appender::rolling;
use util::config;

#[tokio::main]
async fn main() {
    // Load configuration and initialize logging
    let _log_guard = init_logging(&config::log_file());

    // Set up dependencies
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(GeneratorWithFallback::from_config());
    let notifier = Arc::new(LogNotifier);
    let service = Arc::new(EvaluationService::new(store, generator, notifier));

    // The scheduler is owned here and stopped on shutdown; nothing else
    // holds global scheduling state.
    let scheduler = Scheduler::new(service.clone(), SchedulerConfig::from_config());
    scheduler.start().await;

    // Build app router
    let cors = CorsLayer::very_permissive();
    let app = Router::new()
        .nest("/api", routes())
        .layer(cors)
        .with_state(AppState::new(service));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config::host(), config::port())
        .parse()
        .expect("Invalid address");

    println!(
        "Starting {} on http://{}:{}",
        config::project_name(),
        config::host(),
        config::port()
    );

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server crashed");

    scheduler.stop().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn init_logging(log_file: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("api=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
