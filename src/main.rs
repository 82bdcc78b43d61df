use excel_translate_jobs::{
    app_state::AppState,
    config::AppConfig,
    routes,
    services::workflow::RedisWorkflowQueue,
    store::RedisJobStore,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing excel-translate-jobs server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // Register application metrics
    metrics::describe_counter!(
        "translation_jobs_started_total",
        "Translation jobs whose workflow was triggered"
    );
    metrics::describe_counter!(
        "translation_jobs_start_failed_total",
        "Translation jobs that could not be recorded or triggered"
    );
    metrics::describe_counter!(
        "job_status_requests_total",
        "Job status reads, labelled by reported status"
    );
    metrics::describe_counter!(
        "malformed_job_payloads_total",
        "Stored progress/stats payloads that could not be parsed"
    );
    metrics::describe_gauge!(
        "workflow_queue_depth",
        "Execution requests not yet picked up by the workflow runner"
    );

    tracing::info!("Connecting to Redis job store");
    let store = RedisJobStore::new(&config.redis_url, config.job_key_prefix.clone())
        .expect("Failed to initialize job store");

    tracing::info!("Connecting to Redis workflow queue");
    let workflow = RedisWorkflowQueue::new(&config.redis_url, config.workflow_queue_key.clone())
        .expect("Failed to initialize workflow queue");

    let state = AppState::new(store, workflow);
    let app = routes::router(state, prometheus_handle);

    tracing::info!("Starting excel-translate-jobs on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
