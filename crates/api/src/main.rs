//! API server entry point.

use api::config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use warehouse_store::{
    InMemoryWarehouseStore, PostgresWarehouseStore, ProcedureExecutor, ProcedureName,
    WarehouseStore,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Binds the listener and serves the app until a shutdown signal arrives.
async fn serve<S>(
    config: &Config,
    store: S,
    procedure: ProcedureName,
    metrics_handle: PrometheusHandle,
    store_kind: &'static str,
) where
    S: WarehouseStore + ProcedureExecutor + Clone + 'static,
{
    let state = api::create_state(store, procedure);
    let app = api::create_app(state, metrics_handle, store_kind);

    let addr = config.addr();
    tracing::info!(%addr, store = store_kind, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let procedure = config
        .procedure_name()
        .expect("FULFILLMENT_PROCEDURE is not a valid procedure name");

    // 3. Pick the store and serve
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresWarehouseStore::connect(url, config.max_connections)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            serve(&config, store, procedure, metrics_handle, "postgres").await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving from an empty in-memory store");
            let store = InMemoryWarehouseStore::new();
            serve(&config, store, procedure, metrics_handle, "in-memory").await;
        }
    }

    tracing::info!("server shut down gracefully");
}
