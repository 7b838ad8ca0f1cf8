use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::handlers::{create_task, delete_task, get_task, list_tasks, update_task};
use crate::api::middleware::{apply_chain, default_chain, CorsPolicy};
use crate::auth::{require_bearer, TokenCodec};
use crate::config::{AppConfig, ConfigError};
use crate::db::{create_pool, init_schema, SharedStore, SqliteTaskStore};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().json().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();
}

/// Task routes plus `/health`, wrapped in the middleware chain.
///
/// When `config.auth.require_auth` is set the `/tasks` routes sit behind the
/// bearer gate; `/health` and unknown paths never do.
pub fn create_app(
    store: SharedStore,
    config: &AppConfig,
    codec: Arc<TokenCodec>,
) -> Result<Router, ConfigError> {
    let mut tasks = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .with_state(store);

    if config.auth.require_auth {
        if !codec.is_configured() {
            return Err(ConfigError::MissingSigningKey);
        }
        tasks = tasks.route_layer(from_fn_with_state(codec, require_bearer));
        info!("Bearer authentication enabled for /tasks");
    }

    let router = Router::new().route("/health", get(health_check)).merge(tasks);

    Ok(apply_chain(
        router,
        default_chain(CorsPolicy::parse(&config.cors_origins)),
    ))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Open the database, ensure the schema, and build the router.
pub async fn build_from_config(config: &AppConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let pool = create_pool(&config.database_url, config.max_connections).await?;
    init_schema(&pool).await?;

    let store: SharedStore = Arc::new(SqliteTaskStore::new(pool));
    let codec = Arc::new(TokenCodec::new(&config.auth));

    Ok(create_app(store, config, codec)?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
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
}

pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Task API server");

    let config = AppConfig::from_env()?;
    let app = build_from_config(&config)
        .await?
        .layer(TimeoutLayer::new(config.request_timeout));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {}
        finished = &mut server => {
            // Server stopped on its own, before any signal
            finished??;
            return Ok(());
        }
    }

    info!("Shutting down gracefully...");
    stop_tx.send(()).ok();

    match tokio::time::timeout(config.shutdown_grace, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            grace_secs = config.shutdown_grace.as_secs(),
            "In-flight requests did not finish within the grace period; abandoning them"
        ),
    }

    info!("Server stopped");
    Ok(())
}
