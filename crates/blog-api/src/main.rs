//! Blog API Server
//!
//! REST API server for the blog backend.

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::ServiceExt;
use blog_api::{create_app, create_router, state::AppState};
use blog_core::config::{AppConfig, LoggingConfig, ServerConfig};
use blog_store::{MemoryStore, PgStore};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "blog_api=debug,blog_store=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; a TOML file named by BLOG_CONFIG replaces the environment
    let config = match std::env::var("BLOG_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);

    // Pick the backing store
    let state = match config.database.url.as_deref() {
        Some(_) => {
            let store = PgStore::connect(&config.database).await?;
            store.ping().await?;
            store.init_schema().await?;
            tracing::info!("Connected to PostgreSQL");
            AppState::new(config.clone(), Arc::new(store), "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            AppState::new(config.clone(), Arc::new(MemoryStore::new()), "memory")
        }
    };

    let mut router = create_router(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    if let Some(cors) = cors_layer(&config.server) {
        router = router.layer(cors);
    } else {
        tracing::info!("CORS disabled (no origins configured)");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Blog API Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    let app = create_app(router);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins; LOG_LEVEL applies one level everywhere
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if std::env::var("LOG_LEVEL").is_ok() {
            EnvFilter::new(&logging.level)
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cors_layer(server: &ServerConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(300)),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
