mod config;
mod db;
mod errors;
mod models;
mod resume;
mod routes;
mod state;
mod store;
mod visitor;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, InMemoryDocumentStore, PgDocumentStore, RetryingStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first so the log level below can come from it
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    let documents = open_store(&config).await?;

    let policy = config.retry_policy();
    info!(
        "Store retries: up to {} with {}ms base backoff",
        policy.max_retries,
        policy.base_delay.as_millis()
    );
    let store: Arc<dyn DocumentStore> = Arc::new(RetryingStore::new(documents, policy));

    let state = AppState::new(store, config.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Opens the configured backend. The store lives for the whole process and is
/// shared by every request.
async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match &config.backend {
        StoreBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            let documents = PgDocumentStore::new(pool, config.collection.clone());
            documents.ensure_schema().await?;
            Ok(Arc::new(documents))
        }
        StoreBackend::Memory { seed_file } => {
            let seed: Vec<Value> = match seed_file {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read SEED_FILE '{path}'"))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("SEED_FILE '{path}' must hold a JSON array of documents"))?
                }
                None => Vec::new(),
            };
            info!("Using in-memory document store with {} seeded document(s)", seed.len());
            Ok(Arc::new(InMemoryDocumentStore::with_documents(seed)?))
        }
    }
}
