use std::time::Duration;

use anyhow::{Context, Result};

use crate::store::RetryPolicy;

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// Process-local store, optionally seeded from a JSON array file.
    Memory { seed_file: Option<String> },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub collection: String,
    pub port: u16,
    pub rust_log: String,
    pub store_max_retries: u32,
    pub store_retry_base_ms: u64,
    /// Name templated into the success message; empty for a generic one.
    pub resume_owner: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend: backend_from_env()?,
            collection: optional_env("STORE_COLLECTION", "resume"),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            store_max_retries: optional_env("STORE_MAX_RETRIES", "3")
                .parse::<u32>()
                .context("STORE_MAX_RETRIES must be a non-negative integer")?,
            store_retry_base_ms: optional_env("STORE_RETRY_BASE_MS", "100")
                .parse::<u64>()
                .context("STORE_RETRY_BASE_MS must be a non-negative integer")?,
            resume_owner: optional_env("RESUME_OWNER", ""),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.store_max_retries,
            base_delay: Duration::from_millis(self.store_retry_base_ms),
        }
    }

    /// The `message` field of a successful résumé response.
    pub fn success_message(&self) -> String {
        let owner = self.resume_owner.trim();
        if owner.is_empty() {
            "Resume retrieved successfully.".to_string()
        } else {
            format!("{owner} resume retrieved successfully.")
        }
    }
}

fn backend_from_env() -> Result<StoreBackend> {
    match optional_env("STORE_BACKEND", "postgres").as_str() {
        "postgres" => Ok(StoreBackend::Postgres {
            database_url: require_env("DATABASE_URL")?,
        }),
        "memory" => Ok(StoreBackend::Memory {
            seed_file: std::env::var("SEED_FILE").ok().filter(|s| !s.is_empty()),
        }),
        other => anyhow::bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        backend: StoreBackend::Memory { seed_file: None },
        collection: "resume".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        store_max_retries: 0,
        store_retry_base_ms: 0,
        resume_owner: String::new(),
    }
}
