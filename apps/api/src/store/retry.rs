use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{DocumentQuery, DocumentStore, StoreError};

/// Bounded exponential backoff: `base`, `2*base`, `4*base`, ...
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX))
    }

    pub async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut retry = 0;
        loop {
            match call().await {
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    warn!(
                        "Store {op} failed ({e}), retry {retry}/{} after {}ms",
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

/// Wraps any store and retries transient failures of reads and upserts.
pub struct RetryingStore {
    inner: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl DocumentStore for RetryingStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError> {
        self.policy.run("query", || self.inner.query(query)).await
    }

    async fn upsert(&self, doc: Value) -> Result<(), StoreError> {
        self.policy
            .run("upsert", || self.inner.upsert(doc.clone()))
            .await
    }

    // Conditional writes pass straight through. If one commits but the reply
    // is lost, a repeat would fail its precondition and the caller could not
    // tell that from a real race.
    async fn replace_if_match(&self, doc: Value, etag: &str) -> Result<(), StoreError> {
        self.inner.replace_if_match(doc, etag).await
    }

    async fn create(&self, doc: Value) -> Result<(), StoreError> {
        self.inner.create(doc).await
    }
}
