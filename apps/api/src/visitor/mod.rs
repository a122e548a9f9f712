//! Visitor counter. A single `visitor_count` document is bumped on every
//! successful résumé read.
//!
//! Writes go through the store's etag check, so two requests racing on the
//! same read retry instead of overwriting each other's increment.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::store::{DocumentQuery, DocumentStore, StoreError};

pub const COUNTER_ID: &str = "visitor_count";
const COUNT_FIELD: &str = "visitorCount";
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Returned by `get_count` when the counter could not be read.
pub const COUNT_UNAVAILABLE: i64 = -1;

#[derive(Clone)]
pub struct VisitorCounter {
    store: Arc<dyn DocumentStore>,
}

impl VisitorCounter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Current count: `0` when the counter document does not exist yet,
    /// `COUNT_UNAVAILABLE` when the store could not be read.
    pub async fn get_count(&self) -> i64 {
        match self.read().await {
            Ok(Some(doc)) => read_count(&doc),
            Ok(None) => 0,
            Err(e) => {
                error!("Error fetching visitor count: {e}");
                COUNT_UNAVAILABLE
            }
        }
    }

    /// Adds one visit and returns the new count.
    pub async fn increment(&self) -> Result<i64, StoreError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let outcome = match self.read().await? {
                Some(doc) => self.replace(doc).await,
                None => self
                    .store
                    .create(json!({ "id": COUNTER_ID, "visitorCount": 1 }))
                    .await
                    .map(|_| 1),
            };

            match outcome {
                // Someone else wrote (or deleted) the counter between our read
                // and write. Read again.
                Err(StoreError::PreconditionFailed | StoreError::Conflict | StoreError::NotFound) => {
                    debug!("Visitor counter write raced (attempt {attempt}), retrying");
                }
                other => return other,
            }
        }
        Err(StoreError::PreconditionFailed)
    }

    async fn read(&self) -> Result<Option<Value>, StoreError> {
        let query = DocumentQuery::new().field_equals("id", COUNTER_ID);
        Ok(self.store.query(&query).await?.into_iter().next())
    }

    async fn replace(&self, mut doc: Value) -> Result<i64, StoreError> {
        let next = read_count(&doc) + 1;
        let etag = doc.get("_etag").and_then(Value::as_str).map(str::to_owned);
        if let Some(map) = doc.as_object_mut() {
            map.insert(COUNT_FIELD.to_string(), Value::from(next));
        }
        match etag {
            Some(etag) => self.store.replace_if_match(doc, &etag).await?,
            None => self.store.upsert(doc).await?,
        }
        Ok(next)
    }
}

fn read_count(doc: &Value) -> i64 {
    doc.get(COUNT_FIELD).and_then(Value::as_i64).unwrap_or(0)
}
