use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{storable_body, DocumentKey, DocumentQuery, DocumentStore, StoreError};

struct StoredDocument {
    key: DocumentKey,
    body: Value,
    etag: String,
    ts: i64,
}

impl StoredDocument {
    fn new(key: DocumentKey, body: Value) -> Self {
        Self {
            key,
            body,
            etag: Uuid::new_v4().to_string(),
            ts: Utc::now().timestamp(),
        }
    }

    fn with_metadata(&self) -> Value {
        let mut doc = self.body.clone();
        if let Some(map) = doc.as_object_mut() {
            map.insert("_etag".to_string(), Value::String(self.etag.clone()));
            map.insert("_ts".to_string(), Value::from(self.ts));
        }
        doc
    }
}

/// Process-local document store with the same semantics as the Postgres one.
/// Used by tests and as a fake for local runs.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<StoredDocument>>,
    unavailable: AtomicBool,
}

impl InMemoryDocumentStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `docs`, in order.
    pub fn with_documents(docs: impl IntoIterator<Item = Value>) -> Result<Self, StoreError> {
        let mut stored = Vec::new();
        for doc in docs {
            let key = DocumentKey::of(&doc)?;
            stored.push(StoredDocument::new(key, storable_body(doc)?));
        }
        Ok(Self {
            docs: RwLock::new(stored),
            unavailable: AtomicBool::new(false),
        })
    }

    /// While set, every call fails with `StoreError::Unavailable`.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|d| query.matches(&d.body))
            .map(StoredDocument::with_metadata)
            .collect())
    }

    async fn upsert(&self, doc: Value) -> Result<(), StoreError> {
        self.check_available()?;
        let key = DocumentKey::of(&doc)?;
        let body = storable_body(doc)?;
        let mut docs = self.docs.write().await;
        let replacement = StoredDocument::new(key, body);
        match docs.iter_mut().find(|d| d.key == replacement.key) {
            Some(existing) => *existing = replacement,
            None => docs.push(replacement),
        }
        Ok(())
    }

    async fn replace_if_match(&self, doc: Value, etag: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let key = DocumentKey::of(&doc)?;
        let body = storable_body(doc)?;
        let mut docs = self.docs.write().await;
        let existing = docs
            .iter_mut()
            .find(|d| d.key == key)
            .ok_or(StoreError::NotFound)?;
        if existing.etag != etag {
            return Err(StoreError::PreconditionFailed);
        }
        *existing = StoredDocument::new(key, body);
        Ok(())
    }

    async fn create(&self, doc: Value) -> Result<(), StoreError> {
        self.check_available()?;
        let key = DocumentKey::of(&doc)?;
        let body = storable_body(doc)?;
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.key == key) {
            return Err(StoreError::Conflict);
        }
        docs.push(StoredDocument::new(key, body));
        Ok(())
    }
}
