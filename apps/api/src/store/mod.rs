//! Document store. This is the only way the service talks to persisted documents.
//!
//! Handlers never see a connection pool. `AppState` carries an
//! `Arc<dyn DocumentStore>` so the Postgres backend can be swapped for the
//! in-memory one in tests without touching handler code.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod retry;

pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use retry::{RetryPolicy, RetryingStore};

/// Fields owned by the store. They are attached to documents on read and
/// dropped from bodies on write.
pub const METADATA_FIELDS: [&str; 5] = ["_rid", "_self", "_etag", "_attachments", "_ts"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found")]
    NotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document version changed since it was read")]
    PreconditionFailed,

    #[error("Document already exists")]
    Conflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A single predicate over the top level of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `doc[field]` is a string equal to `value`.
    FieldEquals { field: String, value: String },
    /// `doc[field]` is an array holding an element that contains every key of
    /// `element` with an equal value.
    ArrayContains { field: String, element: Value },
}

impl Condition {
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Condition::FieldEquals { field, value } => {
                doc.get(field).and_then(Value::as_str) == Some(value.as_str())
            }
            Condition::ArrayContains { field, element } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| contains(item, element))),
        }
    }
}

/// Conjunction of conditions. An empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub conditions: Vec<Condition>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_equals(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::FieldEquals {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn array_contains(mut self, field: &str, element: Value) -> Self {
        self.conditions.push(Condition::ArrayContains {
            field: field.to_string(),
            element,
        });
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

/// Storage key of a document: its `id` plus its `lang` partition (empty when
/// the document has none).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub id: String,
    pub partition: String,
}

impl DocumentKey {
    pub fn of(doc: &Value) -> Result<Self, StoreError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Serialization("document has no string `id`".to_string()))?;
        let partition = doc.get("lang").and_then(Value::as_str).unwrap_or_default();
        Ok(Self {
            id: id.to_string(),
            partition: partition.to_string(),
        })
    }
}

/// Returns the body as it should be persisted: an object with store metadata removed.
pub fn storable_body(mut doc: Value) -> Result<Value, StoreError> {
    let map = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::Serialization("document must be a JSON object".to_string()))?;
    map.retain(|k, _| !METADATA_FIELDS.contains(&k.as_str()));
    Ok(doc)
}

/// Partial match in the sense of an `ARRAY_CONTAINS(..., partial = true)`
/// lookup: objects match on a subset of keys, everything else on equality.
fn contains(item: &Value, pattern: &Value) -> bool {
    match (item, pattern) {
        (Value::Object(item), Value::Object(pattern)) => pattern
            .iter()
            .all(|(k, v)| item.get(k).is_some_and(|iv| contains(iv, v))),
        _ => item == pattern,
    }
}

/// Persistence seam for documents grouped in one logical collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching every condition, oldest first, each carrying `_etag` and `_ts`.
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError>;

    /// Inserts the document, or replaces the one with the same key.
    async fn upsert(&self, doc: Value) -> Result<(), StoreError>;

    /// Replaces the stored document only if its etag still equals `etag`.
    async fn replace_if_match(&self, doc: Value, etag: &str) -> Result<(), StoreError>;

    /// Inserts the document; `Conflict` if the key is taken.
    async fn create(&self, doc: Value) -> Result<(), StoreError>;
}
