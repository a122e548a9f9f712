//! Postgres-backed document store. Documents live as JSONB bodies in a single
//! `documents` table, one logical collection per `collection` value.
//!
//! Every piece of caller input, field names included, reaches Postgres as a
//! bound parameter. The only text spliced into SQL is the fixed condition
//! templates below.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use super::{storable_body, Condition, DocumentKey, DocumentQuery, DocumentStore, StoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq           BIGSERIAL,
    collection    TEXT   NOT NULL,
    id            TEXT   NOT NULL,
    partition_key TEXT   NOT NULL DEFAULT '',
    body          JSONB  NOT NULL,
    etag          UUID   NOT NULL,
    ts            BIGINT NOT NULL,
    PRIMARY KEY (collection, id, partition_key)
)
"#;

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindParam {
    Text(String),
    Json(Value),
}

/// SQL text plus the parameters for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindParam>,
}

impl QueryBuf {
    fn push_param(&mut self, p: BindParam) -> usize {
        self.params.push(p);
        self.params.len()
    }
}

/// Compiles a document query for `collection` into parameterized SQL.
pub fn compile_query(collection: &str, query: &DocumentQuery) -> QueryBuf {
    let mut q = QueryBuf {
        sql: String::new(),
        params: Vec::new(),
    };
    let c = q.push_param(BindParam::Text(collection.to_string()));
    let mut sql = format!(
        "SELECT body || jsonb_build_object('_etag', etag::text, '_ts', ts) AS doc \
         FROM documents WHERE collection = ${c}"
    );

    for condition in &query.conditions {
        match condition {
            Condition::FieldEquals { field, value } => {
                let f = q.push_param(BindParam::Text(field.clone()));
                let v = q.push_param(BindParam::Text(value.clone()));
                sql.push_str(&format!(" AND body ->> ${f}::text = ${v}::text"));
            }
            Condition::ArrayContains { field, element } => {
                let f = q.push_param(BindParam::Text(field.clone()));
                // jsonb containment is recursive, so `[elem]` matches any array
                // holding a superset of `elem`.
                let e = q.push_param(BindParam::Json(Value::Array(vec![element.clone()])));
                sql.push_str(&format!(
                    " AND jsonb_typeof(body -> ${f}::text) = 'array' AND body -> ${f}::text @> ${e}::jsonb"
                ));
            }
        }
    }

    sql.push_str(" ORDER BY seq");
    q.sql = sql;
    q
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [BindParam],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            BindParam::Text(s) => query.bind(s.as_str()),
            BindParam::Json(v) => query.bind(v),
        };
    }
    query
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    collection: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    /// Creates the `documents` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("Document table ready (collection '{}')", self.collection);
        Ok(())
    }

    fn prepare(doc: Value) -> Result<(DocumentKey, Value), StoreError> {
        let key = DocumentKey::of(&doc)?;
        Ok((key, storable_body(doc)?))
    }

    async fn exists(&self, key: &DocumentKey) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2 AND partition_key = $3)",
        )
        .bind(&self.collection)
        .bind(&key.id)
        .bind(&key.partition)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, StoreError> {
        let compiled = compile_query(&self.collection, query);
        let rows = bind_all(sqlx::query(&compiled.sql), &compiled.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<Value, _>("doc").map_err(StoreError::from))
            .collect()
    }

    async fn upsert(&self, doc: Value) -> Result<(), StoreError> {
        let (key, body) = Self::prepare(doc)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, partition_key, body, etag, ts)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (collection, id, partition_key)
            DO UPDATE SET body = EXCLUDED.body, etag = EXCLUDED.etag, ts = EXCLUDED.ts
            "#,
        )
        .bind(&self.collection)
        .bind(&key.id)
        .bind(&key.partition)
        .bind(&body)
        .bind(Uuid::new_v4())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_if_match(&self, doc: Value, etag: &str) -> Result<(), StoreError> {
        let (key, body) = Self::prepare(doc)?;
        let Ok(expected) = Uuid::parse_str(etag) else {
            return Err(StoreError::PreconditionFailed);
        };
        let result = sqlx::query(
            r#"
            UPDATE documents SET body = $1, etag = $2, ts = $3
            WHERE collection = $4 AND id = $5 AND partition_key = $6 AND etag = $7
            "#,
        )
        .bind(&body)
        .bind(Uuid::new_v4())
        .bind(Utc::now().timestamp())
        .bind(&self.collection)
        .bind(&key.id)
        .bind(&key.partition)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        if self.exists(&key).await? {
            Err(StoreError::PreconditionFailed)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn create(&self, doc: Value) -> Result<(), StoreError> {
        let (key, body) = Self::prepare(doc)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, partition_key, body, etag, ts)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (collection, id, partition_key) DO NOTHING
            "#,
        )
        .bind(&self.collection)
        .bind(&key.id)
        .bind(&key.partition)
        .bind(&body)
        .bind(Uuid::new_v4())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_empty_query_scopes_to_collection() {
        let q = compile_query("resume", &DocumentQuery::new());
        assert!(q.sql.contains("WHERE collection = $1 ORDER BY seq"));
        assert_eq!(q.params, vec![BindParam::Text("resume".into())]);
    }

    #[test]
    fn test_compile_binds_every_value() {
        let query = DocumentQuery::new()
            .field_equals("id", "cv")
            .field_equals("lang", "en")
            .array_contains("sections", json!({"type": "work"}));
        let q = compile_query("resume", &query);

        assert!(q.sql.contains("body ->> $2::text = $3::text"));
        assert!(q.sql.contains("body ->> $4::text = $5::text"));
        assert!(q.sql.contains("body -> $6::text @> $7::jsonb"));
        assert_eq!(q.params.len(), 7);
        assert_eq!(q.params[6], BindParam::Json(json!([{"type": "work"}])));
    }

    #[test]
    fn test_compile_never_splices_input() {
        let hostile = "x' OR '1'='1";
        let query = DocumentQuery::new()
            .field_equals("id", hostile)
            .array_contains("sections", json!({"type": hostile}));
        let q = compile_query("resume", &query);
        assert!(!q.sql.contains(hostile));
        assert!(!q.sql.contains("'1'='1"));
        assert!(q.params.contains(&BindParam::Text(hostile.to_string())));
    }
}
