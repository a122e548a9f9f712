pub mod health;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/getresumedata",
            get(handlers::handle_get_resume_data).post(handlers::handle_get_resume_data),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // The landing page may be served from another origin.
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;
    use crate::store::InMemoryDocumentStore;

    fn router() -> Router {
        build_router(AppState::new(
            Arc::new(InMemoryDocumentStore::new()),
            test_config(),
        ))
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-api");
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/getresumedata?id=cv&lang=en")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
