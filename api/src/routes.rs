use axum::{
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog_routes = Router::new()
        .route(
            "/api/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/api/categories/:id",
            get(handlers::categories::get_category).delete(handlers::categories::delete_category),
        )
        .route(
            "/api/resources",
            get(handlers::resources::list_resources).post(handlers::resources::create_resource),
        )
        .route(
            "/api/resources/search",
            get(handlers::resources::search_resources),
        )
        .route(
            "/api/resources/:id",
            get(handlers::resources::get_resource).delete(handlers::resources::delete_resource),
        )
        .route(
            "/api/resources/:id/featured",
            put(handlers::resources::set_featured),
        );

    // Operational endpoints stay available while degraded
    let ops_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(catalog_routes)
        .merge(ops_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::catalog::{InMemoryCatalogStore, Persistence};
    use common::lifecycle::LifecycleState;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app(persistence: Persistence, state: LifecycleState) -> Router {
        let (_tx, rx) = watch::channel(state);
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        create_router(AppState::new(persistence, rx, metrics))
    }

    fn ready_app() -> Router {
        app(
            Persistence::Ready(Arc::new(InMemoryCatalogStore::new())),
            LifecycleState::Ready,
        )
    }

    fn degraded_app() -> Router {
        app(
            Persistence::degraded("connection refused"),
            LifecycleState::Degraded {
                reason: "connection refused".into(),
            },
        )
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (status, body) = send(&ready_app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_health_degraded() {
        let (status, body) = send(&degraded_app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["reason"], "connection refused");
    }

    #[tokio::test]
    async fn test_degraded_catalog_returns_503() {
        let app = degraded_app();
        for uri in ["/api/categories", "/api/resources", "/api/resources/search?q=x"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            assert_eq!(body["code"], "PERSISTENCE_UNAVAILABLE");
        }
    }

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let app = ready_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/categories",
            Some(json!({ "name": "CI/CD", "description": "pipelines" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let category_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/api/resources",
            Some(json!({
                "title": "Jenkins Guide",
                "description": "setup",
                "url": "https://example.com/jenkins",
                "categoryId": category_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["featured"], false);
        let resource_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/resources/{resource_id}/featured"),
            Some(json!({ "featured": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["featured"], true);

        let (_, body) = send(&app, "GET", "/api/resources?featured=true", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", "/api/resources/search?q=JENKINS", None).await;
        assert_eq!(body["data"][0]["title"], "Jenkins Guide");

        let uri = format!("/api/resources/{resource_id}");
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let app = ready_app();
        let (_, body) = send(
            &app,
            "POST",
            "/api/categories",
            Some(json!({ "name": "Cloud" })),
        )
        .await;
        let category_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/api/resources",
            Some(json!({
                "title": "Bad",
                "description": "relative",
                "url": "/docs",
                "categoryId": category_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, "POST", "/api/categories", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_category_is_404() {
        let (status, body) = send(
            &ready_app(),
            "POST",
            "/api/resources",
            Some(json!({
                "title": "Orphan",
                "description": "no parent",
                "url": "https://example.com",
                "categoryId": 99,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"]["entity"], "category");
    }

    #[tokio::test]
    async fn test_malformed_path_id_is_validation_error() {
        let app = ready_app();
        for (method, uri) in [
            ("GET", "/api/resources/abc"),
            ("DELETE", "/api/resources/99999999999"),
            ("GET", "/api/categories/x1"),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
            assert_eq!(body["code"], "VALIDATION_ERROR", "{method} {uri}");
        }

        let (status, body) = send(
            &app,
            "PUT",
            "/api/resources/nope/featured",
            Some(json!({ "featured": true })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exposes_catalog_counters() {
        // Only test in this binary that installs the global recorder
        let metrics = common::telemetry::init_metrics().unwrap();
        let (_tx, rx) = watch::channel(LifecycleState::Ready);
        let app = create_router(AppState::new(
            Persistence::Ready(Arc::new(InMemoryCatalogStore::new())),
            rx,
            metrics,
        ));

        let (status, _) = send(&app, "GET", "/api/resources/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("catalog_operations_total"));
        assert!(text.contains("operation=\"get_resource\""));
        assert!(text.contains("outcome=\"not_found\""));
    }
}
