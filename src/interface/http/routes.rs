use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::Registry;

use super::handlers::{add_host_handler, health_handler, history_handler, hosts_handler, AppState};

pub fn create_router(registry: Arc<Registry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/hosts", get(hosts_handler).post(add_host_handler))
        .route("/api/hosts/{hostname}/history", get(history_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use tower::ServiceExt;

    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::{HostSettings, Outcome};

    async fn registry(max_hosts: usize) -> Arc<Registry> {
        let settings = HostSettings {
            history_size: 4,
            failure_threshold: 2,
        };
        let registry = Arc::new(Registry::new(Arc::new(MemoryStore::new()), settings, max_hosts));
        registry.bootstrap().await.unwrap();
        registry
    }

    async fn send(router: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_host(hostname: &str, notify: &str) -> Request<Body> {
        Request::post("/api/hosts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "hostname": hostname, "notify": notify }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(registry(10).await);
        let (status, body) = send(router, Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["hosts"], 0);
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let registry = registry(10).await;
        let router = create_router(registry.clone());

        let (status, body) = send(router.clone(), post_host("b.example", "me@b.example")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["hostname"], "b.example");
        assert_eq!(body["status"], "no data");

        send(router.clone(), post_host("a.example", "me@a.example")).await;

        let (status, body) = send(router, Request::get("/api/hosts").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body["hosts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["hostname"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.example", "b.example"]);
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let router = create_router(registry(10).await);
        send(router.clone(), post_host("a.example", "x@a.example")).await;

        let (status, body) = send(router, post_host("a.example", "y@a.example")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already being monitored"));
    }

    #[tokio::test]
    async fn test_capacity_is_service_unavailable() {
        let router = create_router(registry(1).await);
        send(router.clone(), post_host("a.example", "x@a.example")).await;

        let (status, _) = send(router, post_host("b.example", "x@b.example")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let registry = registry(10).await;
        let router = create_router(registry.clone());

        let (status, _) = send(router.clone(), post_host("example.com/big.iso", "x@y")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(router, post_host("example.com", "  ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_history() {
        let registry = registry(10).await;
        let host = registry.add_host("a.example", "x").await.unwrap();
        host.observe(&Outcome::success(Duration::from_millis(25)), Utc::now());
        host.observe(&Outcome::failure("502 Bad Gateway", Duration::from_millis(5)), Utc::now());
        let router = create_router(registry);

        let (status, body) = send(
            router.clone(),
            Request::get("/api/hosts/a.example/history").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["capacity"], 4);
        assert_eq!(body["status"], "Error: 502 Bad Gateway");
        let samples = body["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0]["latency_ms"], 25);
        assert!(samples[0].get("error").is_none());
        assert_eq!(samples[1]["error"], "502 Bad Gateway");

        let (status, _) = send(
            router,
            Request::get("/api/hosts/nope.example/history").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
