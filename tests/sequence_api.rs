//! HTTP-level tests for the sequence API
//!
//! The router runs over the in-memory repository and the moka-backed cache,
//! so every request goes through the same handlers, services and cache
//! policy as in production.

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sequence_api::{
    api::create_router_with_state,
    create_in_memory_app_state,
    domain::{cache::Cache, CacheKey},
    infrastructure::{cache::InMemoryCache, sequence::InMemorySequenceRepository},
    AppConfig,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    repository: InMemorySequenceRepository,
    cache: InMemoryCache,
}

impl TestApp {
    fn new() -> Self {
        let (state, repository, cache) = create_in_memory_app_state(&AppConfig::default());

        Self {
            router: create_router_with_state(state),
            repository,
            cache,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Bytes) {
        let mut request = Request::builder().method(method).uri(uri);

        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, bytes)
    }

    async fn send_json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn create(&self, name: &str, steps: usize) -> Value {
        let steps: Vec<Value> = (1..=steps)
            .map(|i| json!({"mailSubject": format!("s{}", i), "mailContent": format!("c{}", i)}))
            .collect();

        let (status, body) = self
            .send_json(
                Method::POST,
                "/sequences",
                Some(json!({
                    "name": name,
                    "openTrackingEnabled": false,
                    "clickTrackingEnabled": true,
                    "steps": steps,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn is_cached(&self, key: CacheKey) -> bool {
        self.cache.get(&key.to_string()).await.unwrap().is_some()
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_sequence_lifecycle() {
    let app = TestApp::new();

    let created = app.create("A", 1).await;
    let id = id_of(&created);
    let uuid = Uuid::parse_str(&id).unwrap();

    assert!(!id.is_empty());
    assert_eq!(created["steps"].as_array().unwrap().len(), 1);
    assert!(created["lastUpdatedAt"].is_null());

    let (status, fetched) = app
        .send_json(Method::GET, &format!("/sequences/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "A");
    assert_eq!(fetched["openTrackingEnabled"], false);
    assert_eq!(fetched["clickTrackingEnabled"], true);
    assert!(app.is_cached(CacheKey::sequence(uuid)).await);

    let (status, updated) = app
        .send_json(
            Method::PATCH,
            &format!("/sequences/{}", id),
            Some(json!({"openTrackingEnabled": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["openTrackingEnabled"], true);
    assert!(updated["lastUpdatedAt"].as_str().is_some_and(|s| !s.is_empty()));

    let (_, refetched) = app
        .send_json(Method::GET, &format!("/sequences/{}", id), None)
        .await;
    assert_eq!(refetched["openTrackingEnabled"], true);

    let step_id = refetched["steps"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/sequences/{}/steps/{}", id, step_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, emptied) = app
        .send_json(Method::GET, &format!("/sequences/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(emptied["steps"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_hit_returns_identical_bytes() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 2).await);
    let uri = format!("/sequences/{}", id);

    let (_, miss) = app.send(Method::GET, &uri, None).await;
    let (_, hit) = app.send(Method::GET, &uri, None).await;
    assert_eq!(miss, hit);

    let (_, page_miss) = app.send(Method::GET, "/sequences", None).await;
    let (_, page_hit) = app.send(Method::GET, "/sequences", None).await;
    assert_eq!(page_miss, page_hit);
}

#[tokio::test]
async fn test_cached_detail_is_served_without_storage() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 1).await);
    let uri = format!("/sequences/{}", id);

    let (status, _) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    app.repository.set_unavailable(true);

    let (status, body) = app.send_json(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "A");
}

#[tokio::test]
async fn test_sequence_update_invalidates_every_page() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 1).await);
    app.create("B", 1).await;

    for uri in ["/sequences", "/sequences?size=1&page=0", "/sequences?size=1&page=1"] {
        let (status, _) = app.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(app.is_cached(CacheKey::page(50, 0)).await);
    assert!(app.is_cached(CacheKey::page(1, 1)).await);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/sequences/{}", id),
            Some(json!({"clickTrackingEnabled": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(!app.is_cached(CacheKey::page(50, 0)).await);
    assert!(!app.is_cached(CacheKey::page(1, 0)).await);
    assert!(!app.is_cached(CacheKey::page(1, 1)).await);
}

#[tokio::test]
async fn test_step_mutations_invalidate_parent_detail_only() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 1).await);
    let uuid = Uuid::parse_str(&id).unwrap();
    let uri = format!("/sequences/{}", id);

    app.send(Method::GET, &uri, None).await;
    app.send(Method::GET, "/sequences", None).await;

    let (status, step) = app
        .send_json(
            Method::POST,
            &format!("{}/steps", uri),
            Some(json!({"mailSubject": "s2", "mailContent": "c2"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(step["order"], 2);

    assert!(!app.is_cached(CacheKey::sequence(uuid)).await);
    assert!(app.is_cached(CacheKey::page(50, 0)).await);

    let (_, before) = app.send(Method::GET, &uri, None).await;

    let (status, patched) = app
        .send_json(
            Method::PATCH,
            &format!("{}/steps/{}", uri, step["id"].as_str().unwrap()),
            Some(json!({"mailSubject": "renamed"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["mailSubject"], "renamed");
    assert_eq!(patched["mailContent"], "c2");

    let (_, after) = app.send(Method::GET, &uri, None).await;
    assert_ne!(before, after);

    let detail: Value = serde_json::from_slice(&after).unwrap();
    assert_eq!(detail["steps"][1]["mailSubject"], "renamed");
}

#[tokio::test]
async fn test_failed_step_insert_leaves_nothing_behind() {
    let app = TestApp::new();
    app.send(Method::GET, "/sequences", None).await;
    app.repository.fail_step_insert_at(1);

    let (status, body) = app
        .send_json(
            Method::POST,
            "/sequences",
            Some(json!({
                "name": "A",
                "steps": [
                    {"mailSubject": "s1", "mailContent": "c1"},
                    {"mailSubject": "s2", "mailContent": "c2"},
                ],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "internal server error");
    assert_eq!(app.repository.sequence_count().await, 0);
    assert_eq!(app.repository.step_count().await, 0);

    // The failed write must not have flushed the cached page
    assert!(app.is_cached(CacheKey::page(50, 0)).await);
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::new();

    let cases = [
        json!({"name": "", "steps": [{"mailSubject": "s", "mailContent": "c"}]}),
        json!({"name": "A", "steps": []}),
        json!({"name": "A", "steps": [{"mailSubject": "", "mailContent": "c"}]}),
        json!({"name": "A", "steps": [
            {"mailSubject": "s1", "mailContent": "c1", "order": 1},
            {"mailSubject": "s2", "mailContent": "c2", "order": 1},
        ]}),
        json!({"steps": [{"mailSubject": "s", "mailContent": "c"}]}),
    ];

    for case in cases {
        let (status, body) = app.send_json(Method::POST, "/sequences", Some(case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    assert_eq!(app.repository.sequence_count().await, 0);
}

#[tokio::test]
async fn test_capitalized_name_is_accepted() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(
            Method::POST,
            "/sequences",
            Some(json!({"Name": "Legacy", "steps": [{"mailSubject": "s", "mailContent": "c"}]})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Legacy");
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 1).await);

    let (status, _) = app.send(Method::GET, "/sequences/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::DELETE, &format!("/sequences/{}/steps/nope", id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/sequences/nope/steps",
            Some(json!({"mailSubject": "s", "mailContent": "c"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_resources() {
    let app = TestApp::new();
    let missing = Uuid::new_v4();

    let (status, _) = app
        .send(Method::GET, &format!("/sequences/{}", missing), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!app.is_cached(CacheKey::sequence(missing)).await);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/sequences/{}/steps", missing),
            Some(json!({"mailSubject": "s", "mailContent": "c"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/sequences/{}/steps/{}", missing, Uuid::new_v4()),
            Some(json!({"mailSubject": "s"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/sequences/{}/steps/{}", missing, Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_step_cannot_be_reached_through_another_sequence() {
    let app = TestApp::new();
    let a = app.create("A", 1).await;
    let b = id_of(&app.create("B", 1).await);
    let step_of_a = a["steps"][0]["id"].as_str().unwrap();

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/sequences/{}/steps/{}", b, step_of_a),
            Some(json!({"mailSubject": "hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/sequences/{}/steps/{}", b, step_of_a),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.repository.step_count().await, 2);
}

#[tokio::test]
async fn test_delete_sequence() {
    let app = TestApp::new();
    let id = id_of(&app.create("A", 3).await);
    let uri = format!("/sequences/{}", id);

    app.send(Method::GET, &uri, None).await;

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.repository.step_count().await, 0);

    let (status, _) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::new();
    for name in ["A", "B", "C"] {
        app.create(name, 1).await;
    }

    let (status, page) = app
        .send_json(Method::GET, "/sequences?size=2&page=1", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["C"]);

    // Garbage falls back to the defaults; oversized pages are clamped
    let (status, all) = app
        .send_json(Method::GET, "/sequences?size=abc&page=-2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    app.send(Method::GET, "/sequences?size=1000", None).await;
    assert!(app.is_cached(CacheKey::page(50, 0)).await);

    let (_, beyond) = app
        .send_json(Method::GET, "/sequences?size=2&page=10", None)
        .await;
    assert!(beyond.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_opaque() {
    let app = TestApp::new();
    app.repository.set_unavailable(true);

    let (status, body) = app.send_json(Method::GET, "/sequences", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "server_error");
    assert!(!body.to_string().contains("Database unavailable"));
    assert!(!app.is_cached(CacheKey::page(50, 0)).await);
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let app = TestApp::new();

    let (status, body) = app.send_json(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"app": "ok", "database": "ok"}));

    app.repository.set_unavailable(true);

    let (status, body) = app.send_json(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"app": "ok", "database": "error"}));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/sequences")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
