//! Inbound HTTP contract tests
//!
//! Exercises the router end to end with a stubbed provider API, asserting
//! the exact wire shapes of the token endpoint.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use ks_broker::{
    config::{Config, ProviderConfig},
    errors::AppResult,
    services::{SessionApi, SessionStartParams, SessionTokenService},
    web::{AppState, WebServer},
};

/// Provider stub that records calls and replays a canned body
struct StubApi {
    calls: AtomicUsize,
    last_privileges: Mutex<Option<String>>,
    body: Value,
}

impl StubApi {
    fn returning(body: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_privileges: Mutex::new(None),
            body,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_privileges(&self) -> Option<String> {
        self.last_privileges.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionApi for StubApi {
    async fn session_start(
        &self,
        _endpoint: &str,
        params: &SessionStartParams,
    ) -> AppResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_privileges.lock().unwrap() = Some(params.privileges.clone());
        Ok(self.body.clone())
    }
}

fn configured_provider() -> ProviderConfig {
    ProviderConfig {
        api_endpoint: "https://provider.example.com/api_v3".to_string(),
        partner_id: 123,
        admin_secret: "s3cret".to_string(),
        default_entry_id: "1_default99".to_string(),
        ..ProviderConfig::default()
    }
}

fn app_with(provider: ProviderConfig, api: Arc<StubApi>) -> Router {
    let config = Config {
        provider: provider.clone(),
        ..Config::default()
    };
    WebServer::router(AppState {
        config,
        session_tokens: Arc::new(SessionTokenService::new(provider, api)),
    })
}

// Helper function to send requests to the app
async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = app_with(configured_provider(), StubApi::returning(json!("tok")));

    let (status, response) = send_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "status": "ok" }));
}

#[tokio::test]
async fn valid_entry_id_returns_token() {
    let api = StubApi::returning(json!("\"djJ8MTIzfGFiYw==\""));
    let app = app_with(configured_provider(), api.clone());

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/ks",
        Some(json!({ "entryId": "9_abcdefgh" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "ks": "djJ8MTIzfGFiYw==" }));

    let privileges = api.last_privileges().unwrap();
    assert!(privileges.contains("sview:9_abcdefgh"));
    assert!(privileges.contains("eventsessioncontextid:9_abcdefgh"));
    assert!(!privileges.contains("1_default99"));
}

#[tokio::test]
async fn missing_body_uses_default_privileges() {
    let api = StubApi::returning(json!("tok123"));
    let app = app_with(configured_provider(), api.clone());

    let (status, response) = send_request(&app, Method::POST, "/api/ks", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["ks"], "tok123");
    let privileges = api.last_privileges().unwrap();
    assert!(privileges.contains("sview:1_default99"));
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    let api = StubApi::returning(json!("tok123"));
    let app = app_with(configured_provider(), api);

    let (status, _) = send_request(
        &app,
        Method::POST,
        "/api/ks",
        Some(json!({ "entryId": "9_abcdefgh", "debug": true, "nested": { "x": 1 } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_entry_id_is_rejected_before_any_outbound_call() {
    let api = StubApi::returning(json!("tok"));
    let app = app_with(configured_provider(), api.clone());

    for bad in ["abcdefgh", "1_short", "12_abcdefgh", "1-abcdefgh", ""] {
        let (status, response) = send_request(
            &app,
            Method::POST,
            "/api/ks",
            Some(json!({ "entryId": bad })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "for entry id {bad:?}");
        assert_eq!(response["status"], 400);
        assert_eq!(response["error"], "Validation Error");
        assert_eq!(response["details"][0]["field"], "entryId");
        assert!(response["details"][0]["message"].is_string());
    }

    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn malformed_json_body_uses_the_validation_shape() {
    let api = StubApi::returning(json!("tok"));
    let app = app_with(configured_provider(), api.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/ks")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["details"][0]["field"], "body");
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn non_string_entry_id_is_a_validation_error() {
    let api = StubApi::returning(json!("tok"));
    let app = app_with(configured_provider(), api.clone());

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/ks",
        Some(json!({ "entryId": 42 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Validation Error");
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn upstream_empty_object_maps_to_generic_500() {
    let api = StubApi::returning(json!({}));
    let app = app_with(configured_provider(), api);

    let (status, response) = send_request(&app, Method::POST, "/api/ks", Some(json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response,
        json!({ "error": "Failed to generate KS token", "status": 500 })
    );
}

#[tokio::test]
async fn unconfigured_provider_maps_to_generic_500_without_outbound_call() {
    let api = StubApi::returning(json!("tok"));
    let provider = ProviderConfig {
        admin_secret: String::new(),
        ..configured_provider()
    };
    let app = app_with(provider, api.clone());

    let (status, response) = send_request(&app, Method::POST, "/api/ks", Some(json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // operator detail stays in the logs, not in the response
    assert_eq!(response["error"], "Failed to generate KS token");
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = app_with(configured_provider(), StubApi::returning(json!("tok")));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert!(headers.contains_key("Content-Security-Policy"));
}
