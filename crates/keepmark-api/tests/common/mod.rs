//! Shared helpers: a router over the in-memory store and a scripted title resolver.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for `.oneshot()`

use keepmark_api::config::{AuthConfig, Environment, ServerConfig};
use keepmark_api::services::TitleResolver;
use keepmark_api::AppState;
use keepmark_core::{Error, Result};
use keepmark_db::{MemoryStore, Repositories};

/// Returns a fixed title, or fails every fetch when built with `None`.
pub struct StubResolver {
    title: Option<String>,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn returning(title: &str) -> Arc<Self> {
        Arc::new(Self {
            title: Some(title.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            title: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleResolver for StubResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.title
            .clone()
            .ok_or_else(|| Error::Fetch(format!("{} is unreachable", url)))
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::new("test-secret").with_bcrypt_cost(4)
}

pub fn router_with(
    repos: impl Into<Repositories>,
    resolver: Arc<StubResolver>,
    environment: Environment,
) -> Router {
    let state = AppState::new(repos, auth_config(), resolver);
    let config = ServerConfig {
        environment,
        ..Default::default()
    };
    keepmark_api::app(state, &config)
}

pub fn setup() -> Router {
    setup_with_resolver(StubResolver::returning("Resolved Title"))
}

pub fn setup_with_resolver(resolver: Arc<StubResolver>) -> Router {
    router_with(MemoryStore::new(), resolver, Environment::Production)
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(val) => builder.body(Body::from(val.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
}

/// Send a request and return `(status, body)`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

/// Register a user and return `(id, token)`.
pub async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["data"]["id"].as_str().unwrap().to_string(),
        body["data"]["token"].as_str().unwrap().to_string(),
    )
}

/// Create a note and return its id.
pub async fn create_note(app: &Router, token: Option<&str>, body: Value) -> String {
    let (status, body) = send(app, Method::POST, "/api/notes", token, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

pub fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect()
}
