/// Common test utilities for integration tests
///
/// Builds the full router over the in-memory store engine so the HTTP
/// surface can be exercised end to end without external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt as _;

use taskvault_api::app::{build_router, AppState};
use taskvault_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskvault_shared::store::memory::MemStore;
use taskvault_shared::store::{TaskStore, UserStore};

/// Test context carrying the router and its backing store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemStore>,
}

impl TestContext {
    /// Creates a fresh application over an empty in-memory store
    pub fn new() -> Self {
        let store = Arc::new(MemStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store.clone();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "integration-test-signing-key-32-bytes!".to_string(),
            },
        };

        let state = AppState::new(users, tasks, config);
        let app = build_router(state);

        Self { app, store }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Sends a JSON request, optionally authenticated
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Registers an account and returns (user json, token)
    pub async fn register(&self, email: &str, password: &str) -> (Value, String) {
        let response = self
            .send_json(
                "POST",
                "/users",
                None,
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "age": 30,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = read_json(response).await;
        let token = body["token"].as_str().unwrap().to_string();
        (body["user"].clone(), token)
    }

    /// Logs in and returns a fresh session token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .send_json(
                "POST",
                "/users/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its JSON representation
    pub async fn create_task(&self, token: &str, description: &str) -> Value {
        let response = self
            .send_json(
                "POST",
                "/tasks",
                Some(token),
                Some(json!({ "description": description })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        read_json(response).await
    }
}

/// Reads a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Reads a response body as raw bytes
pub async fn read_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
