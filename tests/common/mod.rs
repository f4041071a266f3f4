#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use docshelf_api::auth::{generate_jwt, Claims};
use docshelf_api::config::AppConfig;
use docshelf_api::database::models::NewUser;
use docshelf_api::database::{DocumentStore, MemoryStore};
use docshelf_api::types::DbId;
use docshelf_api::{app, AppState};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// The full router over a fresh in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Build with extra configuration variables on top of the test secret
    pub fn with_env(pairs: &[(&str, &str)]) -> Self {
        let mut vars: Vec<(String, String)> = vec![("JWT_SECRET_KEY".to_string(), SECRET.to_string())];
        vars.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = AppConfig::from_lookup(|key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .expect("test configuration");

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);

        Self {
            router: app(state),
            store,
        }
    }

    /// Insert a profile row so the user can own documents
    pub async fn seed_user(&self, user_id: DbId) -> Result<()> {
        self.store
            .create_user(NewUser {
                user_id,
                username: format!("writer{}", user_id),
                display_name: format!("Writer {}", user_id),
                email: format!("writer{}@example.com", user_id),
            })
            .await?;
        Ok(())
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    /// Send a hand-built request and decode the JSON body (`null` when empty)
    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Create a document as `token`'s user and return the response data
    pub async fn create_doc(&self, token: &str, content_json: &str) -> Result<Value> {
        let (status, body) = self
            .post(
                "/api/create-doc",
                Some(token),
                serde_json::json!({ "title": "Draft", "content_json": content_json }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create failed: {} {}", status, body);
        Ok(body["data"].clone())
    }
}

/// One-hour HS256 token for `user_id`
pub fn token_for(user_id: DbId) -> String {
    generate_jwt(&Claims::new(user_id, chrono::Duration::hours(1)), SECRET).expect("token")
}

/// Every response carries exactly the four envelope keys
pub fn assert_envelope(body: &Value, status: &str) {
    let obj = body.as_object().expect("envelope object");
    assert_eq!(obj.len(), 4, "unexpected envelope shape: {}", body);
    for key in ["status", "message", "data", "errors"] {
        assert!(obj.contains_key(key), "missing {} in {}", key, body);
    }
    assert_eq!(obj["status"], status, "{}", body);
}
