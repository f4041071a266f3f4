mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use common::{assert_envelope, token_for, TestApp, SECRET};

fn sign(claims: Value, secret: &str, algorithm: Algorithm) -> String {
    encode(&Header::new(algorithm), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

fn in_an_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

async fn list_with_header(app: &TestApp, value: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .uri("/api/user-doc")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())?;
    app.send(request).await
}

#[tokio::test]
async fn missing_header_is_rejected() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/api/user-doc", None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, "error");
    assert_eq!(body["message"], "Authorization header is missing");
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = list_with_header(&app, &format!("Token {}", token_for(1))).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authorization format. Use 'Bearer <token>'");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_invalid() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/api/user-doc", Some("not.a.jwt")).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn foreign_signature_is_invalid() -> Result<()> {
    let app = TestApp::new();
    let token = sign(json!({"user_id": 1, "exp": in_an_hour()}), "some-other-secret", Algorithm::HS256);

    let (status, body) = app.get("/api/user-doc", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
    assert_eq!(body["errors"], "signature mismatch");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() -> Result<()> {
    let app = TestApp::new();
    let expired = chrono::Utc::now().timestamp() - 3600;
    let token = sign(json!({"user_id": 1, "exp": expired}), SECRET, Algorithm::HS256);

    let (status, body) = app.get("/api/user-doc", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn token_expired_seconds_ago_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let expired = chrono::Utc::now().timestamp() - 30;
    let token = sign(json!({"user_id": 5, "exp": expired}), SECRET, Algorithm::HS256);

    let (status, body) = app.get("/api/user-doc", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn non_ascii_header_is_an_invalid_scheme() -> Result<()> {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/user-doc")
        .header(header::AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff\xfe")?)
        .body(Body::empty())?;

    let (status, body) = app.send(request).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authorization format. Use 'Bearer <token>'");
    Ok(())
}

#[tokio::test]
async fn token_without_subject_is_rejected() -> Result<()> {
    let app = TestApp::new();

    for claims in [
        json!({"exp": in_an_hour()}),
        json!({"user_id": 0, "exp": in_an_hour()}),
        json!({"user_id": "abc", "exp": in_an_hour()}),
    ] {
        let token = sign(claims, SECRET, Algorithm::HS256);
        let (status, body) = app.get("/api/user-doc", Some(&token)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User ID not found in token");
    }
    Ok(())
}

#[tokio::test]
async fn numeric_string_subject_and_other_hmac_sizes_are_accepted() -> Result<()> {
    let app = TestApp::new();

    let string_subject = sign(json!({"user_id": "42", "exp": in_an_hour()}), SECRET, Algorithm::HS256);
    let (status, _) = app.get("/api/user-doc", Some(&string_subject)).await?;
    assert_eq!(status, StatusCode::OK);

    let hs512 = sign(json!({"user_id": 42, "exp": in_an_hour()}), SECRET, Algorithm::HS512);
    let (status, _) = app.get("/api/user-doc", Some(&hs512)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn public_endpoints_need_no_token() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_envelope(&body, "success");

    let (status, _) = app.get("/api/doc/Abc1234", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn every_protected_route_requires_a_token() -> Result<()> {
    let app = TestApp::new();

    let checks = [
        app.get("/api/user-doc", None).await?,
        app.post("/api/create-doc", None, json!({"content_json": "{}"})).await?,
        app.put("/api/update-doc/1", None, json!({"content_json": "{}"})).await?,
        app.delete("/api/delete-doc/1", None).await?,
        app.get("/api/list-doc-versions/1", None).await?,
        app.post("/api/restore-version/", None, json!({"version_id": 1})).await?,
    ];

    for (status, body) in checks {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_envelope(&body, "error");
    }
    Ok(())
}
