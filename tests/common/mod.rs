// SPDX-License-Identifier: MIT

//! Shared test harness: an app wired against a fresh store and a temp
//! media directory, plus request/response helpers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use vidtube::config::Config;
use vidtube::db::UserStore;
use vidtube::routes::create_router;
use vidtube::AppState;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    // Held so uploaded files live as long as the app.
    _media_dir: TempDir,
}

/// Create a test app with a fresh store and temp media directory.
pub fn create_test_app() -> TestApp {
    let media_dir = TempDir::new().expect("temp media dir");
    let mut config = Config::test_default();
    config.media_dir = media_dir.path().to_string_lossy().into_owned();

    let state = Arc::new(AppState::new(config, UserStore::new()));

    TestApp {
        router: create_router(state.clone()),
        state,
        _media_dir: media_dir,
    }
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a multipart/form-data request from text fields and file parts.
#[allow(dead_code)]
pub fn multipart_request(
    uri: &str,
    text_fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Build a JSON POST request.
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body as JSON.
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("collect body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// All Set-Cookie header values of a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Extract a cookie's value from Set-Cookie headers.
#[allow(dead_code)]
pub fn cookie_value(headers: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .iter()
        .find(|h| h.starts_with(&prefix))
        .map(|h| h[prefix.len()..].split(';').next().unwrap().to_string())
}

/// Register the standard test user (alice) with an avatar. Panics on
/// anything but 201.
#[allow(dead_code)]
pub async fn register_alice(app: &TestApp) -> serde_json::Value {
    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/register",
            &[
                ("username", "alice"),
                ("email", "alice@x.com"),
                ("password", "pw123"),
                ("fullName", "Alice A"),
            ],
            &[("avatar", "avatar.png", b"fake-png-bytes")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

/// Login as alice; returns `(accessToken, refreshToken)` from the body.
#[allow(dead_code)]
pub async fn login_alice(app: &TestApp) -> (String, String) {
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/login",
            serde_json::json!({ "username": "alice", "password": "pw123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}
