//! Common test utilities for integration tests.
//!
//! The app is wired to in-memory stores, so these tests need no database.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use uuid::Uuid;

use domain::services::{ManualClock, MemoryArtworkStore, MockNotificationSender};
use domain::store::InMemoryCardStore;
use ecards_api::app::{create_app, AppState, Collaborators};
use ecards_api::config::Config;
use ecards_api::services::LocalArtworkStore;

/// Shared secret of the HS256 test configuration.
pub const TEST_TOKEN_SECRET: &str = "test_secret_key_for_ecards_tokens";

pub const MULTIPART_BOUNDARY: &str = "ecards-test-boundary";

/// A router plus handles on its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryCardStore>,
    pub artwork: Arc<MemoryArtworkStore>,
    pub notifier: Arc<MockNotificationSender>,
    pub clock: Arc<ManualClock>,
    pub collaborators: Collaborators,
    pub premade_dir: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_notifier(MockNotificationSender::new()).await
    }

    pub async fn with_notifier(notifier: MockNotificationSender) -> Self {
        let premade_dir = std::env::temp_dir().join(format!("ecards-premade-{}", Uuid::new_v4()));
        let premade_dir_str = premade_dir.to_string_lossy().to_string();

        let config = Config::load_for_test(&[
            ("database.url", "postgres://localhost/ecards_test"),
            ("storage.premade_art_path", premade_dir_str.as_str()),
        ])
        .expect("Failed to load test config");

        let premade_art = LocalArtworkStore::new(&premade_dir);
        premade_art
            .ensure_root()
            .await
            .expect("Failed to create premade art dir");

        let store = Arc::new(InMemoryCardStore::new());
        let artwork = Arc::new(MemoryArtworkStore::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let collaborators = Collaborators {
            cards: store.clone(),
            templates: store.clone(),
            artwork: artwork.clone(),
            premade_art: Arc::new(premade_art),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };
        let state = AppState::new(config, &collaborators).expect("Failed to build app state");

        Self {
            router: create_app(state),
            store,
            artwork,
            notifier,
            clock,
            collaborators,
            premade_dir,
        }
    }
}

/// Signs a token the test configuration accepts.
pub fn mint_token(email: &str, roles: &[&str]) -> String {
    let claims = serde_json::json!({
        "sub": Uuid::new_v4().to_string(),
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "email": email,
        "roles": roles,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_TOKEN_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

pub fn user_token(email: &str) -> String {
    mint_token(email, &["user"])
}

pub fn admin_token() -> String {
    mint_token("admin@example.com", &["admin"])
}

/// A file part of a multipart form.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Encodes text fields and an optional file as `multipart/form-data`.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<FilePart<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Form fields of a valid card sent by `sender_email`.
pub fn card_fields(sender_email: &str) -> Vec<(&'static str, String)> {
    vec![
        ("senderName", "Alice".to_string()),
        ("senderEmail", sender_email.to_string()),
        ("recipientName", "Bob".to_string()),
        ("recipientEmail", "bob@example.com".to_string()),
        ("message", "Happy Birthday!".to_string()),
    ]
}

pub fn multipart_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request_with_auth(method: Method, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap_or(Value::Null)
}
