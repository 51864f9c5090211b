//! Integration tests for the card endpoints.
//!
//! The router runs against in-memory stores; no database is required.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use fake::faker::name::en::Name;
use fake::Fake;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    body_bytes, card_fields, get_request, get_request_with_auth, multipart_body,
    multipart_request, parse_response_body, post_request_with_auth, user_token, FilePart, TestApp,
};
use domain::services::MockNotificationSender;
use domain::store::CardStore;

const SENDER: &str = "alice@example.com";

fn form<'a>(fields: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

/// Creates a card through the API and returns its id.
async fn create_card(app: &TestApp, extra: &[(&'static str, String)]) -> Uuid {
    let mut fields = card_fields(SENDER);
    fields.extend_from_slice(extra);
    let body = multipart_body(&form(&fields), None);

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/ecards", &user_token(SENDER), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = parse_response_body(response).await;
    json["id"].as_str().unwrap().parse().unwrap()
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_card_success() {
    let app = TestApp::new().await;
    let mut fields = card_fields(SENDER);
    let recipient: String = Name().fake();
    fields[2].1 = recipient.clone();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/ecards",
            &user_token(SENDER),
            multipart_body(&form(&fields), None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = parse_response_body(response).await;
    assert_eq!(json["recipientName"], recipient.as_str());
    assert_eq!(json["isSent"], false);
    assert_eq!(json["viewCount"], 0);
    assert!(json["scheduledSendDate"].is_string());
    assert!(json["expiryDate"].is_string());

    let id: Uuid = json["id"].as_str().unwrap().parse().unwrap();
    assert!(app.store.find_card(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_card_requires_token() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ecards")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::MULTIPART_BOUNDARY),
        )
        .body(Body::from(multipart_body(&form(&card_fields(SENDER)), None)))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_card_invalid_email() {
    let app = TestApp::new().await;
    let mut fields = card_fields(SENDER);
    fields[3].1 = "not-an-email".to_string();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/ecards",
            &user_token(SENDER),
            multipart_body(&form(&fields), None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = parse_response_body(response).await;
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_create_card_bad_schedule_date() {
    let app = TestApp::new().await;
    let mut fields = card_fields(SENDER);
    fields.push(("scheduledSendDate", "next tuesday".to_string()));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/ecards",
            &user_token(SENDER),
            multipart_body(&form(&fields), None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_card_with_upload_serves_art() {
    let app = TestApp::new().await;
    let png = [0x89, b'P', b'N', b'G', 1, 2, 3, 4];
    let body = multipart_body(
        &form(&card_fields(SENDER)),
        Some(FilePart {
            field: "customArt",
            file_name: "cake.png",
            content_type: "image/png",
            bytes: &png,
        }),
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/ecards", &user_token(SENDER), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = parse_response_body(response).await;
    assert!(json["customArtPath"].is_string());
    assert_eq!(app.artwork.len(), 1);

    let id = json["id"].as_str().unwrap();
    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/art", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, png.to_vec());
}

#[tokio::test]
async fn test_create_card_upload_too_large() {
    let app = TestApp::new().await;
    let big = vec![7u8; 2048];
    let body = multipart_body(
        &form(&card_fields(SENDER)),
        Some(FilePart {
            field: "customArt",
            file_name: "huge.png",
            content_type: "image/png",
            bytes: &big,
        }),
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/ecards", &user_token(SENDER), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.artwork.is_empty());
}

#[tokio::test]
async fn test_create_card_upload_and_premade_rejected() {
    let app = TestApp::new().await;
    let mut fields = card_fields(SENDER);
    fields.push(("premadeArtId", "balloons".to_string()));
    let body = multipart_body(
        &form(&fields),
        Some(FilePart {
            field: "customArt",
            file_name: "cake.png",
            content_type: "image/png",
            bytes: b"png",
        }),
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/ecards", &user_token(SENDER), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_card_art_without_upload_not_found() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[("premadeArtId", "balloons".to_string())]).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/art", id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_get_card_includes_sender() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[]).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/ecards/{}", id),
            &user_token("someone@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_response_body(response).await;
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["sender"]["email"], SENDER);
    assert_eq!(json["sender"]["name"], "Alice");
}

#[tokio::test]
async fn test_get_card_unknown_id() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/ecards/{}", Uuid::new_v4()),
            &user_token(SENDER),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_cards_requires_matching_email() {
    let app = TestApp::new().await;
    create_card(&app, &[]).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/ecards/my-cards?email={}", SENDER),
            &user_token("mallory@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/ecards/my-cards?email={}", SENDER),
            &user_token("Alice@Example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_response_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_cards_unknown_sender_is_empty() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(get_request_with_auth(
            "/api/ecards/my-cards?email=new@example.com",
            &user_token("new@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_client_config_is_public() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/ecards/config"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_response_body(response).await;
    assert_eq!(json["appName"], "eCards");
    assert_eq!(json["maxUploadBytes"], 1024);
}

// ============================================================================
// Viewing
// ============================================================================

#[tokio::test]
async fn test_view_card_renders_and_records() {
    let app = TestApp::new().await;
    let id = create_card(
        &app,
        &[("message", "<b>Cheers</b>".to_string())],
    )
    .await;

    let request = Request::builder()
        .uri(format!("/api/ecards/{}/view", id))
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .header(header::USER_AGENT, "TestBrowser/1.0")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("&lt;b&gt;Cheers&lt;/b&gt;"));
    assert!(html.contains("From: Alice (alice@example.com)"));

    let card = app.store.find_card(id).await.unwrap().unwrap();
    assert_eq!(card.view_count, 1);
    assert!(card.first_viewed_date.is_some());

    let views = app.store.list_recent_views(10).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(views[0].user_agent.as_deref(), Some("TestBrowser/1.0"));
}

#[tokio::test]
async fn test_view_card_keeps_first_view_date() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[]).await;

    app.router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/view", id)))
        .await
        .unwrap();
    let first = app.store.find_card(id).await.unwrap().unwrap().first_viewed_date;

    app.clock.advance(Duration::hours(1));
    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/view", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let card = app.store.find_card(id).await.unwrap().unwrap();
    assert_eq!(card.view_count, 2);
    assert_eq!(card.first_viewed_date, first);
    assert_eq!(app.store.view_count_for(id), 2);
}

#[tokio::test]
async fn test_view_unknown_card() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/view", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swept_card_is_gone() {
    let app = TestApp::new().await;
    let body = multipart_body(
        &form(&card_fields(SENDER)),
        Some(FilePart {
            field: "customArt",
            file_name: "cake.png",
            content_type: "image/png",
            bytes: b"png",
        }),
    );
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/ecards", &user_token(SENDER), body))
        .await
        .unwrap();
    let id = parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.clock.advance(Duration::days(15));
    let report = app
        .collaborators
        .retention_sweeper()
        .run_retention_sweep()
        .await
        .unwrap();
    assert_eq!(report.expired, 1);
    assert!(app.artwork.is_empty());

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/ecards/{}/view", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Resend
// ============================================================================

#[tokio::test]
async fn test_resend_by_owner() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[]).await;

    let response = app
        .router
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/ecards/{}/resend?senderEmail={}", id, SENDER),
            &user_token(SENDER),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_response_body(response).await;
    assert_eq!(json["message"], "Email resent successfully");
    assert!(json["sentDate"].is_string());

    assert_eq!(app.notifier.sent(), vec![id]);
    assert!(app.store.find_card(id).await.unwrap().unwrap().is_sent);
}

#[tokio::test]
async fn test_resend_requires_sender_email() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[]).await;

    let response = app
        .router
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/ecards/{}/resend", id),
            &user_token(SENDER),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resend_by_other_user_forbidden() {
    let app = TestApp::new().await;
    let id = create_card(&app, &[]).await;

    // Token email does not match the claimed sender
    let response = app
        .router
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/ecards/{}/resend?senderEmail={}", id, SENDER),
            &user_token("mallory@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Claimed sender matches the token but not the card
    let response = app
        .router
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/ecards/{}/resend?senderEmail=mallory@example.com", id),
            &user_token("mallory@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_resend_delivery_failure_leaves_card_unsent() {
    let app = TestApp::with_notifier(MockNotificationSender::failing()).await;
    let id = create_card(&app, &[]).await;

    let response = app
        .router
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/ecards/{}/resend?senderEmail={}", id, SENDER),
            &user_token(SENDER),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = parse_response_body(response).await;
    assert_eq!(json["error"], "delivery_failed");
    assert!(!app.store.find_card(id).await.unwrap().unwrap().is_sent);
}
