//! Card endpoints: creation, lookup, public viewing and resend.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::{ArtworkUpload, Card, CardArtwork, CardWithSender, CreateCardRequest};
use shared::validation::emails_match;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientInfo;
use crate::middleware::metrics::{record_card_created, record_card_viewed, record_cards_delivered};
use crate::middleware::AuthUser;
use crate::services::escape_html;

/// Public client configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub app_name: String,
    pub max_upload_bytes: usize,
}

/// GET /api/ecards/config
pub async fn get_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        app_name: state.config.app.name.clone(),
        max_upload_bytes: state.config.storage.max_upload_bytes,
    })
}

/// POST /api/ecards
///
/// Multipart form with the card fields and an optional `customArt` file.
pub async fn create_card(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let (request, upload) = read_create_form(multipart).await?;
    let with_upload = upload.is_some();

    let card = state.cards.create_card(request, upload).await?;
    record_card_created(with_upload);
    tracing::debug!(card_id = %card.id, subject = %user.subject, "Card created by user");

    Ok((StatusCode::CREATED, Json(card)))
}

async fn read_create_form(
    mut multipart: Multipart,
) -> Result<(CreateCardRequest, Option<ArtworkUpload>), ApiError> {
    let mut request = CreateCardRequest {
        sender_name: String::new(),
        sender_email: String::new(),
        recipient_name: String::new(),
        recipient_email: String::new(),
        message: String::new(),
        scheduled_send_date: None,
        premade_art_id: None,
    };
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "customArt" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty unnamed part when no file was picked
            if !(bytes.is_empty() && file_name.is_empty()) {
                upload = Some(ArtworkUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "senderName" => request.sender_name = value,
            "senderEmail" => request.sender_email = value,
            "recipientName" => request.recipient_name = value,
            "recipientEmail" => request.recipient_email = value,
            "message" => request.message = value,
            "scheduledSendDate" => request.scheduled_send_date = parse_optional_date(&value)?,
            "premadeArtId" => {
                let value = value.trim();
                request.premade_art_id = (!value.is_empty()).then(|| value.to_string());
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok((request, upload))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

fn parse_optional_date(value: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|d| Some(d.with_timezone(&Utc)))
        .or_else(|_| {
            // Date-time without offset is taken as UTC
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
                .map(|d| Some(d.and_utc()))
        })
        .map_err(|_| {
            ApiError::Validation("scheduledSendDate must be an ISO 8601 date-time".to_string())
        })
}

#[derive(Debug, Deserialize)]
pub struct MyCardsQuery {
    #[serde(default)]
    pub email: String,
}

/// GET /api/ecards/my-cards?email=
pub async fn my_cards(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MyCardsQuery>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let cards = state
        .cards
        .cards_for_sender(&query.email, user.email.as_deref())
        .await?;
    Ok(Json(cards))
}

/// GET /api/ecards/:id
pub async fn get_card(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CardWithSender>, ApiError> {
    Ok(Json(state.cards.get_card(id).await?))
}

/// GET /api/ecards/premade-art
pub async fn premade_art(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.templates.active_ids().await?))
}

/// GET /api/ecards/:id/view
///
/// Records the view and renders the card as a standalone page.
pub async fn view_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ClientInfo(context): ClientInfo,
) -> Result<Html<String>, ApiError> {
    let card = state.views.record_view(id, context).await?;
    record_card_viewed(card.view_count == 1);

    let CardWithSender { card, sender } = state.cards.get_card(card.id).await?;
    Ok(Html(render_card_page(&card, &sender.name, &sender.email, &state.config.app.name)))
}

fn render_card_page(card: &Card, sender_name: &str, sender_email: &str, app_name: &str) -> String {
    let art = match card.artwork() {
        CardArtwork::Uploaded(_) => format!(
            r#"<img class="art" src="/api/ecards/{}/art" alt="Card artwork">"#,
            card.id
        ),
        CardArtwork::Premade(template_id) => format!(
            r#"<img class="art" src="/api/templates/{}/image" alt="Card artwork">"#,
            escape_html(&template_id)
        ),
        CardArtwork::None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>eCard from {sender_name} - {app_name}</title>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; background: linear-gradient(135deg, #f6a04d 0%, #e2557b 100%); }}
        .card {{ background: white; max-width: 600px; margin: 0 auto; padding: 30px; border-radius: 10px; box-shadow: 0 10px 30px rgba(0,0,0,0.2); }}
        .art {{ max-width: 100%; height: auto; margin: 20px 0; border-radius: 5px; }}
        .message {{ font-size: 18px; margin: 20px 0; white-space: pre-wrap; }}
        .from {{ margin-top: 30px; font-style: italic; color: #666; }}
    </style>
</head>
<body>
    <div class="card">
        <h1>You've received an eCard!</h1>
        {art}
        <div class="message">{message}</div>
        <div class="from">From: {sender_name} ({sender_email})</div>
        <div class="from">To: {recipient_name}</div>
    </div>
</body>
</html>"#,
        sender_name = escape_html(sender_name),
        sender_email = escape_html(sender_email),
        app_name = escape_html(app_name),
        art = art,
        message = escape_html(&card.message),
        recipient_name = escape_html(&card.recipient_name),
    )
}

/// GET /api/ecards/:id/art
pub async fn card_art(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (path, bytes) = state.cards.open_artwork(id).await?;
    Ok(image_response(&path, bytes))
}

/// Bytes with a content type guessed from the file extension.
pub(crate) fn image_response(path: &str, bytes: Vec<u8>) -> Response {
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendQuery {
    #[serde(default)]
    pub sender_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendResponse {
    pub message: String,
    pub sent_date: Option<DateTime<Utc>>,
}

impl From<Card> for ResendResponse {
    fn from(card: Card) -> Self {
        Self {
            message: "Email resent successfully".to_string(),
            sent_date: card.sent_date,
        }
    }
}

/// POST /api/ecards/:id/resend?senderEmail=
///
/// Only the card's sender may resend, identified by the signed-in email.
pub async fn resend_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ResendQuery>,
) -> Result<Json<ResendResponse>, ApiError> {
    if query.sender_email.trim().is_empty() {
        return Err(ApiError::Validation("Sender email is required".to_string()));
    }
    if !user
        .email
        .as_deref()
        .is_some_and(|email| emails_match(email, &query.sender_email))
    {
        return Err(ApiError::Forbidden(
            "Sender email does not match the signed-in user".to_string(),
        ));
    }

    match state.cards.resend_card(id, Some(&query.sender_email)).await {
        Ok(card) => {
            record_cards_delivered(1, 0);
            Ok(Json(card.into()))
        }
        Err(e) => {
            if matches!(e, domain::CardError::Delivery(_)) {
                record_cards_delivered(0, 1);
            }
            Err(e.into())
        }
    }
}
