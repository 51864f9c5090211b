//! Admin endpoints: card oversight and template management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::{CardWithSender, PremadeTemplate, TemplateRequest, ViewRecord};

use super::ecards::ResendResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_cards_delivered;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct TakeQuery {
    pub take: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/admin/ecards?take=100
pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<TakeQuery>,
) -> Result<Json<Vec<CardWithSender>>, ApiError> {
    Ok(Json(state.cards.list_recent(query.take).await?))
}

/// GET /api/admin/viewaudits?take=200
pub async fn list_view_audits(
    State(state): State<AppState>,
    Query(query): Query<TakeQuery>,
) -> Result<Json<Vec<ViewRecord>>, ApiError> {
    Ok(Json(state.cards.list_recent_views(query.take).await?))
}

/// DELETE /api/admin/ecards/:id
pub async fn delete_card(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.cards.delete_card(id).await?;
    tracing::info!(card_id = %id, admin = %admin.subject, "Card deleted by admin");
    Ok(Json(MessageResponse {
        message: "eCard deleted successfully".to_string(),
    }))
}

/// POST /api/admin/ecards/:id/resend
pub async fn resend_card(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResendResponse>, ApiError> {
    match state.cards.resend_card(id, None).await {
        Ok(card) => {
            record_cards_delivered(1, 0);
            tracing::info!(card_id = %id, admin = %admin.subject, "Card resent by admin");
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

/// GET /api/admin/templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<PremadeTemplate>>, ApiError> {
    Ok(Json(state.templates.list().await?))
}

/// POST /api/admin/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<PremadeTemplate>), ApiError> {
    let template = state.templates.create(request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /api/admin/templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TemplateRequest>,
) -> Result<StatusCode, ApiError> {
    state.templates.update(&id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.templates.deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
