//! Premade template endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

use domain::models::PremadeTemplate;
use domain::services::ArtworkError;

use super::ecards::image_response;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /api/templates
pub async fn list_templates(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<PremadeTemplate>>, ApiError> {
    Ok(Json(state.templates.list().await?))
}

/// GET /api/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PremadeTemplate>, ApiError> {
    Ok(Json(state.templates.get(&id).await?))
}

/// GET /api/templates/:id/image
///
/// `image_path` is resolved inside the premade art directory.
pub async fn template_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let template = state.templates.get(&id).await?;
    let image_path = template
        .image_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::NotFound("Template image not found".to_string()))?;

    match state.premade_art.open_relative(&image_path).await {
        Ok(bytes) => Ok(image_response(&image_path, bytes)),
        Err(ArtworkError::NotFound(_)) => {
            tracing::warn!(template_id = %id, image_path = %image_path, "Template image file not found");
            Err(ApiError::NotFound("Image file not found".to_string()))
        }
        Err(e) => Err(ApiError::Internal(format!("Failed to read template image: {}", e))),
    }
}
