//! Bearer token authentication middleware.
//!
//! Tokens come from the external identity provider and are only verified
//! here. Verified identities are stored in request extensions as [`AuthUser`].

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use shared::jwt::Claims;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::trace_id::get_request_id;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Subject claim of the token.
    pub subject: String,
    /// Email claim, falling back to `preferred_username`.
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            email: claims.email().map(str::to_string),
            roles: claims.all_roles().map(str::to_string).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Verifies the bearer token in `headers`.
    pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = bearer_token(headers)?;
        let claims = state.verifier.verify(token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Ok(Self::from_claims(&claims))
    }
}

/// Extracts the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// Middleware that requires a valid bearer token.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match AuthUser::authenticate(&state, req.headers()) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Middleware that requires a valid bearer token carrying the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user = match AuthUser::authenticate(&state, req.headers()) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    if !user.has_role(&state.config.auth.admin_role) {
        tracing::warn!(
            subject = %user.subject,
            request_id = %get_request_id(req.extensions()),
            path = %req.uri().path(),
            "Admin route denied"
        );
        return ApiError::Forbidden("Admin role required".to_string()).into_response();
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}
