use super::AppState;
use super::responses::{ApiError, ApiSuccess};
use crate::auth::Claims;
use crate::repositories::Catalog;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Json, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity of the caller, taken from a `Bearer` token.
///
/// Handlers that mutate the catalog take this as their first argument, so a
/// request without a valid token is rejected before its path or body is read.
#[derive(Debug)]
pub struct AuthenticatedUser(pub Claims);

impl<C: Catalog> FromRequestParts<AppState<C>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<C>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = state.auth.verify(token.trim()).map_err(|err| {
            tracing::debug!("rejected bearer token: {err}");
            ApiError::from(err)
        })?;

        Ok(Self(claims))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenHttpRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenHttpResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: u64,
}

pub async fn issue_token<C: Catalog>(
    State(state): State<AppState<C>>,
    body: Result<Json<TokenHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<TokenHttpResponse>, ApiError> {
    let Json(body) = body?;
    let auth = Arc::clone(&state.auth);

    let token = tokio::task::spawn_blocking(move || auth.login(&body.username, &body.password))
        .await
        .map_err(|err| {
            tracing::error!("password check panicked: {err}");
            ApiError::InternalServerError("Internal server error".to_string())
        })??;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        TokenHttpResponse {
            access_token: token.access_token().to_string(),
            token_type: "Bearer",
            expires_in: token.expires_in(),
        },
    ))
}
