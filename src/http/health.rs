use super::AppState;
use super::responses::{ApiError, ApiSuccess};
use crate::repositories::Catalog;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthHttpResponse {
    status: &'static str,
}

pub async fn health_check<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<HealthHttpResponse>, ApiError> {
    state.catalog.ping().await.map_err(|err| {
        tracing::error!("health check failed: {err:?}");
        ApiError::ServiceUnavailable("Database unavailable".to_string())
    })?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        HealthHttpResponse { status: "ok" },
    ))
}
