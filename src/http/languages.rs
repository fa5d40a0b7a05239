use super::AppState;
use super::auth::AuthenticatedUser;
use super::responses::{ApiError, ApiSuccess, DeleteHttpResponse};
use crate::models::{FieldError, Language, LanguageFields};
use crate::repositories::Catalog;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageHttpRequest {
    name: String,
}

impl TryFrom<LanguageHttpRequest> for LanguageFields {
    type Error = FieldError;

    fn try_from(value: LanguageHttpRequest) -> Result<Self, Self::Error> {
        Self::new(&value.name)
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageHttpResponse {
    id: i64,
    name: String,
}

impl From<&Language> for LanguageHttpResponse {
    fn from(value: &Language) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
        }
    }
}

pub async fn list_languages<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<Vec<LanguageHttpResponse>>, ApiError> {
    let languages = state.catalog.find_all_languages().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        languages.iter().map(LanguageHttpResponse::from).collect(),
    ))
}

pub async fn get_language<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<LanguageHttpResponse>, ApiError> {
    let Path(id) = path?;
    let language = state.catalog.find_language(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, (&language).into()))
}

pub async fn create_language<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    body: Result<Json<LanguageHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<LanguageHttpResponse>, ApiError> {
    let Json(body) = body?;
    let fields = LanguageFields::try_from(body)?;
    let language = state.catalog.create_language(&fields).await?;
    tracing::info!(id = language.id(), user = %claims.sub, "created language");
    Ok(ApiSuccess::new(StatusCode::CREATED, (&language).into()))
}

pub async fn update_language<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<LanguageHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<LanguageHttpResponse>, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let fields = LanguageFields::try_from(body)?;
    let language = state.catalog.update_language(id, &fields).await?;
    tracing::info!(id, user = %claims.sub, "updated language");
    Ok(ApiSuccess::new(StatusCode::OK, (&language).into()))
}

pub async fn delete_language<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<DeleteHttpResponse>, ApiError> {
    let Path(id) = path?;
    state.catalog.delete_language(id).await?;
    tracing::info!(id, user = %claims.sub, "deleted language");
    Ok(ApiSuccess::new(StatusCode::OK, DeleteHttpResponse::succeeded()))
}
