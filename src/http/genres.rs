use super::AppState;
use super::auth::AuthenticatedUser;
use super::responses::{ApiError, ApiSuccess, DeleteHttpResponse};
use crate::models::{FieldError, Genre, GenreFields};
use crate::repositories::Catalog;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenreHttpRequest {
    name: String,
}

impl TryFrom<GenreHttpRequest> for GenreFields {
    type Error = FieldError;

    fn try_from(value: GenreHttpRequest) -> Result<Self, Self::Error> {
        Self::new(&value.name)
    }
}

#[derive(Debug, Serialize)]
pub struct GenreHttpResponse {
    id: i64,
    name: String,
}

impl From<&Genre> for GenreHttpResponse {
    fn from(value: &Genre) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
        }
    }
}

pub async fn list_genres<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<Vec<GenreHttpResponse>>, ApiError> {
    let genres = state.catalog.find_all_genres().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        genres.iter().map(GenreHttpResponse::from).collect(),
    ))
}

pub async fn get_genre<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<GenreHttpResponse>, ApiError> {
    let Path(id) = path?;
    let genre = state.catalog.find_genre(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, (&genre).into()))
}

pub async fn create_genre<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    body: Result<Json<GenreHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<GenreHttpResponse>, ApiError> {
    let Json(body) = body?;
    let fields = GenreFields::try_from(body)?;
    let genre = state.catalog.create_genre(&fields).await?;
    tracing::info!(id = genre.id(), user = %claims.sub, "created genre");
    Ok(ApiSuccess::new(StatusCode::CREATED, (&genre).into()))
}

pub async fn update_genre<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<GenreHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<GenreHttpResponse>, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let fields = GenreFields::try_from(body)?;
    let genre = state.catalog.update_genre(id, &fields).await?;
    tracing::info!(id, user = %claims.sub, "updated genre");
    Ok(ApiSuccess::new(StatusCode::OK, (&genre).into()))
}

pub async fn delete_genre<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<DeleteHttpResponse>, ApiError> {
    let Path(id) = path?;
    state.catalog.delete_genre(id).await?;
    tracing::info!(id, user = %claims.sub, "deleted genre");
    Ok(ApiSuccess::new(StatusCode::OK, DeleteHttpResponse::succeeded()))
}
