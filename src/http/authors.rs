use super::AppState;
use super::auth::AuthenticatedUser;
use super::books::BookHttpResponse;
use super::responses::{ApiError, ApiSuccess, DeleteHttpResponse};
use crate::models::{Author, AuthorFields, FieldError};
use crate::repositories::Catalog;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of both `POST /authors` and `PUT /authors/{id}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorHttpRequest {
    first_name: String,
    last_name: String,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    date_of_death: Option<NaiveDate>,
}

impl TryFrom<AuthorHttpRequest> for AuthorFields {
    type Error = FieldError;

    fn try_from(value: AuthorHttpRequest) -> Result<Self, Self::Error> {
        Self::new(
            &value.first_name,
            &value.last_name,
            value.date_of_birth,
            value.date_of_death,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorHttpResponse {
    id: i64,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
}

impl From<&Author> for AuthorHttpResponse {
    fn from(value: &Author) -> Self {
        Self {
            id: value.id(),
            first_name: value.first_name().to_string(),
            last_name: value.last_name().to_string(),
            date_of_birth: value.date_of_birth(),
            date_of_death: value.date_of_death(),
        }
    }
}

pub async fn list_authors<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    let authors = state.catalog.find_all_authors().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        authors.iter().map(AuthorHttpResponse::from).collect(),
    ))
}

pub async fn get_author<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Path(id) = path?;
    let author = state.catalog.find_author(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, (&author).into()))
}

pub async fn list_author_books<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    let Path(id) = path?;
    let books = state.catalog.find_books_by_author(id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        books.iter().map(BookHttpResponse::from).collect(),
    ))
}

pub async fn create_author<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    body: Result<Json<AuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Json(body) = body?;
    let fields = AuthorFields::try_from(body)?;
    let author = state.catalog.create_author(&fields).await?;
    tracing::info!(id = author.id(), user = %claims.sub, "created author");
    Ok(ApiSuccess::new(StatusCode::CREATED, (&author).into()))
}

pub async fn update_author<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<AuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let fields = AuthorFields::try_from(body)?;
    let author = state.catalog.update_author(id, &fields).await?;
    tracing::info!(id, user = %claims.sub, "updated author");
    Ok(ApiSuccess::new(StatusCode::OK, (&author).into()))
}

pub async fn delete_author<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<DeleteHttpResponse>, ApiError> {
    let Path(id) = path?;
    state.catalog.delete_author(id).await?;
    tracing::info!(id, user = %claims.sub, "deleted author");
    Ok(ApiSuccess::new(StatusCode::OK, DeleteHttpResponse::succeeded()))
}
