use super::AppState;
use super::auth::AuthenticatedUser;
use super::authors::AuthorHttpResponse;
use super::book_instances::BookInstanceHttpResponse;
use super::genres::GenreHttpResponse;
use super::languages::LanguageHttpResponse;
use super::responses::{ApiError, ApiSuccess, DeleteHttpResponse};
use crate::models::{Book, BookFields, FieldError};
use crate::repositories::Catalog;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Books are written by id reference and read back hydrated.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookHttpRequest {
    title: String,
    summary: String,
    isbn: String,
    author_id: i64,
    language_id: i64,
    genre_ids: Vec<i64>,
}

impl TryFrom<BookHttpRequest> for BookFields {
    type Error = FieldError;

    fn try_from(value: BookHttpRequest) -> Result<Self, Self::Error> {
        Self::new(
            &value.title,
            &value.summary,
            &value.isbn,
            value.author_id,
            value.language_id,
            &value.genre_ids,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct BookHttpResponse {
    id: i64,
    title: String,
    summary: String,
    isbn: String,
    author: AuthorHttpResponse,
    language: LanguageHttpResponse,
    genres: Vec<GenreHttpResponse>,
}

impl From<&Book> for BookHttpResponse {
    fn from(value: &Book) -> Self {
        Self {
            id: value.id(),
            title: value.title().to_string(),
            summary: value.summary().to_string(),
            isbn: value.isbn().to_string(),
            author: value.author().into(),
            language: value.language().into(),
            genres: value.genres().iter().map(GenreHttpResponse::from).collect(),
        }
    }
}

pub async fn list_books<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    let books = state.catalog.find_all_books().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        books.iter().map(BookHttpResponse::from).collect(),
    ))
}

pub async fn get_book<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let Path(id) = path?;
    let book = state.catalog.find_book(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, (&book).into()))
}

pub async fn list_book_instances_of_book<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<Vec<BookInstanceHttpResponse>>, ApiError> {
    let Path(id) = path?;
    let instances = state.catalog.find_instances_of_book(id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        instances.iter().map(BookInstanceHttpResponse::from).collect(),
    ))
}

pub async fn create_book<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    body: Result<Json<BookHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let Json(body) = body?;
    let fields = BookFields::try_from(body)?;
    let book = state.catalog.create_book(&fields).await?;
    tracing::info!(id = book.id(), user = %claims.sub, "created book");
    Ok(ApiSuccess::new(StatusCode::CREATED, (&book).into()))
}

pub async fn update_book<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<BookHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let fields = BookFields::try_from(body)?;
    let book = state.catalog.update_book(id, &fields).await?;
    tracing::info!(id, user = %claims.sub, "updated book");
    Ok(ApiSuccess::new(StatusCode::OK, (&book).into()))
}

pub async fn delete_book<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<DeleteHttpResponse>, ApiError> {
    let Path(id) = path?;
    state.catalog.delete_book(id).await?;
    tracing::info!(id, user = %claims.sub, "deleted book");
    Ok(ApiSuccess::new(StatusCode::OK, DeleteHttpResponse::succeeded()))
}
