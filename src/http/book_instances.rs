use super::AppState;
use super::auth::AuthenticatedUser;
use super::books::BookHttpResponse;
use super::responses::{ApiError, ApiSuccess, DeleteHttpResponse};
use crate::models::{BookInstance, BookInstanceFields, FieldError, LoanStatus};
use crate::repositories::Catalog;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookInstanceHttpRequest {
    book_id: i64,
    imprint: String,
    status: String,
    #[serde(default)]
    due_back: Option<NaiveDate>,
}

impl TryFrom<BookInstanceHttpRequest> for BookInstanceFields {
    type Error = FieldError;

    fn try_from(value: BookInstanceHttpRequest) -> Result<Self, Self::Error> {
        let status: LoanStatus = value.status.parse()?;
        Self::new(value.book_id, &value.imprint, status, value.due_back)
    }
}

#[derive(Debug, Serialize)]
pub struct BookInstanceHttpResponse {
    id: i64,
    book: BookHttpResponse,
    imprint: String,
    status: LoanStatus,
    due_back: Option<NaiveDate>,
}

impl From<&BookInstance> for BookInstanceHttpResponse {
    fn from(value: &BookInstance) -> Self {
        Self {
            id: value.id(),
            book: value.book().into(),
            imprint: value.imprint().to_string(),
            status: value.status(),
            due_back: value.due_back(),
        }
    }
}

pub async fn list_book_instances<C: Catalog>(
    State(state): State<AppState<C>>,
) -> Result<ApiSuccess<Vec<BookInstanceHttpResponse>>, ApiError> {
    let instances = state.catalog.find_all_book_instances().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        instances.iter().map(BookInstanceHttpResponse::from).collect(),
    ))
}

pub async fn get_book_instance<C: Catalog>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<BookInstanceHttpResponse>, ApiError> {
    let Path(id) = path?;
    let instance = state.catalog.find_book_instance(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, (&instance).into()))
}

pub async fn create_book_instance<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    body: Result<Json<BookInstanceHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<BookInstanceHttpResponse>, ApiError> {
    let Json(body) = body?;
    let fields = BookInstanceFields::try_from(body)?;
    let instance = state.catalog.create_book_instance(&fields).await?;
    tracing::info!(id = instance.id(), user = %claims.sub, "created book instance");
    Ok(ApiSuccess::new(StatusCode::CREATED, (&instance).into()))
}

pub async fn update_book_instance<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<BookInstanceHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<BookInstanceHttpResponse>, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let fields = BookInstanceFields::try_from(body)?;
    let instance = state.catalog.update_book_instance(id, &fields).await?;
    tracing::info!(id, user = %claims.sub, "updated book instance");
    Ok(ApiSuccess::new(StatusCode::OK, (&instance).into()))
}

pub async fn delete_book_instance<C: Catalog>(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<DeleteHttpResponse>, ApiError> {
    let Path(id) = path?;
    state.catalog.delete_book_instance(id).await?;
    tracing::info!(id, user = %claims.sub, "deleted book instance");
    Ok(ApiSuccess::new(StatusCode::OK, DeleteHttpResponse::succeeded()))
}
