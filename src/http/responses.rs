use crate::auth::AuthError;
use crate::models::{CatalogError, FieldError};
use axum::extract::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> axum::response::Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteHttpResponse {
    success: bool,
}

impl DeleteHttpResponse {
    pub const fn succeeded() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    status_code: u16,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity {
        message: String,
        field: Option<String>,
    },
    InternalServerError(String),
    ServiceUnavailable(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            Self::UnprocessableEntity { message, field } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                field,
            ),
            Self::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_failure", msg, None)
            }
            Self::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg, None)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, message, field) = self.parts();
        let body = ApiErrorBody {
            status_code: status.as_u16(),
            error,
            message,
            field,
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } => Self::NotFound(err.to_string()),
            CatalogError::Validation(field) => field.into(),
            CatalogError::Duplicate { .. } | CatalogError::InUse { .. } => {
                Self::Conflict(err.to_string())
            }
            CatalogError::Other(cause) => {
                tracing::error!("{cause:?}");
                Self::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        Self::UnprocessableEntity {
            message: err.to_string(),
            field: Some(err.field().to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::Other(cause) => {
                tracing::error!("{cause:?}");
                Self::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                Self::UnprocessableEntity {
                    field: rejected_field(&message),
                    message,
                }
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Field named by a JSON data error, either as a missing or unknown field or
/// as the path the deserializer failed at.
fn rejected_field(message: &str) -> Option<String> {
    for marker in ["missing field `", "unknown field `"] {
        if let Some(start) = message.find(marker) {
            let rest = &message[start + marker.len()..];
            return rest.split('`').next().map(str::to_string);
        }
    }

    let detail = message
        .split_once("target type: ")
        .map_or(message, |(_, detail)| detail);
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_field_reads_serde_messages() {
        assert_eq!(
            rejected_field("missing field `last_name` at line 1 column 20").as_deref(),
            Some("last_name")
        );
        assert_eq!(
            rejected_field("unknown field `description`, expected `name` at line 1").as_deref(),
            Some("description")
        );
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: \
                 date_of_birth: input contains invalid characters at line 1 column 30"
            )
            .as_deref(),
            Some("date_of_birth")
        );
        assert_eq!(
            rejected_field("invalid type: string \"x\", expected i64 at line 1"),
            None
        );
    }
}
