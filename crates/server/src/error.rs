use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use services::services::{
    access::AccessDenied, auth::AuthError, issue::IssueServiceError,
    project::ProjectServiceError, validation::FieldErrors,
};
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        match self {
            ApiError::Validation(errors) => {
                let response = ApiResponse::<(), FieldErrors>::error_with_details(
                    "Invalid request payload",
                    errors,
                );
                (status_code, Json(response)).into_response()
            }
            other => {
                let message = match &other {
                    ApiError::Forbidden(denied) => denied.to_string(),
                    ApiError::Unauthorized => "Unauthorized".to_string(),
                    ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
                    ApiError::Database(DbErr::RecordNotFound(msg)) => msg.clone(),
                    _ => "Internal server error".to_string(),
                };
                let response = ApiResponse::<()>::error(&message);
                (status_code, Json(response)).into_response()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            ApiError::Internal(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(err: ProjectServiceError) -> Self {
        match err {
            ProjectServiceError::Database(db_err) => ApiError::Database(db_err),
            ProjectServiceError::Forbidden(denied) => ApiError::Forbidden(denied),
            ProjectServiceError::Validation(errors) => ApiError::Validation(errors),
            ProjectServiceError::ContributorNotFound => {
                ApiError::NotFound("Contributor not found".to_string())
            }
        }
    }
}

impl From<IssueServiceError> for ApiError {
    fn from(err: IssueServiceError) -> Self {
        match err {
            IssueServiceError::Database(db_err) => ApiError::Database(db_err),
            IssueServiceError::Forbidden(denied) => ApiError::Forbidden(denied),
            IssueServiceError::Validation(errors) => ApiError::Validation(errors),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(db_err) => ApiError::Database(db_err),
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) | AuthError::UnknownUser => {
                ApiError::Unauthorized
            }
            AuthError::Hashing(msg) => ApiError::Internal(msg),
        }
    }
}
