use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::quiz::ValidationError;
use crate::repo::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")] Validation(String),
    #[error("{0}")] NotFound(String),
    /// Store failure; the driver's message is passed through to the client.
    #[error("{0}")] Store(String),
}

impl ApiError {
    pub fn question_not_found() -> Self { ApiError::NotFound("Question not found".into()) }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::question_not_found(),
            RepoError::Internal(msg) => ApiError::Store(msg),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self { ApiError::Validation(e.0) }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(msg) = self {
            tracing::error!(error = %msg, "store error");
        }
        HttpResponse::build(self.status_code()).json(ApiErrorBody { error: self.to_string() })
    }
}
