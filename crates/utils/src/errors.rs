use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

/// 应用统一错误类型，业务层/存储层均通过该类型向上传递
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("unexpected error has occurred")]
    InternalServerError,
    #[error("{0}")]
    InternalServerErrorWithContext(String),
    #[error(transparent)]
    ValidationError(#[from] ValidationErrors),
    #[error(transparent)]
    AxumJsonRejection(#[from] JsonRejection),
    #[error(transparent)]
    MongoError(#[from] mongodb::error::Error),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::ValidationError(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string()),
            Self::AxumJsonRejection(rejection) => (StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()),
            Self::InternalServerErrorWithContext(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::MongoError(err) => {
                error!("🔴 database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
            }
            Self::AnyhowError(err) => {
                error!("🔴 internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("unexpected error has occurred"),
            ),
        };

        let body = Json(json!({
            "errors": {
                "message": vec![error_message],
            }
        }));

        (status, body).into_response()
    }
}
