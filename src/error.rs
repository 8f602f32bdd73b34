use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot delete student with existing issue records.")]
    StudentHasIssues,

    #[error("Cannot delete equipment that is currently issued.")]
    EquipmentOnLoan,

    #[error("{0} is out of stock.")]
    OutOfStock(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StudentHasIssues | AppError::EquipmentOnLoan | AppError::OutOfStock(_) => {
                StatusCode::CONFLICT
            }
        }
    }
}

impl AppError {
    /// Message safe to show to the client. Server-side failures are logged
    /// here and replaced by a generic text.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                "Internal server error".to_string()
            }
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Plain-text body, shown as-is after an HTML form post
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

/// Error returned by the `/api` routes as `{"error", "message"}` JSON
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let error = status
            .canonical_reason()
            .unwrap_or("Error")
            .to_lowercase()
            .replace(' ', "_");

        let body = Json(json!({
            "error": error,
            "message": self.0.public_message(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
pub type ApiResult<T> = std::result::Result<T, ApiError>;
