use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body returned in place of raw storage failures.
pub const GENERIC_INTERNAL_MESSAGE: &str = "internal error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::Database(sqlx::Error::RowNotFound))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                ("database_error", GENERIC_INTERNAL_MESSAGE.to_string())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", GENERIC_INTERNAL_MESSAGE.to_string())
            }
            AppError::Auth(msg) => {
                tracing::debug!("Auth error: {}", msg);
                ("auth_error", msg)
            }
            AppError::Forbidden(msg) => {
                tracing::debug!("Forbidden: {}", msg);
                ("forbidden", msg)
            }
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                ("not_found", msg)
            }
            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                ("bad_request", msg)
            }
            AppError::Validation(msg) => ("validation_error", msg),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Error for navigation endpoints: the failure is logged and the client is
/// sent back to the root page instead of seeing an error body.
#[derive(Debug)]
pub struct NavRedirect(pub AppError);

pub const NAV_FALLBACK_PATH: &str = "/";

impl From<AppError> for NavRedirect {
    fn from(err: AppError) -> Self {
        NavRedirect(err)
    }
}

impl From<sqlx::Error> for NavRedirect {
    fn from(err: sqlx::Error) -> Self {
        NavRedirect(AppError::Database(err))
    }
}

impl IntoResponse for NavRedirect {
    fn into_response(self) -> Response {
        match &self.0 {
            AppError::Database(e) => tracing::error!("Navigation failed: {}", e),
            AppError::Internal(msg) => tracing::error!("Navigation failed: {}", msg),
            other => tracing::debug!("Navigation redirected: {}", other),
        }

        (StatusCode::FOUND, [(header::LOCATION, NAV_FALLBACK_PATH)]).into_response()
    }
}

pub type NavResult<T> = Result<T, NavRedirect>;
