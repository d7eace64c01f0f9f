use axum::http::HeaderMap;

use crate::utils::error::{AppError, AppResult};

/// Caller id placed on the request by the auth middleware.
pub fn extract_user_id(headers: &HeaderMap) -> AppResult<i64> {
    headers
        .get(crate::middleware::auth::AUTH_USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::Auth("Missing caller identity".to_string()))
}
