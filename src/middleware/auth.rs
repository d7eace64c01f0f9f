use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::AppState;
use crate::services::user_directory;
use crate::utils::error::AppError;

/// Set by [`auth_middleware`] to the resolved caller id. Any client-supplied
/// value is overwritten.
pub const AUTH_USER_ID_HEADER: &str = "x-user-id";

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("Missing or invalid authorization header".to_string()))?;

    let user_id = state.jwt_service.extract_user_id(token)?;

    let user_exists = user_directory::exists(&state.db, user_id)
        .await
        .map_err(|_| AppError::Internal("Database error during auth check".to_string()))?;

    if !user_exists {
        return Err(AppError::Auth("User no longer exists".to_string()));
    }

    request
        .headers_mut()
        .insert(AUTH_USER_ID_HEADER, HeaderValue::from(user_id));

    Ok(next.run(request).await)
}
