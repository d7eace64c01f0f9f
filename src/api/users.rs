use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::models::user::{UserProfile, UserSummary};
use crate::services::user_directory;
use crate::utils::error::{AppError, NavResult};
use crate::utils::helpers::extract_user_id;

#[derive(Deserialize)]
struct DirectoryQuery {
    #[serde(alias = "minId")]
    min_id: Option<i64>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DirectoryQuery>,
) -> NavResult<Json<Vec<UserSummary>>> {
    let users = user_directory::list(
        &state.db,
        query.min_id.unwrap_or(0),
        state.search_page_size,
    )
    .await?;
    Ok(Json(users))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> NavResult<Json<UserProfile>> {
    let user_id = extract_user_id(&headers)?;
    let user = user_directory::get(&state.db, user_id).await?;
    Ok(Json(user.into()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> NavResult<Json<UserProfile>> {
    let user_id: i64 = raw_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid user id: {}", raw_id)))?;
    let user = user_directory::get(&state.db, user_id).await?;
    Ok(Json(user.into()))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me))
        .route("/:id", get(get_user))
        .with_state(state)
}
