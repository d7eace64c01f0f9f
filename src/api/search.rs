use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;
use crate::models::user::UserSummary;
use crate::services::user_directory::find_by_name_prefix;
use crate::utils::error::AppResult;
use crate::utils::validation::validate_search_prefix;

#[derive(Deserialize)]
struct SearchQuery {
    prefix: String,
    #[serde(alias = "minId")]
    min_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPage {
    pub users: Vec<UserSummary>,
    pub has_next: bool,
    /// Cursor for the next page; `0` when there is none.
    pub min_id: i64,
}

/// Fetches one row past the page size to learn whether another page exists.
async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchPage>> {
    validate_search_prefix(&query.prefix)?;

    let page_size = state.search_page_size;
    let mut users = find_by_name_prefix(
        &state.router,
        &query.prefix,
        query.min_id.unwrap_or(0),
        page_size + 1,
    )
    .await?;

    let has_next = users.len() as i64 > page_size;
    let mut min_id = 0;
    if has_next {
        users.truncate(page_size as usize);
        min_id = users.last().map(|u| u.id).unwrap_or(0);
    }

    Ok(Json(SearchPage {
        users,
        has_next,
        min_id,
    }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(search_users))
        .with_state(state)
}
