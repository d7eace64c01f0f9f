use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

use crate::api::AppState;
use crate::database::RouteStats;

async fn routing_stats(State(state): State<Arc<AppState>>) -> Json<RouteStats> {
    Json(state.router.stats())
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routing", get(routing_stats))
        .with_state(state)
}
