pub mod chats;
pub mod internal;
pub mod search;
pub mod users;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::database::{DbPool, ReplicaRouter};
use crate::utils::jwt::JwtService;

pub struct AppState {
    /// Primary store: users and chats. Writes and membership checks.
    pub db: DbPool,
    /// Message shard. May be the same database as `db`.
    pub messages_db: DbPool,
    pub router: Arc<ReplicaRouter>,
    pub jwt_service: Arc<JwtService>,
    pub message_page_size: i64,
    pub search_page_size: i64,
}

impl AppState {
    pub async fn close(&self) {
        self.router.close().await;
        if !Arc::ptr_eq(&self.db, &self.messages_db) {
            self.messages_db.close().await;
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .nest("/chats", chats::routes(state.clone()))
        .nest("/users", users::routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/search", search::routes(state.clone()))
        .nest("/internal", internal::routes(state.clone()))
        .merge(protected_routes)
}
