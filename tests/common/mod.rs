#![allow(dead_code)]

use std::sync::Arc;

use socnet::api::AppState;
use socnet::database::{self, DbPool, ReplicaRouter, Schema};
use socnet::models::user::NewUser;
use socnet::services::user_directory;
use socnet::utils::jwt::JwtService;

pub const TEST_SECRET: &str = "test-secret";

/// Single-connection in-memory store; one connection keeps the database alive
/// for the life of the pool.
pub async fn memory_pool(schema: Schema) -> DbPool {
    database::create_pool("sqlite::memory:", 1, schema)
        .await
        .expect("Failed to create in-memory pool")
}

pub struct Stores {
    pub db: DbPool,
    pub messages_db: DbPool,
}

/// Primary and message shard as two separate databases.
pub async fn stores() -> Stores {
    Stores {
        db: memory_pool(Schema::Main).await,
        messages_db: memory_pool(Schema::Messages).await,
    }
}

/// Creates users `user1..=userN`; with a fresh store their ids are 1..=N.
pub async fn seed_users(db: &DbPool, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 1..=count {
        let user = NewUser::new(format!("user{}", i), format!("Name{}", i), format!("Last{}", i));
        ids.push(user_directory::create(db, &user).await.expect("Failed to create user"));
    }
    ids
}

pub async fn app_state(stores: &Stores) -> Arc<AppState> {
    Arc::new(AppState {
        db: stores.db.clone(),
        messages_db: stores.messages_db.clone(),
        router: Arc::new(ReplicaRouter::primary_only(stores.db.clone())),
        jwt_service: Arc::new(JwtService::new(TEST_SECRET)),
        message_page_size: 100,
        search_page_size: 2,
    })
}

pub fn bearer(user_id: i64) -> String {
    let token = JwtService::new(TEST_SECRET)
        .generate_token(user_id, chrono::Duration::hours(1))
        .expect("Failed to mint token");
    format!("Bearer {}", token)
}
