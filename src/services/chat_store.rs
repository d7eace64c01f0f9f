use chrono::{DateTime, Utc};
use rand::Rng;

use crate::database::DbPool;
use crate::models::chat::Chat;
use crate::services::identity::{canonicalize, ensure_distinct};
use crate::utils::error::{AppError, AppResult};

/// Fresh ids drawn before giving up on a primary-key collision.
const MAX_ID_ATTEMPTS: usize = 3;

/// Random positive 63-bit chat id.
pub fn new_chat_id() -> i64 {
    rand::thread_rng().gen_range(1..=i64::MAX)
}

#[tracing::instrument(skip(pool))]
pub async fn find(pool: &DbPool, user_a: i64, user_b: i64) -> AppResult<Chat> {
    let (low, high) = canonicalize(user_a, user_b);

    sqlx::query_as::<_, Chat>(
        "SELECT id, user1_id, user2_id, updated_at FROM chats WHERE user1_id = ? AND user2_id = ?",
    )
    .bind(low)
    .bind(high)
    .fetch_optional(pool.as_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))
}

/// Creates the chat for a pair of users, or returns the one that already
/// exists for that pair.
#[tracing::instrument(skip(pool))]
pub async fn start(pool: &DbPool, user_a: i64, user_b: i64) -> AppResult<i64> {
    ensure_distinct(user_a, user_b)?;
    let (low, high) = canonicalize(user_a, user_b);
    let now = Utc::now();

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let chat_id = new_chat_id();

        let result = sqlx::query(
            "INSERT INTO chats (id, user1_id, user2_id, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (user1_id, user2_id) DO NOTHING",
        )
        .bind(chat_id)
        .bind(low)
        .bind(high)
        .bind(now)
        .execute(pool.as_ref())
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                tracing::info!(chat_id, user1_id = low, user2_id = high, "Chat started");
                return Ok(chat_id);
            }
            Ok(_) => {
                let existing = find(pool, low, high).await?;
                tracing::debug!(chat_id = existing.id, "Chat already exists for pair");
                return Ok(existing.id);
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::warn!(attempt, "Chat id collision, drawing a new id");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "Could not allocate a chat id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

#[tracing::instrument(skip(pool))]
pub async fn get_by_id(pool: &DbPool, chat_id: i64) -> AppResult<Chat> {
    sqlx::query_as::<_, Chat>("SELECT id, user1_id, user2_id, updated_at FROM chats WHERE id = ?")
        .bind(chat_id)
        .fetch_optional(pool.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))
}

/// Loads a chat and checks that `user_id` takes part in it.
pub async fn get_for_member(pool: &DbPool, chat_id: i64, user_id: i64) -> AppResult<Chat> {
    let chat = get_by_id(pool, chat_id).await?;
    if !chat.has_participant(user_id) {
        return Err(AppError::Forbidden(
            "You are not part of this conversation".to_string(),
        ));
    }
    Ok(chat)
}

pub async fn touch(pool: &DbPool, chat_id: i64) -> AppResult<()> {
    touch_at(pool, chat_id, Utc::now()).await
}

/// Moves `updated_at` forward to `at`. Never moves it backwards, so replaying
/// a touch is harmless.
#[tracing::instrument(skip(pool))]
pub async fn touch_at(pool: &DbPool, chat_id: i64, at: DateTime<Utc>) -> AppResult<()> {
    let result = sqlx::query("UPDATE chats SET updated_at = MAX(updated_at, ?) WHERE id = ?")
        .bind(at)
        .bind(chat_id)
        .execute(pool.as_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chat not found".to_string()));
    }

    Ok(())
}

/// All chats of a user, most recently active first.
#[tracing::instrument(skip(pool))]
pub async fn list_for_user(pool: &DbPool, user_id: i64) -> AppResult<Vec<Chat>> {
    let chats = sqlx::query_as::<_, Chat>(
        "SELECT id, user1_id, user2_id, updated_at FROM chats
         WHERE user1_id = ? OR user2_id = ?
         ORDER BY updated_at DESC, id DESC",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool.as_ref())
    .await?;

    Ok(chats)
}
