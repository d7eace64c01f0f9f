use chrono::{DateTime, Utc};

use crate::database::DbPool;
use crate::models::message::Message;
use crate::utils::error::AppResult;

/// Appends a message. Ids come from the shard's autoincrement key, so they
/// grow strictly within a chat. The owning chat is not touched here.
#[tracing::instrument(skip(pool, text), fields(len = text.len()))]
pub async fn create(pool: &DbPool, chat_id: i64, sender_id: i64, text: &str) -> AppResult<Message> {
    let created_at = Utc::now();

    let result = sqlx::query(
        "INSERT INTO messages (chat_id, user_id, text, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(chat_id)
    .bind(sender_id)
    .bind(text)
    .bind(created_at)
    .execute(pool.as_ref())
    .await?;

    Ok(Message {
        id: result.last_insert_rowid(),
        chat_id,
        user_id: sender_id,
        text: text.to_string(),
        created_at,
    })
}

/// Up to `limit` messages with `id > min_id`, oldest first. Callers page
/// forward by passing the last id they saw as the next `min_id`.
#[tracing::instrument(skip(pool))]
pub async fn get_by_chat(
    pool: &DbPool,
    chat_id: i64,
    min_id: i64,
    limit: i64,
) -> AppResult<Vec<Message>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let messages = sqlx::query_as::<_, Message>(
        "SELECT id, chat_id, user_id, text, created_at FROM messages
         WHERE chat_id = ? AND id > ?
         ORDER BY id ASC
         LIMIT ?",
    )
    .bind(chat_id)
    .bind(min_id)
    .bind(limit)
    .fetch_all(pool.as_ref())
    .await?;

    Ok(messages)
}

/// Timestamp of the newest message in a chat.
pub async fn latest_activity(pool: &DbPool, chat_id: i64) -> AppResult<Option<DateTime<Utc>>> {
    let latest = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM messages WHERE chat_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(chat_id)
    .fetch_optional(pool.as_ref())
    .await?;

    Ok(latest)
}
