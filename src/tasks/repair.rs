use std::time::Duration;
use tokio::task::JoinHandle;

use crate::database::DbPool;
use crate::services::messenger::repair_chat_activity;
use crate::utils::error::AppError;

pub const REPAIR_ATTEMPTS: u32 = 6;
/// Wait before the first retry; doubled after every failed attempt.
pub const REPAIR_BASE_DELAY: Duration = Duration::from_millis(50);

/// Retries the activity repair of one chat in the background until it sticks,
/// the attempts run out or a store is shut down. Resolves to whether the
/// repair succeeded.
pub fn start_chat_repair_task(db: DbPool, messages_db: DbPool, chat_id: i64) -> JoinHandle<bool> {
    tokio::spawn(async move {
        let mut delay = REPAIR_BASE_DELAY;

        for attempt in 1..=REPAIR_ATTEMPTS {
            tokio::time::sleep(delay).await;

            match repair_chat_activity(&db, &messages_db, chat_id).await {
                Ok(()) => {
                    tracing::info!(chat_id, attempt, "Chat activity repaired");
                    return true;
                }
                Err(AppError::Database(sqlx::Error::PoolClosed)) => {
                    tracing::warn!(chat_id, "Store closed, abandoning chat activity repair");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(chat_id, attempt, "Chat activity repair failed: {}", e);
                }
            }

            delay *= 2;
        }

        tracing::error!(
            chat_id,
            "Chat activity still stale after {} repair attempts",
            REPAIR_ATTEMPTS
        );
        false
    })
}
