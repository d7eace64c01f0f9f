//! Chat flows exposed to the request layer. Users and chats are read from the
//! primary; messages live on the message shard, which may be a different
//! store.

use std::collections::HashMap;

use crate::database::DbPool;
use crate::models::chat::{Chat, ChatSummary, ThreadView};
use crate::models::message::{Message, MessageView};
use crate::models::user::User;
use crate::services::identity::ensure_distinct;
use crate::services::{chat_store, message_log, user_directory};
use crate::tasks::repair::start_chat_repair_task;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::validate_message_content;

/// Appends to a chat and moves its activity time to the message's timestamp.
///
/// The message and the chat may sit on different stores, so the two writes
/// cannot share a transaction. Once the message is written the append has
/// succeeded: a failed touch is repaired from the newest message in the log,
/// first inline and then by a background task retrying with backoff.
pub async fn append_message(
    db: &DbPool,
    messages_db: &DbPool,
    chat: &Chat,
    sender_id: i64,
    text: &str,
) -> AppResult<Message> {
    validate_message_content(text)?;
    if !chat.has_participant(sender_id) {
        return Err(AppError::Forbidden(
            "You are not part of this conversation".to_string(),
        ));
    }

    let message = message_log::create(messages_db, chat.id, sender_id, text).await?;

    if let Err(e) = chat_store::touch_at(db, chat.id, message.created_at).await {
        tracing::warn!(chat_id = chat.id, "Touch after append failed, repairing: {}", e);
        if let Err(repair) = repair_chat_activity(db, messages_db, chat.id).await {
            tracing::error!(
                chat_id = chat.id,
                message_id = message.id,
                "Chat activity repair failed, retrying in background: {}",
                repair
            );
            start_chat_repair_task(db.clone(), messages_db.clone(), chat.id);
        }
    }

    Ok(message)
}

/// Re-derives a chat's `updated_at` from the newest message in the log.
pub async fn repair_chat_activity(db: &DbPool, messages_db: &DbPool, chat_id: i64) -> AppResult<()> {
    if let Some(latest) = message_log::latest_activity(messages_db, chat_id).await? {
        chat_store::touch_at(db, chat_id, latest).await?;
    }
    Ok(())
}

/// Appends to an existing chat on behalf of one of its participants.
pub async fn send_message(
    db: &DbPool,
    messages_db: &DbPool,
    chat_id: i64,
    sender_id: i64,
    text: &str,
) -> AppResult<Message> {
    let chat = chat_store::get_for_member(db, chat_id, sender_id).await?;
    append_message(db, messages_db, &chat, sender_id, text).await
}

/// Opens (or reuses) the chat with `counterpart_id` and posts the first
/// message. Returns the chat id.
pub async fn start_chat(
    db: &DbPool,
    messages_db: &DbPool,
    sender_id: i64,
    counterpart_id: i64,
    text: &str,
) -> AppResult<i64> {
    ensure_distinct(sender_id, counterpart_id)?;
    validate_message_content(text)?;

    if !user_directory::exists(db, counterpart_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let chat_id = chat_store::start(db, sender_id, counterpart_id).await?;
    let chat = chat_store::get_by_id(db, chat_id).await?;
    append_message(db, messages_db, &chat, sender_id, text).await?;

    Ok(chat_id)
}

fn index_users(users: Vec<User>) -> HashMap<i64, User> {
    users.into_iter().map(|user| (user.id, user)).collect()
}

/// The user's chats, newest activity first, with the counterpart's name.
pub async fn list_chats(db: &DbPool, user_id: i64) -> AppResult<Vec<ChatSummary>> {
    let chats = chat_store::list_for_user(db, user_id).await?;
    if chats.is_empty() {
        return Ok(Vec::new());
    }

    let counterpart_ids: Vec<i64> = chats
        .iter()
        .filter_map(|chat| chat.counterpart(user_id))
        .collect();
    let users = index_users(user_directory::get_by_ids(db, &counterpart_ids).await?);

    let summaries = chats
        .into_iter()
        .filter_map(|chat| {
            let counterpart_id = chat.counterpart(user_id)?;
            let (name, last_name) = match users.get(&counterpart_id) {
                Some(user) => (user.name.clone(), user.last_name.clone()),
                None => {
                    tracing::warn!(chat_id = chat.id, counterpart_id, "Chat counterpart missing");
                    (String::new(), String::new())
                }
            };
            Some(ChatSummary {
                id: chat.id,
                user_id: counterpart_id,
                updated_at: chat.updated_at,
                name,
                last_name,
            })
        })
        .collect();

    Ok(summaries)
}

/// Profile pair and chat id (if any) for the conversation between `user_id`
/// and `counterpart_id`.
pub async fn thread_view(db: &DbPool, user_id: i64, counterpart_id: i64) -> AppResult<ThreadView> {
    ensure_distinct(user_id, counterpart_id)?;

    let user = user_directory::get(db, user_id).await?;
    let counterpart = user_directory::get(db, counterpart_id).await?;

    let chat_id = match chat_store::find(db, user_id, counterpart_id).await {
        Ok(chat) => Some(chat.id),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };

    Ok(ThreadView {
        user: user.into(),
        counterpart: counterpart.into(),
        chat_id,
    })
}

/// Next page of a chat for a participant, enriched with sender names.
pub async fn load_messages(
    db: &DbPool,
    messages_db: &DbPool,
    user_id: i64,
    chat_id: i64,
    min_id: i64,
    limit: i64,
) -> AppResult<Vec<MessageView>> {
    let chat = chat_store::get_for_member(db, chat_id, user_id).await?;
    let users = index_users(user_directory::get_by_ids(db, &[chat.user1_id, chat.user2_id]).await?);

    let messages = message_log::get_by_chat(messages_db, chat.id, min_id, limit).await?;

    let views = messages
        .into_iter()
        .map(|message| {
            let (name, last_name) = users
                .get(&message.user_id)
                .map(|u| (u.name.clone(), u.last_name.clone()))
                .unwrap_or_default();
            MessageView {
                id: message.id,
                name,
                last_name,
                date: message.created_at,
                text: message.text,
            }
        })
        .collect();

    Ok(views)
}
