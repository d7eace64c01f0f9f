use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::models::chat::{ChatSummary, ThreadView};
use crate::models::message::{MessageCreated, MessageView};
use crate::services::messenger;
use crate::utils::error::{AppResult, NavResult};
use crate::utils::helpers::extract_user_id;

async fn list_chats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> NavResult<Json<Vec<ChatSummary>>> {
    let user_id = extract_user_id(&headers)?;
    let chats = messenger::list_chats(&state.db, user_id).await?;
    Ok(Json(chats))
}

async fn thread_view(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(counterpart_id): Path<i64>,
) -> NavResult<Json<ThreadView>> {
    let user_id = extract_user_id(&headers)?;
    let view = messenger::thread_view(&state.db, user_id, counterpart_id).await?;
    Ok(Json(view))
}

async fn load_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((chat_id, min_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<MessageView>>> {
    let user_id = extract_user_id(&headers)?;
    let messages = messenger::load_messages(
        &state.db,
        &state.messages_db,
        user_id,
        chat_id,
        min_id,
        state.message_page_size,
    )
    .await?;
    Ok(Json(messages))
}

async fn add_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(chat_id): Path<i64>,
    body: String,
) -> AppResult<(StatusCode, Json<MessageCreated>)> {
    let user_id = extract_user_id(&headers)?;
    let message =
        messenger::send_message(&state.db, &state.messages_db, chat_id, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(MessageCreated { id: message.id })))
}

/// Responds with the chat id as a plain-text body.
async fn add_first_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(counterpart_id): Path<i64>,
    body: String,
) -> AppResult<String> {
    let user_id = extract_user_id(&headers)?;
    let chat_id =
        messenger::start_chat(&state.db, &state.messages_db, user_id, counterpart_id, &body)
            .await?;
    Ok(chat_id.to_string())
}

// The leading segment is a user id for the thread view and first message,
// and a chat id for message reads and appends.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_chats))
        .route("/:id", get(thread_view))
        .route("/:id/firstmessage", post(add_first_message))
        .route("/:id/messages", post(add_message))
        .route("/:id/messages/:min_id", get(load_messages))
        .with_state(state)
}
