mod common;

use std::time::Duration;

use common::{seed_users, stores};
use socnet::database::DbPool;
use socnet::services::{chat_store, message_log, messenger};
use socnet::tasks::repair::start_chat_repair_task;
use socnet::utils::error::AppError;

/// Makes every update of `chats` fail, as if the chat store rejected writes.
async fn block_chat_updates(db: &DbPool) {
    sqlx::query(
        "CREATE TRIGGER block_chat_updates BEFORE UPDATE ON chats
         BEGIN SELECT RAISE(ABORT, 'chat store unavailable'); END",
    )
    .execute(db.as_ref())
    .await
    .unwrap();
}

async fn unblock_chat_updates(db: &DbPool) {
    sqlx::query("DROP TRIGGER block_chat_updates")
        .execute(db.as_ref())
        .await
        .unwrap();
}

#[tokio::test]
async fn first_message_creates_canonical_chat() {
    let s = stores().await;
    seed_users(&s.db, 5).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 5, 2, "hi")
        .await
        .expect("Failed to start chat");

    let chat = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
    assert_eq!((chat.user1_id, chat.user2_id), (2, 5));

    let messages = message_log::get_by_chat(&s.messages_db, chat_id, 0, 100).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, 1);
    assert_eq!(messages[0].text, "hi");
    assert_eq!(messages[0].user_id, 5);
    assert_eq!(messages[0].chat_id, chat_id);
}

#[tokio::test]
async fn start_chat_with_self_writes_nothing() {
    let s = stores().await;
    seed_users(&s.db, 3).await;

    let err = messenger::start_chat(&s.db, &s.messages_db, 3, 3, "hello me")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let chats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
        .fetch_one(s.db.as_ref())
        .await
        .unwrap();
    let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(s.messages_db.as_ref())
        .await
        .unwrap();
    assert_eq!((chats, messages), (0, 0));
}

#[tokio::test]
async fn start_chat_with_unknown_user_is_not_found() {
    let s = stores().await;
    seed_users(&s.db, 1).await;

    let err = messenger::start_chat(&s.db, &s.messages_db, 1, 404, "anyone?")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn second_first_message_reuses_chat() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let first = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "hi").await.unwrap();
    let second = messenger::start_chat(&s.db, &s.messages_db, 2, 1, "hey").await.unwrap();
    assert_eq!(first, second);

    let messages = message_log::get_by_chat(&s.messages_db, first, 0, 100).await.unwrap();
    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "hey"]);
}

#[tokio::test]
async fn append_moves_chat_to_front_for_both_participants() {
    let s = stores().await;
    seed_users(&s.db, 3).await;

    let with_2 = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "to two").await.unwrap();
    let with_3 = messenger::start_chat(&s.db, &s.messages_db, 1, 3, "to three").await.unwrap();

    let order: Vec<i64> = messenger::list_chats(&s.db, 1)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(order, vec![with_3, with_2]);

    messenger::send_message(&s.db, &s.messages_db, with_2, 2, "back to one")
        .await
        .unwrap();

    let order: Vec<i64> = messenger::list_chats(&s.db, 1)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(order, vec![with_2, with_3]);

    let for_two = messenger::list_chats(&s.db, 2).await.unwrap();
    assert_eq!(for_two[0].id, with_2);
}

#[tokio::test]
async fn touch_follows_message_timestamp() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "one").await.unwrap();
    let message = messenger::send_message(&s.db, &s.messages_db, chat_id, 2, "two")
        .await
        .unwrap();

    let chat = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
    assert_eq!(chat.updated_at, message.created_at);
}

#[tokio::test]
async fn repair_restores_activity_from_log() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let chat_id = chat_store::start(&s.db, 1, 2).await.unwrap();
    // Appended without the touch, as if the chat store had been unreachable.
    let message = message_log::create(&s.messages_db, chat_id, 1, "lost touch").await.unwrap();

    let before = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
    assert!(before.updated_at < message.created_at);

    messenger::repair_chat_activity(&s.db, &s.messages_db, chat_id)
        .await
        .unwrap();

    let after = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
    assert_eq!(after.updated_at, message.created_at);
}

#[tokio::test]
async fn outsiders_cannot_read_or_write() {
    let s = stores().await;
    seed_users(&s.db, 3).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "private").await.unwrap();

    let err = messenger::send_message(&s.db, &s.messages_db, chat_id, 3, "let me in")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = messenger::load_messages(&s.db, &s.messages_db, 3, chat_id, 0, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let s = stores().await;
    seed_users(&s.db, 2).await;
    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "hi").await.unwrap();

    let err = messenger::send_message(&s.db, &s.messages_db, chat_id, 1, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn list_chats_names_the_counterpart() {
    let s = stores().await;
    seed_users(&s.db, 2).await;
    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "hi").await.unwrap();

    let for_one = messenger::list_chats(&s.db, 1).await.unwrap();
    assert_eq!(for_one.len(), 1);
    assert_eq!(for_one[0].id, chat_id);
    assert_eq!(for_one[0].user_id, 2);
    assert_eq!(for_one[0].name, "Name2");
    assert_eq!(for_one[0].last_name, "Last2");

    let for_two = messenger::list_chats(&s.db, 2).await.unwrap();
    assert_eq!(for_two[0].user_id, 1);
    assert_eq!(for_two[0].name, "Name1");

    assert!(messenger::list_chats(&s.db, 99).await.unwrap().is_empty());
}

#[tokio::test]
async fn thread_view_reports_chat_once_started() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let view = messenger::thread_view(&s.db, 1, 2).await.unwrap();
    assert_eq!(view.user.id, 1);
    assert_eq!(view.counterpart.id, 2);
    assert_eq!(view.chat_id, None);

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 2, 1, "hi").await.unwrap();
    let view = messenger::thread_view(&s.db, 1, 2).await.unwrap();
    assert_eq!(view.chat_id, Some(chat_id));

    let err = messenger::thread_view(&s.db, 1, 77).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn load_messages_attributes_senders() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "ping").await.unwrap();
    messenger::send_message(&s.db, &s.messages_db, chat_id, 2, "pong").await.unwrap();

    let views = messenger::load_messages(&s.db, &s.messages_db, 1, chat_id, 0, 100)
        .await
        .unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!((views[0].name.as_str(), views[0].text.as_str()), ("Name1", "ping"));
    assert_eq!((views[1].name.as_str(), views[1].text.as_str()), ("Name2", "pong"));

    let newer = messenger::load_messages(&s.db, &s.messages_db, 2, chat_id, views[0].id, 100)
        .await
        .unwrap();
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0].text, "pong");
}

#[tokio::test]
async fn failed_touch_keeps_the_message_and_repairs_later() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "first").await.unwrap();
    let chat = chat_store::get_by_id(&s.db, chat_id).await.unwrap();

    block_chat_updates(&s.db).await;
    let message = messenger::append_message(&s.db, &s.messages_db, &chat, 2, "while blocked")
        .await
        .expect("a written message is a successful append");

    let stored = message_log::get_by_chat(&s.messages_db, chat_id, 0, 100).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].id, message.id);

    let stale = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
    assert!(stale.updated_at < message.created_at);

    unblock_chat_updates(&s.db).await;

    let mut repaired = None;
    for _ in 0..100 {
        let current = chat_store::get_by_id(&s.db, chat_id).await.unwrap();
        if current.updated_at == message.created_at {
            repaired = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(repaired.is_some(), "background repair never caught up");
}

#[tokio::test]
async fn closed_chat_store_does_not_fail_a_written_message() {
    let s = stores().await;
    seed_users(&s.db, 2).await;

    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "first").await.unwrap();
    let chat = chat_store::get_by_id(&s.db, chat_id).await.unwrap();

    s.db.close().await;

    let result = messenger::append_message(&s.db, &s.messages_db, &chat, 1, "after close").await;
    assert!(result.is_ok());

    let stored = message_log::get_by_chat(&s.messages_db, chat_id, 0, 100).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn repair_task_gives_up_on_a_closed_store() {
    let s = stores().await;
    seed_users(&s.db, 2).await;
    let chat_id = messenger::start_chat(&s.db, &s.messages_db, 1, 2, "first").await.unwrap();

    s.db.close().await;

    let repaired = start_chat_repair_task(s.db.clone(), s.messages_db.clone(), chat_id)
        .await
        .unwrap();
    assert!(!repaired);
}
