mod common;

use common::memory_pool;
use socnet::database::{DbPool, Schema};
use socnet::services::message_log;

async fn fill_chat(pool: &DbPool, chat_id: i64, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let sender = if i % 2 == 0 { 2 } else { 5 };
        let message = message_log::create(pool, chat_id, sender, &format!("message {}", i))
            .await
            .expect("Failed to append message");
        ids.push(message.id);
    }
    ids
}

/// Walks a chat the way a polling client does, feeding back the last id.
async fn drain(pool: &DbPool, chat_id: i64, limit: i64) -> (Vec<i64>, usize) {
    let mut seen = Vec::new();
    let mut min_id = 0;
    let mut requests = 0;

    loop {
        let page = message_log::get_by_chat(pool, chat_id, min_id, limit).await.unwrap();
        requests += 1;
        seen.extend(page.iter().map(|m| m.id));
        if let Some(last) = page.last() {
            min_id = last.id;
        }
        if (page.len() as i64) < limit {
            break;
        }
    }

    (seen, requests)
}

#[tokio::test]
async fn ids_increase_strictly() {
    let pool = memory_pool(Schema::Messages).await;
    let ids = fill_chat(&pool, 1, 10).await;

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids.first(), Some(&1));
}

#[tokio::test]
async fn pagination_enumerates_every_message_once() {
    let pool = memory_pool(Schema::Messages).await;
    let ids = fill_chat(&pool, 7, 250).await;

    let (seen, requests) = drain(&pool, 7, 100).await;
    assert_eq!(seen, ids);
    assert_eq!(requests, 3);
}

#[tokio::test]
async fn pagination_on_exact_multiple_ends_with_empty_page() {
    let pool = memory_pool(Schema::Messages).await;
    let ids = fill_chat(&pool, 3, 21).await;

    let (seen, requests) = drain(&pool, 3, 7).await;
    assert_eq!(seen, ids);
    assert_eq!(requests, 4);
}

#[tokio::test]
async fn pages_are_scoped_to_their_chat() {
    let pool = memory_pool(Schema::Messages).await;

    // Interleave two chats so ids are not contiguous per chat.
    let mut chat_a = Vec::new();
    let mut chat_b = Vec::new();
    for i in 0..6 {
        chat_a.push(message_log::create(&pool, 100, 1, &format!("a{}", i)).await.unwrap().id);
        chat_b.push(message_log::create(&pool, 200, 2, &format!("b{}", i)).await.unwrap().id);
    }

    let (seen_a, _) = drain(&pool, 100, 4).await;
    let (seen_b, _) = drain(&pool, 200, 4).await;
    assert_eq!(seen_a, chat_a);
    assert_eq!(seen_b, chat_b);
}

#[tokio::test]
async fn cursor_past_the_end_returns_nothing() {
    let pool = memory_pool(Schema::Messages).await;
    let ids = fill_chat(&pool, 1, 3).await;

    let page = message_log::get_by_chat(&pool, 1, *ids.last().unwrap(), 100).await.unwrap();
    assert!(page.is_empty());

    let page = message_log::get_by_chat(&pool, 1, 0, 0).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn latest_activity_tracks_newest_message() {
    let pool = memory_pool(Schema::Messages).await;
    assert_eq!(message_log::latest_activity(&pool, 1).await.unwrap(), None);

    message_log::create(&pool, 1, 2, "first").await.unwrap();
    let last = message_log::create(&pool, 1, 5, "second").await.unwrap();

    assert_eq!(
        message_log::latest_activity(&pool, 1).await.unwrap(),
        Some(last.created_at)
    );
}
