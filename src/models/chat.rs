use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserProfile;

/// Two-party conversation. Participants are stored in canonical order,
/// `user1_id <= user2_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The other participant, or `None` if `user_id` is not in this chat.
    pub fn counterpart(&self, user_id: i64) -> Option<i64> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }
}

/// Chat list entry enriched with the counterpart's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub user_id: i64,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub last_name: String,
}

/// Conversation page between the caller and another user. `chat_id` is
/// absent until the first message has been sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    pub user: UserProfile,
    pub counterpart: UserProfile,
    pub chat_id: Option<i64>,
}
