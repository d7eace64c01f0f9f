use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub name: String,
    pub last_name: String,
    pub description: String,
    pub photo_file: String,
    pub created_at: DateTime<Utc>,
}

/// Directory search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub login: String,
    pub name: String,
    pub last_name: String,
    pub password_hash: String,
    pub description: String,
}

impl NewUser {
    pub fn new(login: impl Into<String>, name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            name: name.into(),
            last_name: last_name.into(),
            password_hash: String::new(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub login: String,
    pub name: String,
    pub last_name: String,
    pub description: String,
    pub photo_file: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            name: user.name,
            last_name: user.last_name,
            description: user.description,
            photo_file: user.photo_file,
        }
    }
}
