use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
}

/// A user that has not been persisted yet; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: u64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn with_id(self, id: u64) -> Post {
        Post {
            id,
            user_id: self.user_id,
            author_username: self.author_username,
            content: self.content,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

impl NewUser {
    pub fn with_id(self, id: u64) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}
