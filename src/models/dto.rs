//! Request and response bodies of the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::models::{Post, User};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub content: String,
}

/// Public view of a user; the password hash never leaves the service.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub username: String,
}

impl LoginResponse {
    pub fn bearer(access_token: String, username: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            username,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: u64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_username: post.author_username,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
