use crate::models::models::{NewPost, NewUser, Post, User};

/// Storage operations the auth and post services rely on.
///
/// Implementations are used through a connection obtained from a
/// [`Database`]; everything done on one connection is treated as one unit
/// of work.
pub trait Repository {
    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    /// Persists a new user and assigns its id. Fails with [`UsernameExists`]
    /// if the username is already stored.
    fn save_user(&mut self, user: NewUser) -> anyhow::Result<User>;

    fn find_post_by_id(&self, id: u64) -> anyhow::Result<Option<Post>>;

    /// Persists a new post and assigns the next id.
    fn insert_post(&mut self, post: NewPost) -> anyhow::Result<Post>;

    /// Overwrites an existing post.
    fn save_post(&mut self, post: Post) -> anyhow::Result<Post>;

    fn delete_post(&mut self, post: &Post) -> anyhow::Result<()>;

    /// All posts, newest `created_at` first; ties broken by descending id.
    fn list_posts_newest_first(&self) -> anyhow::Result<Vec<Post>>;
}

#[derive(Debug, thiserror::Error)]
#[error("user {0} already stored")]
pub struct UsernameExists(pub String);

pub trait Database: Send + Sync {
    type Conn<'a>: Repository
    where
        Self: 'a;

    fn connect(&self) -> anyhow::Result<Self::Conn<'_>>;
}

pub(crate) fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
