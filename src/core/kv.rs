use spin_sdk::key_value::Store;

use crate::core::db::{sort_newest_first, Database, Repository, UsernameExists};
use crate::models::models::{NewPost, NewUser, Post, User};

const FEED_KEY: &str = "feed";
const USER_SEQ_KEY: &str = "seq:user";
const POST_SEQ_KEY: &str = "seq:post";

fn user_key(username: &str) -> String {
    format!("user:{}", username)
}

fn post_key(id: u64) -> String {
    format!("post:{}", id)
}

/// The Spin default key-value store. Each component invocation handles a
/// single request, so a connection is simply an opened store.
#[derive(Default)]
pub struct KvDatabase;

pub struct KvRepository {
    store: Store,
}

impl Database for KvDatabase {
    type Conn<'a> = KvRepository
    where
        Self: 'a;

    fn connect(&self) -> anyhow::Result<KvRepository> {
        let store = Store::open_default()
            .map_err(|e| anyhow::anyhow!("failed to open key-value store: {:?}", e))?;
        Ok(KvRepository { store })
    }
}

impl KvRepository {
    fn next_id(&self, seq_key: &str) -> anyhow::Result<u64> {
        let next = self.store.get_json::<u64>(seq_key)?.unwrap_or_default() + 1;
        self.store.set_json(seq_key, &next)?;
        Ok(next)
    }

    fn feed(&self) -> anyhow::Result<Vec<u64>> {
        Ok(self.store.get_json::<Vec<u64>>(FEED_KEY)?.unwrap_or_default())
    }
}

impl Repository for KvRepository {
    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.store.get_json::<User>(&user_key(username))?)
    }

    fn save_user(&mut self, user: NewUser) -> anyhow::Result<User> {
        let key = user_key(&user.username);
        if self.store.get_json::<User>(&key)?.is_some() {
            return Err(UsernameExists(user.username).into());
        }
        let user = user.with_id(self.next_id(USER_SEQ_KEY)?);
        self.store.set_json(&key, &user)?;
        Ok(user)
    }

    fn find_post_by_id(&self, id: u64) -> anyhow::Result<Option<Post>> {
        Ok(self.store.get_json::<Post>(&post_key(id))?)
    }

    fn insert_post(&mut self, post: NewPost) -> anyhow::Result<Post> {
        let post = post.with_id(self.next_id(POST_SEQ_KEY)?);
        self.store.set_json(&post_key(post.id), &post)?;

        let mut feed = self.feed()?;
        feed.insert(0, post.id);
        self.store.set_json(FEED_KEY, &feed)?;
        Ok(post)
    }

    fn save_post(&mut self, post: Post) -> anyhow::Result<Post> {
        let key = post_key(post.id);
        if self.store.get_json::<Post>(&key)?.is_none() {
            anyhow::bail!("post {} does not exist", post.id);
        }
        self.store.set_json(&key, &post)?;
        Ok(post)
    }

    fn delete_post(&mut self, post: &Post) -> anyhow::Result<()> {
        self.store.delete(&post_key(post.id))?;

        let mut feed = self.feed()?;
        feed.retain(|id| *id != post.id);
        self.store.set_json(FEED_KEY, &feed)?;
        Ok(())
    }

    fn list_posts_newest_first(&self) -> anyhow::Result<Vec<Post>> {
        let mut posts = Vec::new();
        for id in self.feed()? {
            if let Some(p) = self.store.get_json::<Post>(&post_key(id))? {
                posts.push(p);
            }
        }
        sort_newest_first(&mut posts);
        Ok(posts)
    }
}
