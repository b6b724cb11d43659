use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::core::db::{sort_newest_first, Database, Repository, UsernameExists};
use crate::models::models::{NewPost, NewUser, Post, User};

#[derive(Default)]
pub struct Tables {
    users: HashMap<String, User>,
    posts: BTreeMap<u64, Post>,
    next_user_id: u64,
    next_post_id: u64,
}

/// In-process store. A connection holds the table lock until it is
/// dropped, so each request sees and writes a consistent snapshot.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryConn<'a> {
    tables: MutexGuard<'a, Tables>,
}

impl Database for MemoryDatabase {
    type Conn<'a> = MemoryConn<'a>
    where
        Self: 'a;

    fn connect(&self) -> anyhow::Result<MemoryConn<'_>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(MemoryConn { tables })
    }
}

impl Repository for MemoryConn<'_> {
    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.tables.users.get(username).cloned())
    }

    fn save_user(&mut self, user: NewUser) -> anyhow::Result<User> {
        if self.tables.users.contains_key(&user.username) {
            return Err(UsernameExists(user.username).into());
        }
        self.tables.next_user_id += 1;
        let user = user.with_id(self.tables.next_user_id);
        self.tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    fn find_post_by_id(&self, id: u64) -> anyhow::Result<Option<Post>> {
        Ok(self.tables.posts.get(&id).cloned())
    }

    fn insert_post(&mut self, post: NewPost) -> anyhow::Result<Post> {
        self.tables.next_post_id += 1;
        let post = post.with_id(self.tables.next_post_id);
        self.tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    fn save_post(&mut self, post: Post) -> anyhow::Result<Post> {
        match self.tables.posts.get_mut(&post.id) {
            Some(slot) => {
                *slot = post.clone();
                Ok(post)
            }
            None => anyhow::bail!("post {} does not exist", post.id),
        }
    }

    fn delete_post(&mut self, post: &Post) -> anyhow::Result<()> {
        self.tables.posts.remove(&post.id);
        Ok(())
    }

    fn list_posts_newest_first(&self) -> anyhow::Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.tables.posts.values().cloned().collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }
}
