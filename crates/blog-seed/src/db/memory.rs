//! In-process backend with the same constraints as the database schema.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::store::{PersistenceLayer, StoreError};
use crate::models::{NewPost, NewUser, Post, User, UserWithPosts};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    posts: Vec<Post>,
    unreachable: bool,
}

impl MemoryState {

    fn check_email_free(&self, email: &str) -> Result<(), StoreError> {
        if self.users.iter().any(|u| u.email == email) {
            return Err(StoreError::ConstraintViolation {
                constraint: Some("users_email_key".to_string()),
                message: format!("Key (email)=({email}) already exists."),
            });
        }
        Ok(())
    }

    fn build_post(post: &NewPost, author_id: Option<Uuid>, created_at: OffsetDateTime) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: post.title.clone(),
            content: post.content.clone(),
            published: post.published,
            author_id,
            created_at,
        }
    }
}

/// Open/closed status of one connection to the store.
#[derive(Debug, Default)]
struct ConnectionState {
    closed: AtomicBool,
    close_count: AtomicUsize,
}

/// Cloneable handle to a shared in-memory store.
///
/// Clones share both the rows and the connection, the way clones of a
/// `PgPool` do: closing one closes all of them. [`MemoryStore::connect`]
/// opens a fresh connection to the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    connection: Arc<ConnectionState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection to the same rows.
    pub fn connect(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            connection: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the rows, failing the way a closed or unreachable database does.
    fn checked_state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if self.connection.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(sqlx::Error::PoolClosed));
        }
        let state = self.state();
        if state.unreachable {
            return Err(StoreError::Unreachable);
        }
        Ok(state)
    }

    pub fn is_closed(&self) -> bool {
        self.connection.closed.load(Ordering::SeqCst)
    }

    /// Makes every subsequent operation fail as if the store could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Number of times [`PersistenceLayer::close`] has been called on this connection.
    pub fn close_count(&self) -> usize {
        self.connection.close_count.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state().posts.clone()
    }

    /// Inserts a post referencing `author_id`, enforcing the foreign key.
    #[cfg(test)]
    fn insert_post_for(&self, author_id: Uuid, post: &NewPost) -> Result<Post, StoreError> {
        let mut state = self.checked_state()?;
        if !state.users.iter().any(|u| u.id == author_id) {
            return Err(StoreError::ConstraintViolation {
                constraint: Some("posts_author_id_fkey".to_string()),
                message: format!("Key (author_id)=({author_id}) is not present in table \"users\"."),
            });
        }

        let row = MemoryState::build_post(post, Some(author_id), OffsetDateTime::now_utc());
        state.posts.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl PersistenceLayer for MemoryStore {
    async fn insert_user_with_posts(
        &self,
        user: &NewUser,
        posts: &[NewPost],
    ) -> Result<UserWithPosts, StoreError> {
        // All checks happen before the first mutation.
        let mut state = self.checked_state()?;
        state.check_email_free(&user.email)?;

        let created_at = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at,
        };
        let created_posts: Vec<Post> = posts
            .iter()
            .map(|p| MemoryState::build_post(p, Some(created.id), created_at))
            .collect();

        state.users.push(created.clone());
        state.posts.extend(created_posts.iter().cloned());

        debug!(user_id = %created.id, posts = created_posts.len(), "Inserted user with posts");
        Ok(UserWithPosts {
            user: created,
            posts: created_posts,
        })
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let mut state = self.checked_state()?;

        let row = MemoryState::build_post(post, None, OffsetDateTime::now_utc());
        state.posts.push(row.clone());
        Ok(row)
    }

    async fn close(&self) {
        self.connection.closed.store(true, Ordering::SeqCst);
        self.connection.close_count.fetch_add(1, Ordering::SeqCst);
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let state = self.checked_state()?;
        Ok(state.users.len() as i64)
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        let state = self.checked_state()?;
        Ok(state.posts.len() as i64)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.checked_state()?;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let state = self.checked_state()?;
        Ok(state
            .posts
            .iter()
            .filter(|p| p.author_id == Some(author_id))
            .cloned()
            .collect())
    }

    async fn orphan_posts(&self) -> Result<Vec<Post>, StoreError> {
        let state = self.checked_state()?;
        Ok(state.posts.iter().filter(|p| p.is_orphan()).cloned().collect())
    }
}
