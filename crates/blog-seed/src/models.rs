//! Row types for the blog schema and the inputs used to create them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    /// `None` for posts that have no author.
    pub author_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Post {
    pub fn is_orphan(&self) -> bool {
        self.author_id.is_none()
    }
}

/// A user together with the posts created alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
}

/// Fields for a user row; the id and timestamp come from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Fields for a post row. `published` defaults to false.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl NewPost {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

/// Everything created by a single seed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub alice: UserWithPosts,
    pub bob: UserWithPosts,
    pub post_without_author: Post,
}

impl SeedReport {
    pub fn users(&self) -> [&UserWithPosts; 2] {
        [&self.alice, &self.bob]
    }

    pub fn user_count(&self) -> usize {
        self.users().len()
    }

    /// Posts owned by the seeded users plus the one without an author.
    pub fn post_count(&self) -> usize {
        let authored: usize = self.users().iter().map(|u| u.posts.len()).sum();
        authored + 1
    }
}
