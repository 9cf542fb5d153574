//! PostgreSQL backend.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{PersistenceLayer, StoreError};
use crate::config::SeedConfig;
use crate::models::{NewPost, NewUser, Post, User, UserWithPosts};

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool using the connection settings from `config`.
    pub async fn connect(config: &SeedConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| match StoreError::from(e) {
                // Any failure before the first query means the store is unreachable.
                StoreError::Query(inner) => StoreError::Connection(inner),
                other => other,
            })?;

        info!("Connected to database");
        Ok(Self { pool })
    }

    /// Applies the bundled schema.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl PersistenceLayer for PgStore {
    async fn insert_user_with_posts(
        &self,
        user: &NewUser,
        posts: &[NewPost],
    ) -> Result<UserWithPosts, StoreError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_posts = Vec::with_capacity(posts.len());
        for post in posts {
            let row: Post = sqlx::query_as(
                r#"
                INSERT INTO posts (title, content, published, author_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title, content, published, author_id, created_at
                "#,
            )
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.published)
            .bind(created.id)
            .fetch_one(&mut *tx)
            .await?;
            created_posts.push(row);
        }

        tx.commit().await?;

        debug!(
            user_id = %created.id,
            posts = created_posts.len(),
            "Inserted user with posts"
        );
        Ok(UserWithPosts {
            user: created,
            posts: created_posts,
        })
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let row: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, content, published, author_id)
            VALUES ($1, $2, $3, NULL)
            RETURNING id, title, content, published, author_id, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .fetch_one(&self.pool)
        .await?;

        debug!(post_id = %row.id, "Inserted post");
        Ok(row)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as(
            r#"
            SELECT id, title, content, published, author_id, created_at
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn orphan_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as(
            r#"
            SELECT id, title, content, published, author_id, created_at
            FROM posts
            WHERE author_id IS NULL
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
