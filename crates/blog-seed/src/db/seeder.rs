//! Database seeding.

use thiserror::Error;
use tracing::{error, info};

use super::store::{PersistenceLayer, StoreError};
use crate::dataset;
use crate::models::{NewPost, NewUser, Post, SeedReport, UserWithPosts};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SeedError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_constraint_violation())
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_connection())
    }
}

/// Inserts the fixed blog dataset through a [`PersistenceLayer`].
///
/// The seeder owns the store handle. [`Seeder::shutdown`] consumes it, so the
/// handle is released at most once; [`Seeder::run_and_shutdown`] releases it
/// exactly once.
pub struct Seeder<S: PersistenceLayer> {
    store: S,
}

impl<S: PersistenceLayer> Seeder<S> {
    /// Creates a new seeder that writes through `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user and its posts in one atomic write.
    pub async fn create_user_with_posts(
        &self,
        name: &str,
        email: &str,
        posts: &[NewPost],
    ) -> Result<UserWithPosts, SeedError> {
        if name.trim().is_empty() {
            return Err(SeedError::InvalidInput("user name must not be empty".to_string()));
        }

        let created = self
            .store
            .insert_user_with_posts(&NewUser::new(name, email), posts)
            .await?;

        info!(
            "Created user {} <{}> with {} posts",
            created.user.name,
            created.user.email,
            created.posts.len()
        );
        Ok(created)
    }

    /// Creates a post with no author.
    pub async fn create_orphan_post(
        &self,
        title: &str,
        content: Option<&str>,
        published: bool,
    ) -> Result<Post, SeedError> {
        let mut post = NewPost::new(title).published(published);
        post.content = content.map(str::to_owned);

        let created = self.store.insert_post(&post).await?;

        info!("Created post \"{}\" without an author", created.title);
        Ok(created)
    }

    /// Seeds Alice, then Bob, then the orphan post.
    ///
    /// Stops at the first failure; nothing after the failing step is written.
    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        info!("Seeding blog data...");

        let alice = self.create_seed(dataset::alice()).await?;
        let bob = self.create_seed(dataset::bob()).await?;

        let lonely = dataset::lonely_post();
        let post_without_author = self
            .create_orphan_post(&lonely.title, lonely.content.as_deref(), lonely.published)
            .await?;

        let report = SeedReport {
            alice,
            bob,
            post_without_author,
        };

        info!(
            "Seeded {} users and {} posts",
            report.user_count(),
            report.post_count()
        );
        Ok(report)
    }

    async fn create_seed(&self, seed: dataset::UserSeed) -> Result<UserWithPosts, SeedError> {
        self.create_user_with_posts(&seed.user.name, &seed.user.email, &seed.posts)
            .await
    }

    /// Releases the store.
    pub async fn shutdown(self) {
        self.store.close().await;
    }

    /// Runs the seed and releases the store on every exit path.
    pub async fn run_and_shutdown(self) -> Result<SeedReport, SeedError> {
        let result = self.run().await;
        if let Err(e) = &result {
            error!("Seeding failed: {e}");
        }

        self.shutdown().await;
        result
    }
}
