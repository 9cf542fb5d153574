//! Seed data for the blog database.
//!
//! Inserts two users with their posts and one post without an author, then
//! releases the store.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blog_seed::prelude::*;
//!
//! let config = SeedConfig::from_env()?;
//! let store = PgStore::connect(&config).await?;
//! let report = Seeder::new(store).run_and_shutdown().await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod config;
pub mod dataset;
pub mod db;
pub mod models;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{ConfigError, SeedConfig};
    pub use crate::db::{MemoryStore, PersistenceLayer, PgStore, SeedError, Seeder, StoreError};
    pub use crate::models::{NewPost, NewUser, Post, SeedReport, User, UserWithPosts};
}
