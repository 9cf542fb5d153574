//! Persistence for seeding.
//!
//! The [`Seeder`] writes through any [`PersistenceLayer`]: [`PgStore`] for a
//! real database, or [`MemoryStore`] for dry runs and tests.

mod memory;
mod postgres;
mod seeder;
mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seeder::{SeedError, Seeder};
pub use store::{PersistenceLayer, StoreError};
