//! Seeds the blog database with Alice, Bob, and one post without an author.
//!
//! Run with:
//! ```
//! DATABASE_URL=postgres://... cargo run -p blog-seed --bin seed
//! ```
//!
//! Set `SEED_DRY_RUN=1` to seed an in-memory store instead.

use anyhow::Context;
use blog_seed::prelude::*;
use tracing_subscriber::EnvFilter;

async fn seed<S: PersistenceLayer>(store: S) -> anyhow::Result<()> {
    let report = Seeder::new(store).run_and_shutdown().await?;

    // Summary output
    tracing::info!("Seed completed!");
    tracing::info!("  Users: {}", report.user_count());
    tracing::info!("  Posts: {}", report.post_count());

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize seed report")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SeedConfig::from_env()?;

    if config.dry_run {
        tracing::info!("Dry run: seeding an in-memory store");
        return seed(MemoryStore::new()).await;
    }

    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to database")?;

    if config.run_migrations
        && let Err(e) = store.migrate().await
    {
        tracing::error!("Migration failed: {e}");
        store.close().await;
        return Err(e.into());
    }

    seed(store).await
}
