//! Integration tests for seeding PostgreSQL.
//!
//! To run these tests, you need:
//! 1. A PostgreSQL 13+ database (for `gen_random_uuid()`)
//! 2. DATABASE_URL environment variable set
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p blog-seed seed_postgres`
//!
//! Each test works in its own freshly created schema and drops it afterwards,
//! so they can safely run against a development database.

use std::env;

use blog_seed::dataset::{ALICE_EMAIL, BOB_EMAIL};
use blog_seed::prelude::*;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

/// A pool whose connections resolve tables in a private schema.
struct TestSchema {
    admin: PgPool,
    name: String,
    pool: PgPool,
}

/// Get an isolated schema, skipping tests if DATABASE_URL is not set.
async fn get_test_schema() -> Option<TestSchema> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let admin = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };

    let name = format!("seed_test_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA {name}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let search_path = format!("SET search_path TO {name}, public");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                sqlx::query(&search_path).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&database_url)
        .await
        .expect("Failed to connect test pool");

    let store = PgStore::new(pool.clone());
    store.migrate().await.expect("Failed to apply schema");

    Some(TestSchema { admin, name, pool })
}

async fn cleanup(schema: TestSchema) {
    schema.pool.close().await;
    sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema.name))
        .execute(&schema.admin)
        .await
        .expect("Failed to drop test schema");
}

#[tokio::test]
async fn test_seed_empty_database() {
    let Some(schema) = get_test_schema().await else {
        return;
    };
    let store = PgStore::new(schema.pool.clone());

    let report = Seeder::new(store.clone())
        .run()
        .await
        .expect("Seed failed");

    assert_eq!(store.count_users().await.expect("count users"), 2);
    assert_eq!(store.count_posts().await.expect("count posts"), 4);

    let alice_posts = store
        .posts_by_author(report.alice.user.id)
        .await
        .expect("Failed to load Alice's posts");
    assert_eq!(alice_posts.len(), 2);
    assert_eq!(alice_posts.iter().filter(|p| p.published).count(), 1);

    let bob = store
        .find_user_by_email(BOB_EMAIL)
        .await
        .expect("Failed to find Bob")
        .expect("Bob not found");
    assert_eq!(bob, report.bob.user);
    assert_eq!(
        store.posts_by_author(bob.id).await.expect("Bob's posts").len(),
        1
    );

    let orphans = store.orphan_posts().await.expect("Failed to load orphans");
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].title, "Lonely Post");
    assert!(!orphans[0].published);

    let dangling: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM posts p
        WHERE p.author_id IS NOT NULL
          AND NOT EXISTS (SELECT 1 FROM users u WHERE u.id = p.author_id)
        "#,
    )
    .fetch_one(&schema.pool)
    .await
    .expect("Failed to check references");
    assert_eq!(dangling, 0);

    cleanup(schema).await;
}

#[tokio::test]
async fn test_duplicate_email_aborts_run() {
    let Some(schema) = get_test_schema().await else {
        return;
    };
    let store = PgStore::new(schema.pool.clone());

    sqlx::query("INSERT INTO users (name, email) VALUES ('Existing', $1)")
        .bind(ALICE_EMAIL)
        .execute(&schema.pool)
        .await
        .expect("Failed to create existing user");

    let err = Seeder::new(store.clone())
        .run()
        .await
        .expect_err("Seed should collide on Alice's email");

    assert!(err.is_constraint_violation());
    assert_eq!(store.count_users().await.expect("count users"), 1);
    assert_eq!(store.count_posts().await.expect("count posts"), 0);

    cleanup(schema).await;
}

#[tokio::test]
async fn test_failed_post_rolls_back_its_user() {
    let Some(schema) = get_test_schema().await else {
        return;
    };
    let store = PgStore::new(schema.pool.clone());

    sqlx::query(
        "ALTER TABLE posts ADD CONSTRAINT no_second_post CHECK (title <> 'Alice Second Post')",
    )
    .execute(&schema.pool)
    .await
    .expect("Failed to add check constraint");

    let err = Seeder::new(store.clone())
        .run()
        .await
        .expect_err("Alice's second post violates the check");

    assert!(err.is_constraint_violation());
    assert!(err.to_string().contains("no_second_post"), "unexpected error: {err}");
    // Alice and her first post were inserted before the failure and rolled back with it.
    assert_eq!(store.count_users().await.expect("count users"), 0);
    assert_eq!(store.count_posts().await.expect("count posts"), 0);
    assert!(
        store
            .find_user_by_email(ALICE_EMAIL)
            .await
            .expect("Failed to look up Alice")
            .is_none()
    );

    sqlx::query("ALTER TABLE posts DROP CONSTRAINT no_second_post")
        .execute(&schema.pool)
        .await
        .expect("Failed to drop check constraint");

    Seeder::new(store.clone())
        .run()
        .await
        .expect("Seed succeeds once the constraint is gone");

    assert_eq!(store.count_users().await.expect("count users"), 2);
    assert_eq!(store.count_posts().await.expect("count posts"), 4);

    cleanup(schema).await;
}

#[tokio::test]
async fn test_closed_pool_reports_connection_error() {
    let Some(schema) = get_test_schema().await else {
        return;
    };
    let store = PgStore::new(schema.pool.clone());

    Seeder::new(store.clone()).shutdown().await;
    let err = store
        .insert_post(&NewPost::new("After close"))
        .await
        .expect_err("Pool is closed");
    assert!(err.is_connection());

    cleanup(schema).await;
}
