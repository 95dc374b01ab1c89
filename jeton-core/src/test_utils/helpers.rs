// File: jeton-core/src/test_utils/helpers.rs

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::{Database, Error};

/// Create a connection pool to the test DB named by `TEST_DATABASE_URL`.
pub async fn create_test_db_pool(url: &str) -> Result<Pool<Postgres>, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Wipes out test data so a test run can start fresh. Tests scope their
/// assertions to per-test UUIDs, so this only needs running when a suite
/// wants a truly empty database.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            reward_points,
            point_grants,
            threshold_rates,
            reward_tokens,
            winning_tickets,
            prizes,
            reward_history
        RESTART IDENTITY CASCADE;
    "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns a fully migrated `Database`, or `None` when `TEST_DATABASE_URL`
/// is unset so DB-backed tests can skip instead of failing on machines
/// without a local Postgres.
pub async fn setup_test_database() -> Result<Option<Database>, Error> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        return Ok(None);
    };
    let pool = create_test_db_pool(&url).await?;
    let db = Database::from_pool(pool);
    db.migrate().await?;
    Ok(Some(db))
}
