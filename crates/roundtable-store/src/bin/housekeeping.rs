//! Retention sweep entry point.
//!
//! Connects to the configured PostgreSQL store, runs one housekeeping pass
//! (delete rooms marked in an earlier pass, mark rooms idle beyond the
//! retention threshold) and exits. Intended to run from a scheduler.

use std::error::Error;
use std::sync::Arc;

use roundtable_core::clock::SystemClock;
use roundtable_core::store::RoomStore;
use roundtable_store::PgRoomStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL environment variable must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store = PgRoomStore::new(pool, Arc::new(SystemClock));
    let report = store.housekeeping().await?;

    tracing::info!(
        marked = report.marked_for_deletion.len(),
        deleted = report.deleted.len(),
        "housekeeping sweep finished"
    );
    Ok(())
}
