//! Raw sqlx query helpers for the archive cache.

use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// Deletes every cached archive.
pub async fn clear_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM archive").execute(pool).await?;
    Ok(())
}

/// Inserts or replaces an archive.
///
/// Runs in its own transaction: a write rejected for lack of space leaves the
/// table exactly as it was.
pub async fn insert_archive(pool: &SqlitePool, set_id: &str, data: &[u8]) -> Result<(), sqlx::Error> {
    let stored_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT OR REPLACE INTO archive (set_id, data, size, stored_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(set_id)
    .bind(data)
    .bind(data.len() as i64)
    .bind(stored_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Fetches an archive by set id.
pub async fn get_archive(pool: &SqlitePool, set_id: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
    sqlx::query_scalar::<_, Vec<u8>>("SELECT data FROM archive WHERE set_id = ?1")
        .bind(set_id)
        .fetch_optional(pool)
        .await
}

pub async fn contains(pool: &SqlitePool, set_id: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM archive WHERE set_id = ?1")
        .bind(set_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Set ids currently cached, oldest first.
pub async fn stored_ids(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT set_id FROM archive ORDER BY stored_at, set_id")
        .fetch_all(pool)
        .await
}

pub async fn count_archives(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM archive")
        .fetch_one(pool)
        .await
}

pub async fn stored_bytes(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM archive")
        .fetch_one(pool)
        .await
}
