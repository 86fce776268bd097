use crate::database::query;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::{Path, PathBuf};

/// SQLite page size used for the archive cache.
pub const PAGE_SIZE: u64 = 4096;

/// Floor for the page budget so the schema itself always fits.
const MIN_PAGES: u64 = 8;

/// Page budget for a byte quota.
pub fn max_pages(quota_bytes: u64) -> u64 {
    (quota_bytes / PAGE_SIZE).max(MIN_PAGES)
}

/// SQLite database holding cached archives.
///
/// The quota is enforced by SQLite itself through `max_page_count`: a write
/// that would grow the file past it fails with SQLITE_FULL and is rolled back.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens or creates the database.
    pub async fn new(db_path: &Path, quota_bytes: u64) -> Result<Self, sqlx::Error> {
        // Make sure the parent directory exists.
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    sqlx::Error::Io(std::io::Error::new(
                        e.kind(),
                        format!("Unable to create parent directory: {}", e),
                    ))
                })?;
            }
        }

        let absolute_path = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(db_path)
        };

        let options = SqliteConnectOptions::new()
            .filename(&absolute_path)
            .create_if_missing(true)
            // Rollback journal keeps every write inside the page budget of the
            // main file; WAL would defer the overflow to checkpoint time.
            .journal_mode(SqliteJournalMode::Delete)
            .page_size(PAGE_SIZE as u32)
            .pragma("max_page_count", max_pages(quota_bytes).to_string());

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Database { pool };
        db.init_schema().await?;
        log::debug!(
            "Archive cache opened at {} ({} byte quota)",
            absolute_path.display(),
            quota_bytes
        );
        Ok(db)
    }

    /// Creates the table if it does not exist.
    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS archive (
                set_id TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                size INTEGER NOT NULL,
                stored_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_archive(&self, set_id: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
        query::get_archive(&self.pool, set_id).await
    }

    pub async fn insert_archive(&self, set_id: &str, data: &[u8]) -> Result<(), sqlx::Error> {
        query::insert_archive(&self.pool, set_id, data).await
    }

    /// Empties the cache.
    pub async fn clear_all(&self) -> Result<(), sqlx::Error> {
        query::clear_all(&self.pool).await
    }

    pub async fn contains(&self, set_id: &str) -> Result<bool, sqlx::Error> {
        query::contains(&self.pool, set_id).await
    }

    pub async fn stored_ids(&self) -> Result<Vec<String>, sqlx::Error> {
        query::stored_ids(&self.pool).await
    }

    pub async fn count_archives(&self) -> Result<i64, sqlx::Error> {
        query::count_archives(&self.pool).await
    }

    /// Sum of stored archive sizes. Only informational: SQLite page overhead
    /// means this under-reports the space actually used.
    pub async fn stored_bytes(&self) -> Result<i64, sqlx::Error> {
        query::stored_bytes(&self.pool).await
    }
}

/// True when SQLite rejected a write because the page budget (or the disk)
/// is exhausted.
pub fn is_storage_full(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("13") || db.message().contains("database or disk is full")
        }
        sqlx::Error::Io(io) => io.kind() == std::io::ErrorKind::StorageFull,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_pages() {
        assert_eq!(max_pages(1024 * 1024), 256);
        assert_eq!(max_pages(0), MIN_PAGES);
    }

    #[tokio::test]
    async fn test_schema_and_queries() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("nested").join("cache.db"), 1024 * 1024)
            .await
            .unwrap();

        db.insert_archive("42", b"archive bytes").await.unwrap();
        assert_eq!(db.get_archive("42").await.unwrap().as_deref(), Some(&b"archive bytes"[..]));
        assert!(db.contains("42").await.unwrap());
        assert_eq!(db.stored_ids().await.unwrap(), vec!["42".to_string()]);
        assert_eq!(db.stored_bytes().await.unwrap(), 13);

        db.clear_all().await.unwrap();
        assert_eq!(db.count_archives().await.unwrap(), 0);
        assert_eq!(db.get_archive("42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_write_reports_full_and_leaves_no_row() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("cache.db"), 64 * 1024).await.unwrap();

        let err = db.insert_archive("big", &vec![7u8; 512 * 1024]).await.unwrap_err();
        assert!(is_storage_full(&err), "unexpected error: {err}");
        assert!(!db.contains("big").await.unwrap());

        // Small archives still fit afterwards.
        db.insert_archive("small", &[1u8; 1024]).await.unwrap();
        assert!(db.contains("small").await.unwrap());
    }
}
