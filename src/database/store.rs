//! Quota-bounded archive cache.

use crate::archive::RawArchive;
use crate::config::LoaderConfig;
use crate::database::connection::{Database, is_storage_full};
use crate::database::source::ArchiveSource;
use crate::error::{LoadError, Result};
use crate::models::BeatmapSetId;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistent cache of raw archives in front of an [`ArchiveSource`].
///
/// Usage accounting is not trusted: when the database rejects a write for
/// space, the whole cache is emptied rather than evicting a measured amount.
pub struct ArchiveStore<S> {
    db: Database,
    source: S,
    /// `get` holds it shared, `purge_all` exclusive.
    gate: RwLock<()>,
}

impl<S: ArchiveSource> ArchiveStore<S> {
    /// Opens the cache database named by the configuration.
    pub async fn open(config: &LoaderConfig, source: S) -> Result<Self> {
        let db = Database::new(&config.database_path, config.quota_bytes)
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(format!("opening archive cache: {}", e)))?;
        Ok(Self::with_database(db, source))
    }

    pub fn with_database(db: Database, source: S) -> Self {
        Self {
            db,
            source,
            gate: RwLock::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the archive for `set_id`, fetching and persisting it on a miss.
    ///
    /// Fails with [`LoadError::StorageQuotaExceeded`] when the write is
    /// rejected for space; the cache has been purged by then.
    pub async fn get(&self, set_id: &BeatmapSetId) -> Result<RawArchive> {
        let guard = self.gate.read().await;

        match self.db.get_archive(set_id.as_str()).await {
            Ok(Some(bytes)) => {
                log::debug!("Archive cache hit for {}", set_id);
                return Ok(Arc::from(bytes));
            }
            Ok(None) => log::debug!("Archive cache miss for {}", set_id),
            Err(e) => {
                return Err(LoadError::ArchiveFetchFailed(format!(
                    "reading cached archive {}: {}",
                    set_id, e
                )));
            }
        }

        let bytes = self.source.fetch(set_id).await?;

        match self.db.insert_archive(set_id.as_str(), &bytes).await {
            Ok(()) => {
                log::info!("Cached beatmap set {} ({} bytes)", set_id, bytes.len());
                Ok(Arc::from(bytes))
            }
            Err(e) if is_storage_full(&e) => {
                log::warn!("Archive cache full while storing {}: {}", set_id, e);
                drop(guard);
                if let Err(purge_err) = self.purge_all().await {
                    log::error!("Failed to purge archive cache: {}", purge_err);
                }
                Err(LoadError::StorageQuotaExceeded)
            }
            Err(e) => Err(LoadError::ArchiveFetchFailed(format!(
                "storing archive {}: {}",
                set_id, e
            ))),
        }
    }

    /// Removes every cached archive. Waits for in-flight `get` calls.
    pub async fn purge_all(&self) -> Result<()> {
        let _guard = self.gate.write().await;
        self.db
            .clear_all()
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(format!("purging archive cache: {}", e)))?;
        log::info!("Archive cache purged");
        Ok(())
    }

    pub async fn contains(&self, set_id: &BeatmapSetId) -> Result<bool> {
        self.db
            .contains(set_id.as_str())
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(e.to_string()))
    }

    /// Cached set ids, oldest first.
    pub async fn stored_ids(&self) -> Result<Vec<BeatmapSetId>> {
        let ids = self
            .db
            .stored_ids()
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(e.to_string()))?;
        Ok(ids.into_iter().map(BeatmapSetId::new).collect())
    }

    pub async fn len(&self) -> Result<usize> {
        let count = self
            .db
            .count_archives()
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(e.to_string()))?;
        Ok(count.max(0) as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
