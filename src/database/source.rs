//! Where archives come from on a cache miss.

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::models::BeatmapSetId;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Extension of archive files in a songs directory.
pub const ARCHIVE_EXTENSION: &str = "osz";

/// Retrieves raw archive bytes for a beatmap set.
pub trait ArchiveSource: Send + Sync {
    fn fetch(&self, set_id: &BeatmapSetId) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads `<root>/<setId>.osz`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, set_id: &BeatmapSetId) -> PathBuf {
        self.root
            .join(format!("{}.{}", set_id.as_str(), ARCHIVE_EXTENSION))
    }
}

impl ArchiveSource for DirectorySource {
    async fn fetch(&self, set_id: &BeatmapSetId) -> Result<Vec<u8>> {
        let path = self.path_for(set_id);
        log::debug!("Reading archive {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| LoadError::ArchiveFetchFailed(format!("{}: {}", path.display(), e)))
    }
}

/// Downloads archives from a mirror URL template containing `{id}`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, set_id: &BeatmapSetId) -> String {
        self.url_template.replace("{id}", set_id.as_str())
    }
}

impl ArchiveSource for HttpSource {
    async fn fetch(&self, set_id: &BeatmapSetId) -> Result<Vec<u8>> {
        let url = self.url_for(set_id);
        log::info!("Downloading beatmap set {} from {}", set_id, url);
        let fetch_failed = |e: reqwest::Error| LoadError::ArchiveFetchFailed(format!("{}: {}", url, e));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_failed)?;
        let bytes = response.bytes().await.map_err(fetch_failed)?;
        Ok(bytes.to_vec())
    }
}

/// Source selected by the configuration: the mirror when one is set, the
/// songs directory otherwise.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Directory(DirectorySource),
    Http(HttpSource),
}

impl ConfiguredSource {
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        match &config.mirror_url {
            Some(template) => Ok(ConfiguredSource::Http(HttpSource::new(
                template.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?)),
            None => Ok(ConfiguredSource::Directory(DirectorySource::new(
                config.songs_path.clone(),
            ))),
        }
    }
}

impl ArchiveSource for ConfiguredSource {
    async fn fetch(&self, set_id: &BeatmapSetId) -> Result<Vec<u8>> {
        match self {
            ConfiguredSource::Directory(source) => source.fetch(set_id).await,
            ConfiguredSource::Http(source) => source.fetch(set_id).await,
        }
    }
}

/// Archives held in memory. Counts fetches, which makes it handy for
/// embedding pre-downloaded sets and for checking cache behaviour.
#[derive(Debug, Default)]
pub struct MemorySource {
    archives: Mutex<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, set_id: impl Into<BeatmapSetId>, bytes: Vec<u8>) -> Self {
        self.insert(set_id, bytes);
        self
    }

    pub fn insert(&self, set_id: impl Into<BeatmapSetId>, bytes: Vec<u8>) {
        if let Ok(mut archives) = self.archives.lock() {
            archives.insert(set_id.into().as_str().to_string(), bytes);
        }
    }

    /// Number of fetches served or attempted so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ArchiveSource for MemorySource {
    async fn fetch(&self, set_id: &BeatmapSetId) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let archives = self
            .archives
            .lock()
            .map_err(|_| LoadError::ArchiveFetchFailed("memory source poisoned".into()))?;
        archives
            .get(set_id.as_str())
            .cloned()
            .ok_or_else(|| LoadError::ArchiveFetchFailed(format!("beatmap set {} not available", set_id)))
    }
}
