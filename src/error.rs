//! Error taxonomy for the chart loading pipeline.
//!
//! Every failure that can end a load is a [`LoadError`]. Only
//! [`LoadError::StorageQuotaExceeded`] carries a recovery action (the archive
//! store purges itself before returning it); everything else is surfaced
//! unchanged so the caller decides between retry and abort.

use thiserror::Error;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Reasons a chart load can fail.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The archive could not be fetched from its source or read from storage.
    #[error("Failed to fetch archive: {0}")]
    ArchiveFetchFailed(String),

    /// The persistent store rejected a write because its space is exhausted.
    /// The store has already been purged when this is returned.
    #[error("Archive storage quota exceeded, cache purged")]
    StorageQuotaExceeded,

    /// The container index could not be parsed.
    #[error("Corrupt archive: {0}")]
    ArchiveCorrupt(String),

    /// No chart entry matches the requested beatmap id.
    #[error("Chart {0} not found in archive")]
    ChartNotFound(u64),

    /// The difficulty section does not declare a positive integer key count.
    #[error("Invalid key count: {0}")]
    InvalidKeyCount(String),

    /// A chart record is missing fields or has a non-numeric numeric field.
    #[error("Malformed record in [{section}] at line {line}: {reason}")]
    MalformedRecord {
        section: String,
        line: usize,
        reason: String,
    },

    /// Timing data cannot be resolved (inherited point with no base tempo).
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// A generic `[Mania]` skin heading has no `Keys` declaration before the
    /// next heading.
    #[error("Skin section [Mania] at line {line} has no Keys declaration")]
    SkinSectionMissingKeys { line: usize },

    /// The loader configuration file is unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoadError {
    /// True for the one failure the UI presents as "cache purged, please retry".
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, LoadError::StorageQuotaExceeded)
    }

    pub(crate) fn malformed(section: &str, line: usize, reason: impl Into<String>) -> Self {
        LoadError::MalformedRecord {
            section: section.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

/// Misuse of an asset handle. Always a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Asset handle {0} was already released")]
    AlreadyReleased(String),
}
