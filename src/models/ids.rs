//! Identifiers supplied by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a beatmap set; the archive cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeatmapSetId(String);

impl BeatmapSetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for BeatmapSetId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for BeatmapSetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for BeatmapSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one chart inside a set.
pub type BeatmapId = u64;
