//! Beatmap archive (`.osz`) extraction.
//!
//! An archive is a zip holding one or more charts plus the song audio,
//! background images, hit-sound samples and optionally a skin.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod manifest;
pub mod resolve;
pub mod zip;

pub use manifest::ArchiveManifest;
pub use resolve::{
    AssetRole, ChartSource, ResolvedAsset, resolve_asset, resolve_chart, resolve_samples,
    resolve_skin,
};

use std::sync::Arc;

/// Raw archive bytes, shared immutably between the store and a load.
pub type RawArchive = Arc<[u8]>;
