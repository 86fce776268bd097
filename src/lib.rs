//! Loader for osu!mania beatmap archives.
//!
//! Turns a beatmap set id into a [`ChartRecord`]: parsed timing and notes,
//! revocable handles for the song, background and hit sounds, and the
//! archive's skin with its `[Mania]` sections normalized.

pub mod archive;
pub mod assets;
pub mod config;
pub mod database;
pub mod error;
pub mod logic;
pub mod models;
pub mod parser;
pub mod skin;

pub use assets::{AssetEvent, AssetHandle, AssetKind, AssetManager};
pub use config::LoaderConfig;
pub use database::{ArchiveSource, ArchiveStore, ConfiguredSource};
pub use error::{AssetError, LoadError, Result};
pub use logic::{ChartRecord, Session, load_chart};
pub use models::{BeatmapId, BeatmapSetId, ParsedChart};
