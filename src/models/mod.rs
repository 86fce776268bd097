//! Chart data model shared by the parser, the loader and consumers.

pub mod chart;
pub mod ids;
pub mod metadata;

pub use chart::{HitObject, HitObjectKind, ParsedChart, TimingPoint};
pub use ids::{BeatmapId, BeatmapSetId};
pub use metadata::ChartMetadata;
