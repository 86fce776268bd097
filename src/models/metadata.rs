//! Chart metadata read from the key/value sections of a chart file.

use serde::{Deserialize, Serialize};

/// Game mode value for mania charts.
pub const MODE_MANIA: u32 = 3;

/// Descriptive and asset-reference fields of a chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    /// Version from the `osu file format vN` header, if present.
    pub format_version: Option<u32>,

    // [General]
    pub audio_filename: Option<String>,
    pub audio_lead_in_ms: f64,
    /// Song preview start; -1 when the chart does not declare one.
    pub preview_time_ms: f64,
    pub mode: u32,

    // [Metadata]
    pub title: String,
    pub artist: String,
    pub creator: String,
    /// Difficulty name.
    pub version: String,
    pub beatmap_id: Option<u64>,
    pub beatmap_set_id: Option<u64>,

    // [Difficulty]
    pub overall_difficulty: f64,
    pub hp_drain_rate: f64,

    // [Events]
    pub background_file: Option<String>,
}

impl ChartMetadata {
    /// Returns true if the chart is declared as a mania chart.
    pub fn is_mania(&self) -> bool {
        self.mode == MODE_MANIA
    }

    /// "Artist - Title [Version]" display string.
    pub fn display_name(&self) -> String {
        format!("{} - {} [{}]", self.artist, self.title, self.version)
    }
}
