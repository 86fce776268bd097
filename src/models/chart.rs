//! Parsed chart structures: timing points, hit objects and the chart itself.

use crate::models::metadata::ChartMetadata;
use serde::{Deserialize, Serialize};

/// Playfield width hit object x positions are expressed in.
pub const TRACK_WIDTH: f64 = 512.0;

/// Bit of the hit object type field marking a hold note.
pub const HOLD_TYPE_BIT: u32 = 128;

/// A tempo or scroll-velocity change starting at `time_ms`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    /// Start of the timing region in milliseconds.
    pub time_ms: f64,
    /// Beat length as declared. Negative values are an inherited point's
    /// percentage (`-50` = half the base beat length).
    pub beat_length_ms: f64,
    /// Beats per measure.
    pub meter: u32,
    pub sample_set: u8,
    pub sample_index: u32,
    /// Hit sound volume (0-100).
    pub volume: u32,
    /// Inherited points ride on the tempo of the last non-inherited point.
    pub is_inherited: bool,
    /// Effect flags (kiai etc.), kept for re-serialization.
    pub effects: u32,
    /// Resolved milliseconds per beat for this region.
    pub effective_beat_length_ms: f64,
}

impl TimingPoint {
    /// Creates a non-inherited point with default meter and sound settings.
    pub fn uninherited(time_ms: f64, beat_length_ms: f64) -> Self {
        Self {
            time_ms,
            beat_length_ms,
            meter: 4,
            sample_set: 0,
            sample_index: 0,
            volume: 100,
            is_inherited: false,
            effects: 0,
            effective_beat_length_ms: beat_length_ms,
        }
    }

    /// Percentage of the base beat length an inherited point refers to.
    pub fn percentage(&self) -> Option<f64> {
        self.is_inherited.then(|| -self.beat_length_ms)
    }

    /// Scroll velocity multiplier (1.0 for non-inherited points).
    pub fn scroll_velocity(&self) -> f64 {
        match self.percentage() {
            Some(pct) if pct > 0.0 => 100.0 / pct,
            _ => 1.0,
        }
    }

    /// Tempo of this region in beats per minute.
    pub fn bpm(&self) -> f64 {
        if self.effective_beat_length_ms > 0.0 {
            60_000.0 / self.effective_beat_length_ms
        } else {
            0.0
        }
    }
}

/// Kind of playable note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitObjectKind {
    /// Instantaneous note.
    Tap,
    /// Sustained note, held until `end_time_ms`.
    Hold { end_time_ms: f64 },
}

/// A single playable note event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitObject {
    /// When the note should be hit (in milliseconds).
    pub time_ms: f64,
    /// Which column/lane (0-indexed).
    pub column: usize,
    pub kind: HitObjectKind,
    /// Hit sound flags as declared.
    pub hit_sound: u32,
    /// Custom sample filename, if the note overrides the default hit sound.
    pub sample_ref: Option<String>,
}

impl HitObject {
    /// Creates a tap note.
    pub fn tap(time_ms: f64, column: usize) -> Self {
        Self {
            time_ms,
            column,
            kind: HitObjectKind::Tap,
            hit_sound: 0,
            sample_ref: None,
        }
    }

    /// Creates a hold note.
    pub fn hold(time_ms: f64, column: usize, end_time_ms: f64) -> Self {
        Self {
            time_ms,
            column,
            kind: HitObjectKind::Hold { end_time_ms },
            hit_sound: 0,
            sample_ref: None,
        }
    }

    /// Returns true if this is a hold note.
    pub fn is_hold(&self) -> bool {
        matches!(self.kind, HitObjectKind::Hold { .. })
    }

    /// End of the note (start time for taps).
    pub fn end_time_ms(&self) -> f64 {
        match self.kind {
            HitObjectKind::Hold { end_time_ms } => end_time_ms,
            HitObjectKind::Tap => self.time_ms,
        }
    }

    /// Column for a raw x position: `floor(x * key_count / 512)`, clamped.
    pub fn column_for_x(x: f64, key_count: usize) -> usize {
        let raw = (x * key_count as f64 / TRACK_WIDTH).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(key_count.saturating_sub(1))
        }
    }

    /// Canonical x position that maps back onto `column`.
    pub fn x_for_column(column: usize, key_count: usize) -> u32 {
        ((2 * column + 1) as f64 * (TRACK_WIDTH / 2.0) / key_count as f64).floor() as u32
    }
}

/// Fully parsed and validated chart text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedChart {
    pub key_count: usize,
    /// Sorted ascending by time, inherited points resolved.
    pub timing_points: Vec<TimingPoint>,
    /// Sorted ascending by (time, column).
    pub hit_objects: Vec<HitObject>,
    pub metadata: ChartMetadata,
    /// MD5 of the chart text, used as a stable chart identity.
    pub hash: String,
}

impl ParsedChart {
    /// Number of tap notes.
    pub fn tap_count(&self) -> usize {
        self.hit_objects.iter().filter(|o| !o.is_hold()).count()
    }

    /// Number of hold notes.
    pub fn hold_count(&self) -> usize {
        self.hit_objects.iter().filter(|o| o.is_hold()).count()
    }

    /// Time between the first note and the end of the last one.
    pub fn duration_ms(&self) -> f64 {
        let Some(first) = self.hit_objects.first() else {
            return 0.0;
        };
        let last = self
            .hit_objects
            .iter()
            .map(HitObject::end_time_ms)
            .fold(first.time_ms, f64::max);
        (last - first.time_ms).max(0.0)
    }

    /// Non-inherited point governing the tempo at `time_ms`.
    pub fn tempo_point_at(&self, time_ms: f64) -> Option<&TimingPoint> {
        let mut uninherited = self.timing_points.iter().filter(|tp| !tp.is_inherited);
        let first = uninherited.next()?;
        Some(
            uninherited
                .take_while(|tp| tp.time_ms <= time_ms)
                .last()
                .unwrap_or(first),
        )
    }

    /// Tempo at `time_ms` in beats per minute.
    pub fn bpm_at(&self, time_ms: f64) -> f64 {
        self.tempo_point_at(time_ms).map_or(0.0, TimingPoint::bpm)
    }

    /// Tempo covering the longest stretch of the chart.
    pub fn main_bpm(&self) -> f64 {
        let tempo: Vec<&TimingPoint> = self
            .timing_points
            .iter()
            .filter(|tp| !tp.is_inherited)
            .collect();
        let Some(first) = tempo.first() else {
            return 0.0;
        };
        let chart_end = self
            .hit_objects
            .iter()
            .map(HitObject::end_time_ms)
            .fold(first.time_ms, f64::max);

        let mut best = (f64::MIN, first.bpm());
        for (i, tp) in tempo.iter().enumerate() {
            let end = tempo.get(i + 1).map_or(chart_end, |next| next.time_ms);
            let span = end - tp.time_ms;
            if span > best.0 {
                best = (span, tp.bpm());
            }
        }
        best.1
    }

    /// Serializes to JSON for out-of-process consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
