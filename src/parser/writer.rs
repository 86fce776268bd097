//! Re-serializes a parsed chart back into chart text.
//!
//! Output uses the parsed (sorted) order, so `parse(write(parse(x)))` yields the
//! same timing points and hit objects as `parse(x)`.

use crate::models::chart::HOLD_TYPE_BIT;
use crate::models::{HitObject, HitObjectKind, ParsedChart, TimingPoint};

const WRITTEN_FORMAT_VERSION: u32 = 14;
const TAP_TYPE: u32 = 1;
const CENTER_Y: u32 = 192;

/// Writes a complete chart file.
pub fn write_chart(chart: &ParsedChart) -> String {
    let meta = &chart.metadata;
    let mut lines: Vec<String> = vec![
        format!(
            "osu file format v{}",
            meta.format_version.unwrap_or(WRITTEN_FORMAT_VERSION)
        ),
        String::new(),
        "[General]".to_string(),
    ];
    if let Some(audio) = &meta.audio_filename {
        lines.push(format!("AudioFilename: {}", audio));
    }
    lines.extend([
        format!("AudioLeadIn: {}", meta.audio_lead_in_ms),
        format!("PreviewTime: {}", meta.preview_time_ms),
        format!("Mode: {}", meta.mode),
        String::new(),
        "[Metadata]".to_string(),
        format!("Title:{}", meta.title),
        format!("Artist:{}", meta.artist),
        format!("Creator:{}", meta.creator),
        format!("Version:{}", meta.version),
    ]);
    if let Some(id) = meta.beatmap_id {
        lines.push(format!("BeatmapID:{}", id));
    }
    if let Some(id) = meta.beatmap_set_id {
        lines.push(format!("BeatmapSetID:{}", id));
    }
    lines.extend([
        String::new(),
        "[Difficulty]".to_string(),
        format!("HPDrainRate:{}", meta.hp_drain_rate),
        format!("CircleSize:{}", chart.key_count),
        format!("OverallDifficulty:{}", meta.overall_difficulty),
        String::new(),
        "[Events]".to_string(),
    ]);
    if let Some(bg) = &meta.background_file {
        lines.push(format!("0,0,\"{}\",0,0", bg));
    }

    lines.push(String::new());
    lines.push("[TimingPoints]".to_string());
    lines.extend(chart.timing_points.iter().map(timing_point_line));

    lines.push(String::new());
    lines.push("[HitObjects]".to_string());
    lines.extend(
        chart
            .hit_objects
            .iter()
            .map(|obj| hit_object_line(obj, chart.key_count)),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One `[TimingPoints]` record.
pub fn timing_point_line(tp: &TimingPoint) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        tp.time_ms,
        tp.beat_length_ms,
        tp.meter,
        tp.sample_set,
        tp.sample_index,
        tp.volume,
        if tp.is_inherited { 0 } else { 1 },
        tp.effects
    )
}

/// One `[HitObjects]` record.
pub fn hit_object_line(obj: &HitObject, key_count: usize) -> String {
    let x = HitObject::x_for_column(obj.column, key_count);
    let sample = format!("0:0:0:0:{}", obj.sample_ref.as_deref().unwrap_or(""));
    match obj.kind {
        HitObjectKind::Tap => format!(
            "{},{},{},{},{},{}",
            x, CENTER_Y, obj.time_ms, TAP_TYPE, obj.hit_sound, sample
        ),
        HitObjectKind::Hold { end_time_ms } => format!(
            "{},{},{},{},{},{}:{}",
            x, CENTER_Y, obj.time_ms, HOLD_TYPE_BIT, obj.hit_sound, end_time_ms, sample
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_chart;
    use crate::parser::tests::SAMPLE_CHART;

    #[test]
    fn test_round_trip_is_structurally_identical() {
        let first = parse_chart(SAMPLE_CHART).unwrap();
        let second = parse_chart(&write_chart(&first)).unwrap();

        assert_eq!(second.key_count, first.key_count);
        assert_eq!(second.timing_points, first.timing_points);
        assert_eq!(second.hit_objects, first.hit_objects);
        assert_eq!(second.metadata, first.metadata);
    }

    #[test]
    fn test_round_trip_many_columns() {
        let mut chart = parse_chart(SAMPLE_CHART).unwrap();
        chart.key_count = 7;
        chart.hit_objects = (0..7)
            .map(|c| HitObject::hold(100.0 * c as f64, c, 100.0 * c as f64 + 50.5))
            .collect();
        let reparsed = parse_chart(&write_chart(&chart)).unwrap();
        assert_eq!(reparsed.hit_objects, chart.hit_objects);
    }

    #[test]
    fn test_section_layout() {
        let text = write_chart(&parse_chart(SAMPLE_CHART).unwrap());
        assert!(text.starts_with("osu file format v14\n\n[General]\nAudioFilename: audio.mp3\n"));
        assert!(text.contains("\nCircleSize:4\n"));
        assert!(text.contains("\n[Events]\n0,0,\"bg.jpg\",0,0\n\n[TimingPoints]\n0,500,"));
        assert!(text.ends_with("448,192,1500,1,0,0:0:0:0:\n"));
    }

    #[test]
    fn test_hold_line_layout() {
        let line = hit_object_line(&HitObject::hold(1000.0, 0, 1500.0), 4);
        assert_eq!(line, "64,192,1000,128,0,1500:0:0:0:0:");
    }
}
