//! Chart text parser.
//!
//! Turns the text of one `.osu` mania chart into a [`ParsedChart`]. Parsing is
//! all-or-nothing: the first malformed record aborts with the section name and
//! 1-based line number, and no partial chart is ever returned.

pub mod hit_objects;
pub mod sections;
pub mod timing;
pub mod writer;

pub use writer::write_chart;

use crate::error::{LoadError, Result};
use crate::models::{ChartMetadata, ParsedChart};
use md5::Context;
use sections::{FORMAT_HEADER, Line, Section, key_value, meaningful_lines, number};

/// Parses a full chart.
pub fn parse_chart(source: &str) -> Result<ParsedChart> {
    let mut metadata = ChartMetadata {
        preview_time_ms: -1.0,
        ..Default::default()
    };
    let mut key_count: Option<String> = None;
    let mut timing_points = Vec::new();
    // Hit objects need the key count, which may be declared later in the file.
    let mut object_lines: Vec<Line<'_>> = Vec::new();

    let mut section: Option<Section> = None;

    for line in meaningful_lines(source) {
        if let Some(next) = Section::from_heading(line.text) {
            if let Section::Unknown(ref name) = next {
                log::debug!("Skipping unknown section [{}] at line {}", name, line.number);
            }
            section = Some(next);
            continue;
        }

        let Some(current) = section.as_ref() else {
            if let Some(version) = line.text.strip_prefix(FORMAT_HEADER) {
                metadata.format_version = version.trim().parse().ok();
            }
            continue;
        };

        match current {
            Section::General | Section::Metadata | Section::Difficulty => {
                let Some((key, value)) = key_value(line.text) else {
                    continue;
                };
                if current == &Section::Difficulty && key == "CircleSize" {
                    key_count = Some(value.to_string());
                } else {
                    apply_field(&mut metadata, current, key, value, line.number)?;
                }
            }
            Section::Events => {
                if metadata.background_file.is_none() {
                    metadata.background_file = background_event(line.text);
                }
            }
            Section::TimingPoints => {
                timing_points.push(timing::parse_timing_point(line.text, line.number)?);
            }
            Section::HitObjects => object_lines.push(line),
            Section::Editor | Section::Colours | Section::Unknown(_) => {}
        }
    }

    let key_count = parse_key_count(key_count.as_deref())?;

    timing::resolve(&mut timing_points)?;

    let mut hit_objects = object_lines
        .iter()
        .map(|line| hit_objects::parse_hit_object(line.text, line.number, key_count))
        .collect::<Result<Vec<_>>>()?;
    hit_objects::sort(&mut hit_objects);

    Ok(ParsedChart {
        key_count,
        timing_points,
        hit_objects,
        metadata,
        hash: chart_hash(source),
    })
}

/// Reads only the `BeatmapID` of a chart, without validating anything else.
/// Used to pick the requested chart out of an archive.
pub fn peek_beatmap_id(source: &str) -> Option<u64> {
    let mut in_metadata = false;
    for line in meaningful_lines(source) {
        if let Some(section) = Section::from_heading(line.text) {
            if in_metadata {
                return None;
            }
            in_metadata = section == Section::Metadata;
            continue;
        }
        if in_metadata {
            if let Some(("BeatmapID", value)) = key_value(line.text) {
                return value.parse().ok().filter(|id| *id != 0);
            }
        }
    }
    None
}

/// MD5 of the chart text.
pub fn chart_hash(source: &str) -> String {
    let mut context = Context::new();
    context.consume(source.as_bytes());
    format!("{:x}", context.finalize())
}

/// Widest layout the game supports (two 9K stages).
pub const MAX_KEY_COUNT: usize = 18;

fn parse_key_count(value: Option<&str>) -> Result<usize> {
    let Some(value) = value else {
        return Err(LoadError::InvalidKeyCount("CircleSize is missing".to_string()));
    };
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 1.0 && n <= MAX_KEY_COUNT as f64 && n.fract() == 0.0 => {
            Ok(n as usize)
        }
        _ => Err(LoadError::InvalidKeyCount(value.to_string())),
    }
}

fn apply_field(
    metadata: &mut ChartMetadata,
    section: &Section,
    key: &str,
    value: &str,
    line: usize,
) -> Result<()> {
    let optional_text = || (!value.is_empty()).then(|| value.to_string());
    match (section, key) {
        (Section::General, "AudioFilename") => metadata.audio_filename = optional_text(),
        (Section::General, "AudioLeadIn") => {
            metadata.audio_lead_in_ms = number(value, key, section, line)?
        }
        (Section::General, "PreviewTime") => {
            metadata.preview_time_ms = number(value, key, section, line)?
        }
        (Section::General, "Mode") => metadata.mode = number(value, key, section, line)?,
        (Section::Metadata, "Title") => metadata.title = value.to_string(),
        (Section::Metadata, "Artist") => metadata.artist = value.to_string(),
        (Section::Metadata, "Creator") => metadata.creator = value.to_string(),
        (Section::Metadata, "Version") => metadata.version = value.to_string(),
        (Section::Metadata, "BeatmapID") => {
            metadata.beatmap_id = Some(number(value, key, section, line)?)
        }
        (Section::Metadata, "BeatmapSetID") => {
            // Unsubmitted sets carry -1.
            let id: i64 = number(value, key, section, line)?;
            metadata.beatmap_set_id = u64::try_from(id).ok();
        }
        (Section::Difficulty, "OverallDifficulty") => {
            metadata.overall_difficulty = number(value, key, section, line)?
        }
        (Section::Difficulty, "HPDrainRate") => {
            metadata.hp_drain_rate = number(value, key, section, line)?
        }
        _ => {}
    }
    Ok(())
}

/// Filename of a background event (`0,0,"bg.jpg",0,0`).
fn background_event(text: &str) -> Option<String> {
    let mut parts = text.splitn(4, ',').map(str::trim);
    let kind = parts.next()?;
    if kind != "0" && kind != "Background" {
        return None;
    }
    let _start = parts.next()?;
    let file = parts.next()?.trim_matches('"');
    (!file.is_empty()).then(|| file.to_string())
}
