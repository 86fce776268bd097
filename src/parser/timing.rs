//! `[TimingPoints]` records and tempo resolution.

use super::sections::{Section, fields, number, require_fields};
use crate::error::{LoadError, Result};
use crate::models::TimingPoint;
use ordered_float::OrderedFloat;

const SECTION: Section = Section::TimingPoints;

/// `time,beatLength` are mandatory; the rest default.
const REQUIRED_FIELDS: usize = 2;

/// Parses one timing point record. The effective beat length is left equal to
/// the declared one until [`resolve`] runs.
pub fn parse_timing_point(text: &str, line: usize) -> Result<TimingPoint> {
    let f = fields(text);
    require_fields(&f, REQUIRED_FIELDS, &SECTION, line)?;

    let time_ms: f64 = number(f[0], "time", &SECTION, line)?;
    let beat_length_ms: f64 = number(f[1], "beat length", &SECTION, line)?;

    let optional = |idx: usize, what: &str, default: u32| -> Result<u32> {
        match f.get(idx) {
            Some(value) if !value.is_empty() => number(value, what, &SECTION, line),
            _ => Ok(default),
        }
    };

    let meter = optional(2, "meter", 4)?;
    let sample_set = optional(3, "sample set", 0)?;
    let sample_index = optional(4, "sample index", 0)?;
    let volume = optional(5, "volume", 100)?;
    // Field 6 (uninherited) is validated but the sign of the beat length is
    // what marks an inherited point.
    optional(6, "uninherited", 1)?;
    let effects = optional(7, "effects", 0)?;

    Ok(TimingPoint {
        time_ms,
        beat_length_ms,
        meter,
        sample_set: sample_set.min(u8::MAX as u32) as u8,
        sample_index,
        volume,
        is_inherited: beat_length_ms < 0.0,
        effects,
        effective_beat_length_ms: beat_length_ms,
    })
}

/// Sorts points by time and resolves every inherited point against the nearest
/// preceding non-inherited one.
///
/// The sort is stable; at equal times non-inherited points go first so that a
/// scroll change declared on the same millisecond as a tempo change applies to
/// the new tempo.
pub fn resolve(points: &mut [TimingPoint]) -> Result<()> {
    points.sort_by_key(|tp| (OrderedFloat(tp.time_ms), tp.is_inherited));

    let mut base: Option<f64> = None;
    for tp in points.iter_mut() {
        if tp.is_inherited {
            let Some(base_length) = base else {
                return Err(LoadError::InvalidTiming(format!(
                    "inherited timing point at {}ms has no preceding tempo point",
                    tp.time_ms
                )));
            };
            let percentage = -tp.beat_length_ms;
            tp.effective_beat_length_ms = percentage / 100.0 * base_length;
        } else {
            tp.effective_beat_length_ms = tp.beat_length_ms;
            base = Some(tp.beat_length_ms);
        }
    }
    Ok(())
}
