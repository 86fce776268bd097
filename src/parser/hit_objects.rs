//! `[HitObjects]` records.
//!
//! Record layout: `x,y,time,type,hitSound[,extra]`. For hold notes (type bit
//! 128) `extra` is mandatory and reads `endTime:normalSet:additionSet:index:volume:filename`;
//! for taps it is the hit sample alone. Each layout is validated field by field
//! here so downstream code only ever sees typed [`HitObject`]s.

use super::sections::{Section, fields, number, require_fields};
use crate::error::{LoadError, Result};
use crate::models::chart::HOLD_TYPE_BIT;
use crate::models::{HitObject, HitObjectKind};
use ordered_float::OrderedFloat;

const SECTION: Section = Section::HitObjects;

const TAP_FIELDS: usize = 5;
const HOLD_FIELDS: usize = 6;

/// Index of the custom filename inside a hit sample (`set:add:index:volume:file`).
const SAMPLE_FILENAME: usize = 4;

/// Parses one hit object record for a chart with `key_count` columns.
pub fn parse_hit_object(text: &str, line: usize, key_count: usize) -> Result<HitObject> {
    let f = fields(text);
    require_fields(&f, TAP_FIELDS, &SECTION, line)?;

    let x: f64 = number(f[0], "x", &SECTION, line)?;
    let _y: f64 = number(f[1], "y", &SECTION, line)?;
    let time_ms: f64 = number(f[2], "time", &SECTION, line)?;
    let object_type: u32 = number(f[3], "type", &SECTION, line)?;
    let hit_sound: u32 = number(f[4], "hit sound", &SECTION, line)?;

    let column = HitObject::column_for_x(x, key_count);

    let (kind, sample) = if object_type & HOLD_TYPE_BIT != 0 {
        require_fields(&f, HOLD_FIELDS, &SECTION, line)?;
        let (end, sample) = match f[5].split_once(':') {
            Some((end, sample)) => (end, Some(sample)),
            None => (f[5], None),
        };
        let end_time_ms: f64 = number(end, "end time", &SECTION, line)?;
        if end_time_ms < time_ms {
            return Err(LoadError::malformed(
                SECTION.name(),
                line,
                format!("hold ends at {}ms before it starts at {}ms", end_time_ms, time_ms),
            ));
        }
        (HitObjectKind::Hold { end_time_ms }, sample)
    } else {
        (HitObjectKind::Tap, f.get(5).copied())
    };

    Ok(HitObject {
        time_ms,
        column,
        kind,
        hit_sound,
        sample_ref: sample.and_then(sample_filename),
    })
}

/// Custom sample filename of a hit sample field, if any.
fn sample_filename(sample: &str) -> Option<String> {
    sample
        .split(':')
        .nth(SAMPLE_FILENAME)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Stable sort by (time, column).
pub fn sort(objects: &mut [HitObject]) {
    objects.sort_by_key(|o| (OrderedFloat(o.time_ms), o.column));
}
