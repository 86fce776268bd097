//! Line and section handling shared by the chart record parsers.

use crate::error::{LoadError, Result};
use std::str::FromStr;

/// Prefix of the first line of a chart file.
pub const FORMAT_HEADER: &str = "osu file format v";

/// Sections of a chart file the parser understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    General,
    Editor,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    Colours,
    HitObjects,
    /// Any other heading. Its lines are skipped.
    Unknown(String),
}

impl Section {
    /// Maps a heading line (`[Name]`) to its section, or `None` if the line is
    /// not a heading.
    pub fn from_heading(line: &str) -> Option<Self> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
        Some(match name {
            "General" => Section::General,
            "Editor" => Section::Editor,
            "Metadata" => Section::Metadata,
            "Difficulty" => Section::Difficulty,
            "Events" => Section::Events,
            "TimingPoints" => Section::TimingPoints,
            "Colours" => Section::Colours,
            "HitObjects" => Section::HitObjects,
            other => Section::Unknown(other.to_string()),
        })
    }

    /// Section name as written in the heading.
    pub fn name(&self) -> &str {
        match self {
            Section::General => "General",
            Section::Editor => "Editor",
            Section::Metadata => "Metadata",
            Section::Difficulty => "Difficulty",
            Section::Events => "Events",
            Section::TimingPoints => "TimingPoints",
            Section::Colours => "Colours",
            Section::HitObjects => "HitObjects",
            Section::Unknown(name) => name,
        }
    }
}

/// One meaningful line of chart text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number in the source text.
    pub number: usize,
    /// Trimmed content.
    pub text: &'a str,
}

/// Iterates trimmed lines, skipping blanks and `//` comments.
pub fn meaningful_lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| Line {
            number: i + 1,
            // A UTF-8 byte order mark sometimes precedes the header.
            text: raw.trim_start_matches('\u{feff}').trim(),
        })
        .filter(|line| !line.text.is_empty() && !line.text.starts_with("//"))
}

/// Splits a `Key: Value` line at the first colon.
pub fn key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Splits a comma-delimited record into trimmed fields.
pub fn fields(text: &str) -> Vec<&str> {
    text.split(',').map(str::trim).collect()
}

/// Fails with `MalformedRecord` if `fields` has fewer than `required` entries.
pub fn require_fields(fields: &[&str], required: usize, section: &Section, line: usize) -> Result<()> {
    if fields.len() < required {
        return Err(LoadError::malformed(
            section.name(),
            line,
            format!("expected at least {} fields, found {}", required, fields.len()),
        ));
    }
    Ok(())
}

/// Parses a numeric field, rejecting non-finite floats.
pub fn number<T>(value: &str, what: &str, section: &Section, line: usize) -> Result<T>
where
    T: FromStr + Finite,
{
    match value.trim().parse::<T>() {
        Ok(n) if n.is_finite_value() => Ok(n),
        _ => Err(LoadError::malformed(
            section.name(),
            line,
            format!("{} is not a number: {:?}", what, value),
        )),
    }
}

/// Numeric types accepted by [`number`].
pub trait Finite {
    fn is_finite_value(&self) -> bool;
}

impl Finite for f64 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

macro_rules! finite_int {
    ($($t:ty),*) => {
        $(impl Finite for $t {
            fn is_finite_value(&self) -> bool {
                true
            }
        })*
    };
}

finite_int!(u8, u32, u64, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings() {
        assert_eq!(Section::from_heading("[HitObjects]"), Some(Section::HitObjects));
        assert_eq!(
            Section::from_heading("[Storyboard]"),
            Some(Section::Unknown("Storyboard".into()))
        );
        assert_eq!(Section::from_heading("AudioFilename: a.mp3"), None);
    }

    #[test]
    fn test_meaningful_lines_keep_source_numbers() {
        let text = "\u{feff}osu file format v14\r\n\r\n// comment\n  [General]  \nMode: 3\n";
        let lines: Vec<_> = meaningful_lines(text).collect();
        assert_eq!(
            lines,
            vec![
                Line { number: 1, text: "osu file format v14" },
                Line { number: 4, text: "[General]" },
                Line { number: 5, text: "Mode: 3" },
            ]
        );
    }

    #[test]
    fn test_key_value_splits_at_first_colon() {
        assert_eq!(key_value("Title:Re: Zero"), Some(("Title", "Re: Zero")));
        assert_eq!(key_value("no separator"), None);
    }

    #[test]
    fn test_number_rejects_garbage_and_nan() {
        let section = Section::TimingPoints;
        assert_eq!(number::<f64>("12.5", "time", &section, 3).unwrap(), 12.5);
        assert!(number::<f64>("NaN", "time", &section, 3).is_err());
        assert!(number::<u32>("4.5", "meter", &section, 3).is_err());
        let err = number::<f64>("abc", "time", &section, 7).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedRecord { ref section, line: 7, .. } if section == "TimingPoints"
        ));
    }
}
