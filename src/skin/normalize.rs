//! Rewrites the `skin.ini` dialect into plain INI.
//!
//! Differences handled:
//! - `//` comment lines are dropped.
//! - `Key: Value` becomes `Key=Value` (first colon only, and only on lines that
//!   have no `=` yet, so running the rewrite on its own output changes nothing).
//! - Every generic `[Mania]` heading is expanded into one `[Mania<n>]` section
//!   per key count declared by the `Keys` lines of that section.

use crate::error::{LoadError, Result};

/// Heading shared by every mania section in the dialect.
pub const GENERIC_MANIA_HEADING: &str = "[Mania]";

const LINE_ENDING: &str = "\r\n";

/// Byte order mark many skin editors write at the start of the file.
pub(crate) const BOM: char = '\u{feff}';

/// Normalizes skin dialect text.
pub fn normalize(raw: &str) -> Result<String> {
    let raw = raw.strip_prefix(BOM).unwrap_or(raw);
    let lines: Vec<(usize, String)> = raw
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with("//"))
        .map(|(number, line)| (number, colon_to_equals(line)))
        .collect();

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let (number, line) = &lines[i];
        if line != GENERIC_MANIA_HEADING {
            out.push(line.clone());
            i += 1;
            continue;
        }

        let body_end = lines[i + 1..]
            .iter()
            .position(|(_, l)| is_heading(l))
            .map_or(lines.len(), |offset| i + 1 + offset);
        let body = &lines[i + 1..body_end];

        let counts = declared_key_counts(body.iter().map(|(_, l)| l.as_str()));
        if counts.is_empty() {
            return Err(LoadError::SkinSectionMissingKeys { line: *number });
        }

        if let [count] = counts.as_slice() {
            out.push(format!("[Mania{}]", count));
            out.extend(body.iter().map(|(_, l)| l.clone()));
        } else {
            for count in counts {
                out.push(format!("[Mania{}]", count));
                out.extend(body.iter().map(|(_, l)| {
                    if keys_value(l).is_some() {
                        format!("Keys={}", count)
                    } else {
                        l.clone()
                    }
                }));
            }
        }
        i = body_end;
    }

    Ok(out.join(LINE_ENDING))
}

fn is_heading(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']')
}

fn colon_to_equals(line: &str) -> String {
    if line.contains('=') || is_heading(line) {
        line.to_string()
    } else if let Some((key, value)) = line.split_once(':') {
        format!("{}={}", key.trim_end(), value.trim_start())
    } else {
        line.to_string()
    }
}

/// Value part of a `Keys` declaration (`Keys: 4`, `Keys=4`, `Keys 4`).
fn keys_value(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Keys")?;
    if !rest.starts_with([' ', '\t', ':', '=']) {
        return None;
    }
    Some(rest.trim_start_matches([' ', '\t', ':', '=']).trim())
}

/// Distinct positive key counts in declaration order.
fn declared_key_counts<'a>(body: impl Iterator<Item = &'a str>) -> Vec<usize> {
    let mut counts = Vec::new();
    for value in body.filter_map(keys_value) {
        for count in value.split(',').filter_map(|v| v.trim().parse::<usize>().ok()) {
            if count > 0 && !counts.contains(&count) {
                counts.push(count);
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_heading_gets_key_count() {
        let raw = "[General]\nName: Test\n[Mania]\nKeys 4\nColumnWidth: 40\n";
        assert_eq!(
            normalize(raw).unwrap(),
            "[General]\r\nName=Test\r\n[Mania4]\r\nKeys 4\r\nColumnWidth=40"
        );
    }

    #[test]
    fn test_comments_dropped_and_order_kept() {
        let raw = "// skin by someone\n[General]\r\n  Author: me\n// trailing\nVersion: 2.5\n";
        assert_eq!(normalize(raw).unwrap(), "[General]\r\nAuthor=me\r\nVersion=2.5");
    }

    #[test]
    fn test_every_generic_heading_expanded() {
        let raw = "[Mania]\nKeys: 4\nHitPosition: 402\n\n[Mania]\nKeys: 7\nHitPosition: 410\n";
        let out = normalize(raw).unwrap();
        let lines: Vec<&str> = out.split(LINE_ENDING).collect();
        assert_eq!(
            lines,
            vec![
                "[Mania4]",
                "Keys=4",
                "HitPosition=402",
                "",
                "[Mania7]",
                "Keys=7",
                "HitPosition=410",
            ]
        );
    }

    #[test]
    fn test_multiple_counts_replicate_section() {
        let raw = "[Mania]\nKeys: 4,7\nColumnWidth: 30\n[Fonts]\nScorePrefix: score\n";
        let out = normalize(raw).unwrap();
        assert_eq!(
            out,
            "[Mania4]\r\nKeys=4\r\nColumnWidth=30\r\n[Mania7]\r\nKeys=7\r\nColumnWidth=30\r\n[Fonts]\r\nScorePrefix=score"
        );
    }

    #[test]
    fn test_missing_keys_fails() {
        let raw = "[General]\nName: x\n[Mania]\nColumnWidth: 40\n[Mania]\nKeys: 4\n";
        assert_eq!(
            normalize(raw).unwrap_err().to_string(),
            LoadError::SkinSectionMissingKeys { line: 3 }.to_string()
        );
    }

    #[test]
    fn test_leading_bom_is_stripped() {
        let raw = "\u{feff}[Mania]\r\nKeys: 4\r\nColourLight1: 1,2,3\r\n";
        assert_eq!(normalize(raw).unwrap(), "[Mania4]\r\nKeys=4\r\nColourLight1=1,2,3");

        let missing = "\u{feff}[Mania]\r\nColumnWidth: 40\r\n";
        assert!(matches!(
            normalize(missing),
            Err(LoadError::SkinSectionMissingKeys { line: 1 })
        ));
    }

    #[test]
    fn test_keys_prefix_must_be_a_declaration() {
        let raw = "[Mania]\nKeysUnderNotes: 1\n";
        assert!(matches!(
            normalize(raw),
            Err(LoadError::SkinSectionMissingKeys { line: 1 })
        ));
    }

    #[test]
    fn test_idempotent_on_conventional_input() {
        let inputs = [
            "[General]\nName=Plain\nPath=C:\\skins\\plain\n[Mania4]\nKeys=4",
            "[General]\nName: Colon\nCursorTrail: cursor:trail\n",
            "// only comments\n// here",
            "",
        ];
        for input in inputs {
            let once = normalize(input).unwrap();
            assert_eq!(normalize(&once).unwrap(), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_output_is_fixed_point_after_expansion() {
        let once = normalize("[Mania]\nKeys: 4\nColour1: 0,0,0,255").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }
}
