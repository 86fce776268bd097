//! Reader for normalized skin INI text.

use super::normalize::BOM;
use std::str::FromStr;

/// One `[Heading]` and its entries in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    /// Last value declared for `key` (later declarations override earlier ones).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value parsed as `T`.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Comma-separated colour (`r,g,b[,a]`), alpha defaulting to 255.
    pub fn colour(&self, key: &str) -> Option<[u8; 4]> {
        let parts: Vec<u8> = self
            .get(key)?
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts[..] {
            [r, g, b] => Some([r, g, b, 255]),
            [r, g, b, a] => Some([r, g, b, a]),
            _ => None,
        }
    }
}

/// Parsed skin configuration, keeping the normalized text it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinIni {
    /// Normalized INI text.
    pub text: String,
    /// Sections in file order. Entries before the first heading land in a
    /// section with an empty name.
    pub sections: Vec<IniSection>,
}

impl SkinIni {
    /// Parses normalized INI text.
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<IniSection> = Vec::new();
        let body = text.strip_prefix(BOM).unwrap_or(text);

        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                sections.push(IniSection {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let entry = line
                .split_once('=')
                .or_else(|| line.split_once(char::is_whitespace));
            let (key, value) = match entry {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (line, ""),
            };

            if sections.is_empty() {
                sections.push(IniSection::default());
            }
            if let Some(section) = sections.last_mut() {
                section.entries.push((key.to_string(), value.to_string()));
            }
        }

        Self {
            text: text.to_string(),
            sections,
        }
    }

    /// First section with the given name.
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Mania settings for a key count (`[Mania4]` for 4K).
    pub fn mania(&self, key_count: usize) -> Option<&IniSection> {
        self.section(&format!("Mania{}", key_count))
    }

    /// Key counts that have a dedicated mania section.
    pub fn supported_key_counts(&self) -> Vec<usize> {
        self.sections
            .iter()
            .filter_map(|s| s.name.strip_prefix("Mania")?.parse().ok())
            .collect()
    }
}
