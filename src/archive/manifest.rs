//! Name-indexed view over an archive's entries.

use super::RawArchive;
use super::zip::{self, EntryMeta};
use crate::error::Result;
use std::collections::BTreeMap;

/// Entries of one archive by exact (case-sensitive) name, with on-demand
/// decompression. Built once per load and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ArchiveManifest {
    bytes: RawArchive,
    entries: BTreeMap<String, EntryMeta>,
}

impl ArchiveManifest {
    /// Parses the container index.
    pub fn extract(bytes: RawArchive) -> Result<Self> {
        let entries = zip::read_central_directory(&bytes)?
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect::<BTreeMap<_, _>>();
        log::debug!("Archive manifest built with {} entries", entries.len());
        Ok(Self { bytes, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Exact-name lookup.
    pub fn entry(&self, name: &str) -> Option<&EntryMeta> {
        self.entries.get(name)
    }

    /// Lookup for a filename referenced from chart or skin text. Such names
    /// use `\` or `/` separators and were authored on case-insensitive
    /// filesystems, so an exact match wins and a case-insensitive one is the
    /// fallback.
    pub fn find(&self, reference: &str) -> Option<&EntryMeta> {
        let wanted = reference.trim().replace('\\', "/");
        let wanted = wanted.trim_start_matches("./");
        self.entries.get(wanted).or_else(|| {
            self.entries
                .values()
                .find(|entry| entry.name.eq_ignore_ascii_case(wanted))
        })
    }

    /// Decompresses an entry.
    pub fn read(&self, entry: &EntryMeta) -> Result<Vec<u8>> {
        zip::read_entry(&self.bytes, entry)
    }

    /// Decompresses a text entry. Invalid UTF-8 is replaced rather than
    /// rejected; chart text is ASCII apart from metadata strings.
    pub fn read_text(&self, entry: &EntryMeta) -> Result<String> {
        let bytes = self.read(entry)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fixtures::ZipBuilder;
    use crate::error::LoadError;
    use std::sync::Arc;

    fn manifest() -> ArchiveManifest {
        let zip = ZipBuilder::new()
            .stored("Song - Title (mapper) [Hard].osu", b"osu file format v14")
            .deflated("SB/BG.JPG", b"not really a jpeg")
            .stored("folder/", b"")
            .build();
        ArchiveManifest::extract(Arc::from(zip)).unwrap()
    }

    #[test]
    fn test_entries_indexed_by_name() {
        let m = manifest();
        assert_eq!(m.len(), 2);
        let names: Vec<&str> = m.names().collect();
        assert_eq!(names, vec!["SB/BG.JPG", "Song - Title (mapper) [Hard].osu"]);
        assert!(m.entry("sb/bg.jpg").is_none());
    }

    #[test]
    fn test_find_tolerates_case_and_separators() {
        let m = manifest();
        let entry = m.find("sb\\bg.jpg").unwrap();
        assert_eq!(entry.name, "SB/BG.JPG");
        assert_eq!(m.read(entry).unwrap(), b"not really a jpeg");
        assert!(m.find("missing.png").is_none());
    }

    #[test]
    fn test_exact_entry_is_case_sensitive() {
        let m = manifest();
        let entry = m.entry("Song - Title (mapper) [Hard].osu").unwrap();
        assert_eq!(m.read(entry).unwrap(), b"osu file format v14");
        assert!(m.entry("song - title (mapper) [hard].osu").is_none());
        assert!(m.entry("nope").is_none());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let garbage: RawArchive = Arc::from(vec![0u8; 64]);
        assert!(matches!(
            ArchiveManifest::extract(garbage),
            Err(LoadError::ArchiveCorrupt(_))
        ));
    }
}
