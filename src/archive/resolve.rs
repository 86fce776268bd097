//! Picks the requested chart and its companion files out of a manifest.

use super::manifest::ArchiveManifest;
use super::zip::EntryMeta;
use crate::error::{LoadError, Result};
use crate::models::{ChartMetadata, ParsedChart};
use crate::parser::peek_beatmap_id;
use crate::skin::SKIN_FILE;
use std::collections::BTreeMap;

const CHART_EXTENSION: &str = ".osu";
const SAMPLE_EXTENSIONS: [&str; 3] = ["wav", "ogg", "mp3"];
const SAMPLE_PREFIXES: [&str; 3] = ["normal-", "soft-", "drum-"];

/// Text of the selected chart entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSource {
    pub entry_name: String,
    pub text: String,
}

/// Companion files whose names are declared inside the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Audio,
    Background,
}

/// A decompressed archive entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub entry_name: String,
    pub bytes: Vec<u8>,
}

fn is_chart(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(CHART_EXTENSION)
}

/// Selects the chart whose `BeatmapID` equals `beatmap_id`.
///
/// Archives exported without online ids carry no `BeatmapID` in any chart; in
/// that case charts are ordered by entry name and `beatmap_id` is used as a
/// zero-based index into that list.
pub fn resolve_chart(manifest: &ArchiveManifest, beatmap_id: u64) -> Result<ChartSource> {
    let candidates: Vec<&EntryMeta> = manifest
        .names()
        .filter(|name| is_chart(name))
        .filter_map(|name| manifest.entry(name))
        .collect();

    let mut texts = Vec::with_capacity(candidates.len());
    let mut any_declared = false;
    for entry in candidates {
        let text = manifest.read_text(entry)?;
        match peek_beatmap_id(&text) {
            Some(id) if id == beatmap_id => {
                log::info!("Resolved beatmap {} to {}", beatmap_id, entry.name);
                return Ok(ChartSource {
                    entry_name: entry.name.clone(),
                    text,
                });
            }
            Some(_) => any_declared = true,
            None => {}
        }
        texts.push((entry.name.clone(), text));
    }

    if !any_declared {
        if let Some((entry_name, text)) = usize::try_from(beatmap_id)
            .ok()
            .and_then(|index| (index < texts.len()).then(|| texts.swap_remove(index)))
        {
            log::info!(
                "Archive declares no beatmap ids, resolved index {} to {}",
                beatmap_id,
                entry_name
            );
            return Ok(ChartSource { entry_name, text });
        }
    }

    Err(LoadError::ChartNotFound(beatmap_id))
}

/// Reads the audio or background file named by the chart. A name that is not
/// declared or not present in the archive yields `None`.
pub fn resolve_asset(
    manifest: &ArchiveManifest,
    role: AssetRole,
    metadata: &ChartMetadata,
) -> Result<Option<ResolvedAsset>> {
    let declared = match role {
        AssetRole::Audio => metadata.audio_filename.as_deref(),
        AssetRole::Background => metadata.background_file.as_deref(),
    };
    let Some(name) = declared else {
        return Ok(None);
    };
    let Some(entry) = manifest.find(name) else {
        log::warn!("{:?} file {:?} is declared but missing from the archive", role, name);
        return Ok(None);
    };
    Ok(Some(ResolvedAsset {
        entry_name: entry.name.clone(),
        bytes: manifest.read(entry)?,
    }))
}

/// Collects hit-sound samples, keyed by entry name without its extension.
///
/// Samples are every audio entry named after a sample set (`normal-`, `soft-`,
/// `drum-`) plus every custom file referenced by a hit object. The song audio
/// itself is never a sample.
pub fn resolve_samples(
    manifest: &ArchiveManifest,
    chart: &ParsedChart,
) -> Result<BTreeMap<String, ResolvedAsset>> {
    let song = chart
        .metadata
        .audio_filename
        .as_deref()
        .and_then(|name| manifest.find(name))
        .map(|entry| entry.name.clone());

    let mut selected: BTreeMap<String, &EntryMeta> = BTreeMap::new();
    for name in manifest.names().filter(|name| is_sample_name(name)) {
        if let Some(entry) = manifest.entry(name) {
            selected.insert(entry.name.clone(), entry);
        }
    }
    for reference in chart.hit_objects.iter().filter_map(|o| o.sample_ref.as_deref()) {
        match manifest.find(reference) {
            Some(entry) => {
                selected.insert(entry.name.clone(), entry);
            }
            None => log::debug!("Custom sample {:?} is not in the archive", reference),
        }
    }
    if let Some(song) = &song {
        selected.remove(song);
    }

    // Entries differing only by extension share a key; the preferred format wins.
    let mut by_key: BTreeMap<String, &EntryMeta> = BTreeMap::new();
    for (name, entry) in selected {
        let key = sample_key(&name);
        if let Some(kept) = by_key.get(&key) {
            if extension_rank(&kept.name) <= extension_rank(&name) {
                log::debug!("Sample {} shadowed by {}", name, kept.name);
                continue;
            }
        }
        by_key.insert(key, entry);
    }

    let mut samples = BTreeMap::new();
    for (key, entry) in by_key {
        samples.insert(
            key,
            ResolvedAsset {
                bytes: manifest.read(entry)?,
                entry_name: entry.name.clone(),
            },
        );
    }
    Ok(samples)
}

/// Reads the archive's skin configuration, if it ships one.
pub fn resolve_skin(manifest: &ArchiveManifest) -> Result<Option<String>> {
    match manifest.find(SKIN_FILE) {
        Some(entry) => manifest.read_text(entry).map(Some),
        None => Ok(None),
    }
}

fn is_sample_name(name: &str) -> bool {
    let file = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    let has_extension = file
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SAMPLE_EXTENSIONS.contains(&ext));
    has_extension && SAMPLE_PREFIXES.iter().any(|prefix| file.starts_with(prefix))
}

/// Entry name without the extension of its file part
/// (`soft-hitclap.wav` -> `soft-hitclap`, `sfx.v2/clap` unchanged).
pub fn sample_key(name: &str) -> String {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => name[..file_start + dot].to_string(),
        _ => name.to_string(),
    }
}

/// Lower is preferred when two samples share a key.
fn extension_rank(name: &str) -> usize {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    SAMPLE_EXTENSIONS
        .iter()
        .position(|candidate| *candidate == ext)
        .unwrap_or(SAMPLE_EXTENSIONS.len())
}
