//! Archive bytes to [`ChartRecord`].

use crate::archive::{
    ArchiveManifest, AssetRole, RawArchive, ResolvedAsset, resolve_asset, resolve_chart,
    resolve_samples, resolve_skin,
};
use crate::assets::{AssetHandle, AssetKind, AssetManager};
use crate::database::{ArchiveSource, ArchiveStore};
use crate::error::{LoadError, Result};
use crate::logic::record::ChartRecord;
use crate::models::{BeatmapId, BeatmapSetId, ParsedChart};
use crate::parser::parse_chart;
use crate::skin::{SkinIni, load_skin};
use std::collections::BTreeMap;

/// Everything decoded from the archive, before any handle exists.
struct Decoded {
    chart: ParsedChart,
    background: Option<ResolvedAsset>,
    song: Option<ResolvedAsset>,
    samples: BTreeMap<String, ResolvedAsset>,
    skin: Option<SkinIni>,
}

/// Loads one chart of a beatmap set.
///
/// The chart and skin are fully parsed and validated before the first asset
/// handle is acquired, so a failed load never exposes assets. If the future is
/// dropped midway, handles acquired so far are revoked as they drop.
pub async fn load_chart<S: ArchiveSource>(
    store: &ArchiveStore<S>,
    assets: &AssetManager,
    set_id: &BeatmapSetId,
    beatmap_id: BeatmapId,
) -> Result<ChartRecord> {
    let archive = store.get(set_id).await?;

    let decoded = tokio::task::spawn_blocking(move || decode(archive, beatmap_id))
        .await
        .map_err(|e| LoadError::ArchiveCorrupt(format!("extraction task failed: {}", e)))??;

    let record = ChartRecord {
        background: decoded
            .background
            .map(|asset| acquire(assets, asset, AssetKind::Image)),
        song: decoded
            .song
            .map(|asset| acquire(assets, asset, AssetKind::Audio)),
        samples: decoded
            .samples
            .into_iter()
            .map(|(key, asset)| (key, acquire(assets, asset, AssetKind::Sound)))
            .collect(),
        chart: decoded.chart,
        skin: decoded.skin,
    };

    log::info!(
        "Loaded {} ({}K, {} notes, {} samples)",
        record.metadata().display_name(),
        record.key_count(),
        record.hit_objects().len(),
        record.samples().len()
    );
    Ok(record)
}

fn acquire(assets: &AssetManager, asset: ResolvedAsset, kind: AssetKind) -> AssetHandle {
    assets.acquire(asset.bytes, kind, &asset.entry_name)
}

fn decode(archive: RawArchive, beatmap_id: BeatmapId) -> Result<Decoded> {
    let manifest = ArchiveManifest::extract(archive)?;
    log::debug!("Archive has {} entries", manifest.len());

    let source = resolve_chart(&manifest, beatmap_id)?;
    let chart = parse_chart(&source.text)?;
    if !chart.metadata.is_mania() {
        log::warn!(
            "{} declares mode {}, loading it as mania",
            source.entry_name,
            chart.metadata.mode
        );
    }

    let skin = resolve_skin(&manifest)?
        .map(|raw| load_skin(&raw))
        .transpose()?;

    let background = resolve_asset(&manifest, AssetRole::Background, &chart.metadata)?;
    let song = resolve_asset(&manifest, AssetRole::Audio, &chart.metadata)?;
    let samples = resolve_samples(&manifest, &chart)?;

    Ok(Decoded {
        chart,
        background,
        song,
        samples,
        skin,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::archive::fixtures::ZipBuilder;
    use crate::assets::AssetEvent;
    use crate::config::LoaderConfig;
    use crate::database::MemorySource;
    use crate::parser::tests::SAMPLE_CHART;
    use std::path::Path;

    pub(crate) const SET_ID: u64 = 500;

    pub(crate) fn sample_archive(skin: Option<&str>) -> Vec<u8> {
        let mut builder = ZipBuilder::new()
            .deflated("Artist - Title (Mapper) [4K Hard].osu", SAMPLE_CHART.as_bytes())
            .stored("audio.mp3", b"ID3 song bytes")
            .stored("bg.jpg", b"not really a jpeg")
            .deflated("soft-hitclap.wav", b"RIFF clap")
            .stored("readme.txt", b"hello");
        if let Some(skin) = skin {
            builder = builder.deflated("skin.ini", skin.as_bytes());
        }
        builder.build()
    }

    pub(crate) async fn store_with(dir: &Path, archive: Vec<u8>) -> ArchiveStore<MemorySource> {
        let config = LoaderConfig {
            database_path: dir.join("archives.db"),
            quota_bytes: 4 * 1024 * 1024,
            ..Default::default()
        };
        ArchiveStore::open(&config, MemorySource::new().with(SET_ID, archive))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_load_chart_assembles_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), sample_archive(Some("[Mania]\nKeys: 4\n"))).await;
        let (assets, rx) = AssetManager::channel();

        let record = load_chart(&store, &assets, &SET_ID.into(), 1001).await.unwrap();
        assert_eq!(record.key_count(), 4);
        assert!(!record.hit_objects().is_empty());
        assert_eq!(record.song().map(|s| s.kind()), Some(AssetKind::Audio));
        assert_eq!(record.background().map(|b| b.name()), Some("bg.jpg"));
        assert_eq!(record.background().and_then(|b| b.dimensions()), None);
        assert!(record.sample("soft-hitclap").is_some());
        assert!(record.skin().and_then(|s| s.mania(4)).is_some());

        let registered = rx
            .try_iter()
            .filter(|event| matches!(event, AssetEvent::Registered { .. }))
            .count();
        assert_eq!(registered, 3);
        assert_eq!(record.release(), 3);
    }

    #[tokio::test]
    async fn test_missing_chart_acquires_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), sample_archive(None)).await;
        let (assets, rx) = AssetManager::channel();

        let err = load_chart(&store, &assets, &SET_ID.into(), 9999).await.unwrap_err();
        assert!(matches!(err, LoadError::ChartNotFound(9999)));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_skin_aborts_before_assets() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), sample_archive(Some("[Mania]\nColumnWidth: 30\n"))).await;
        let (assets, rx) = AssetManager::channel();

        let err = load_chart(&store, &assets, &SET_ID.into(), 1001).await.unwrap_err();
        assert!(matches!(err, LoadError::SkinSectionMissingKeys { line: 1 }));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), b"definitely not a zip".to_vec()).await;
        let (assets, _rx) = AssetManager::channel();

        let err = load_chart(&store, &assets, &SET_ID.into(), 1001).await.unwrap_err();
        assert!(matches!(err, LoadError::ArchiveCorrupt(_)));
    }
}
