//! The assembled, render-ready chart.

use crate::assets::AssetHandle;
use crate::models::{ChartMetadata, HitObject, ParsedChart, TimingPoint};
use crate::skin::SkinIni;
use std::collections::BTreeMap;

/// A parsed chart together with the assets it needs.
///
/// Owns its asset handles. [`ChartRecord::release`] revokes them explicitly;
/// dropping the record revokes whatever is still live.
#[derive(Debug)]
pub struct ChartRecord {
    pub(crate) chart: ParsedChart,
    pub(crate) background: Option<AssetHandle>,
    pub(crate) song: Option<AssetHandle>,
    pub(crate) samples: BTreeMap<String, AssetHandle>,
    pub(crate) skin: Option<SkinIni>,
}

impl ChartRecord {
    pub fn key_count(&self) -> usize {
        self.chart.key_count
    }

    pub fn timing_points(&self) -> &[TimingPoint] {
        &self.chart.timing_points
    }

    pub fn hit_objects(&self) -> &[HitObject] {
        &self.chart.hit_objects
    }

    pub fn metadata(&self) -> &ChartMetadata {
        &self.chart.metadata
    }

    pub fn chart(&self) -> &ParsedChart {
        &self.chart
    }

    pub fn background(&self) -> Option<&AssetHandle> {
        self.background.as_ref()
    }

    pub fn song(&self) -> Option<&AssetHandle> {
        self.song.as_ref()
    }

    /// Hit-sound samples keyed by file stem (`soft-hitclap`).
    pub fn samples(&self) -> &BTreeMap<String, AssetHandle> {
        &self.samples
    }

    pub fn sample(&self, key: &str) -> Option<&AssetHandle> {
        self.samples.get(key)
    }

    pub fn skin(&self) -> Option<&SkinIni> {
        self.skin.as_ref()
    }

    /// Lane light colour for a zero-based column, from the skin section
    /// matching this chart's key count.
    pub fn stage_light_colour(&self, column: usize) -> Option<[u8; 4]> {
        self.skin
            .as_ref()?
            .mania(self.key_count())?
            .colour(&format!("ColourLight{}", column + 1))
    }

    fn handles_mut(&mut self) -> impl Iterator<Item = &mut AssetHandle> {
        self.background
            .iter_mut()
            .chain(self.song.iter_mut())
            .chain(self.samples.values_mut())
    }

    /// Number of handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.background
            .iter()
            .chain(self.song.iter())
            .chain(self.samples.values())
            .filter(|handle| handle.is_live())
            .count()
    }

    /// Revokes every asset handle and consumes the record. Returns how many
    /// handles were released.
    pub fn release(mut self) -> usize {
        let mut released = 0;
        for handle in self.handles_mut() {
            if handle.is_live() && handle.release().is_ok() {
                released += 1;
            }
        }
        log::debug!(
            "Released {} asset(s) of {}",
            released,
            self.chart.metadata.display_name()
        );
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetEvent, AssetKind, AssetManager};
    use crate::parser::parse_chart;
    use crate::parser::tests::SAMPLE_CHART;
    use crate::skin::load_skin;

    fn record(manager: &AssetManager) -> ChartRecord {
        let mut samples = BTreeMap::new();
        samples.insert(
            "soft-hitclap".to_string(),
            manager.acquire(b"clap".to_vec(), AssetKind::Sound, "soft-hitclap.wav"),
        );
        ChartRecord {
            chart: parse_chart(SAMPLE_CHART).unwrap(),
            background: None,
            song: Some(manager.acquire(b"song".to_vec(), AssetKind::Audio, "audio.mp3")),
            samples,
            skin: Some(load_skin("[Mania]\nKeys: 4\nColourLight2: 1,2,3,4\n").unwrap()),
        }
    }

    #[test]
    fn test_release_revokes_each_handle_once() {
        let (manager, rx) = AssetManager::channel();
        let record = record(&manager);
        assert_eq!(record.live_handles(), 2);
        assert_eq!(record.release(), 2);

        let revoked = rx
            .try_iter()
            .filter(|event| matches!(event, AssetEvent::Revoked { .. }))
            .count();
        assert_eq!(revoked, 2);
    }

    #[test]
    fn test_drop_revokes_live_handles() {
        let (manager, rx) = AssetManager::channel();
        drop(record(&manager));
        let revoked = rx
            .try_iter()
            .filter(|event| matches!(event, AssetEvent::Revoked { .. }))
            .count();
        assert_eq!(revoked, 2);
    }

    #[test]
    fn test_accessors() {
        let (manager, _rx) = AssetManager::channel();
        let record = record(&manager);
        assert_eq!(record.key_count(), 4);
        assert!(record.background().is_none());
        assert!(record.sample("soft-hitclap").is_some_and(|s| s.is_live()));
        assert_eq!(record.stage_light_colour(1), Some([1, 2, 3, 4]));
        assert_eq!(record.stage_light_colour(0), None);
    }
}
