//! One gameplay session's hold on a loaded chart.

use crate::assets::AssetManager;
use crate::database::{ArchiveSource, ArchiveStore};
use crate::error::Result;
use crate::logic::loader::load_chart;
use crate::logic::record::ChartRecord;
use crate::models::{BeatmapId, BeatmapSetId};
use std::sync::Arc;

/// Holds at most one [`ChartRecord`] at a time.
///
/// Loading again (a retry, or another chart) releases the previous record's
/// assets before the new load starts, so two asset sets never overlap.
/// Dropping the session releases whatever it still holds.
pub struct Session<S> {
    store: Arc<ArchiveStore<S>>,
    assets: AssetManager,
    current: Option<ChartRecord>,
}

impl<S: ArchiveSource> Session<S> {
    pub fn new(store: Arc<ArchiveStore<S>>, assets: AssetManager) -> Self {
        Self {
            store,
            assets,
            current: None,
        }
    }

    /// Loads a chart, replacing the current one. On failure the session is
    /// left empty.
    pub async fn load(
        &mut self,
        set_id: &BeatmapSetId,
        beatmap_id: BeatmapId,
    ) -> Result<&ChartRecord> {
        if let Some(previous) = self.current.take() {
            let released = previous.release();
            log::debug!("Released {} asset(s) before reloading", released);
        }

        let record = load_chart(&self.store, &self.assets, set_id, beatmap_id).await?;
        Ok(&*self.current.insert(record))
    }

    pub fn record(&self) -> Option<&ChartRecord> {
        self.current.as_ref()
    }

    /// Ends the session, returning the number of handles released.
    pub fn end(&mut self) -> usize {
        self.current.take().map_or(0, ChartRecord::release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetEvent;
    use crate::logic::loader::tests::{SET_ID, sample_archive, store_with};
    use crossbeam_channel::Receiver;
    use std::collections::HashMap;

    /// Per-URL (registered, revoked) counts.
    fn tally(rx: &Receiver<AssetEvent>) -> HashMap<String, (usize, usize)> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for event in rx.try_iter() {
            match event {
                AssetEvent::Registered { url, .. } => counts.entry(url).or_default().0 += 1,
                AssetEvent::Revoked { url } => counts.entry(url).or_default().1 += 1,
            }
        }
        counts
    }

    async fn session(dir: &std::path::Path) -> (Session<crate::database::MemorySource>, Receiver<AssetEvent>) {
        let store = store_with(dir, sample_archive(None)).await;
        let (assets, rx) = AssetManager::channel();
        (Session::new(Arc::new(store), assets), rx)
    }

    #[tokio::test]
    async fn test_retry_releases_previous_assets_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, rx) = session(dir.path()).await;
        let id = BeatmapSetId::from(SET_ID);

        session.load(&id, 1001).await.unwrap();
        let first = tally(&rx);
        assert_eq!(first.len(), 3);
        assert!(first.values().all(|&(reg, rev)| reg == 1 && rev == 0));

        session.load(&id, 1001).await.unwrap();
        let second = tally(&rx);
        for url in first.keys() {
            assert_eq!(second.get(url).map(|c| c.1), Some(1));
        }
        assert_eq!(second.values().filter(|c| c.0 == 1).count(), 3);

        assert_eq!(session.end(), 3);
        assert_eq!(session.end(), 0);
        let after_end = tally(&rx);
        assert_eq!(after_end.len(), 3);
        assert!(after_end.values().all(|&(_, rev)| rev == 1));
    }

    #[tokio::test]
    async fn test_failed_reload_leaves_session_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, rx) = session(dir.path()).await;
        let id = BeatmapSetId::from(SET_ID);

        session.load(&id, 1001).await.unwrap();
        assert!(session.load(&id, 4242).await.is_err());
        assert!(session.record().is_none());
        let counts = tally(&rx);
        assert!(counts.values().all(|&(reg, rev)| reg == 1 && rev == 1));
    }

    #[tokio::test]
    async fn test_dropping_session_releases_assets() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, rx) = session(dir.path()).await;

        session.load(&SET_ID.into(), 1001).await.unwrap();
        drop(session);
        let counts = tally(&rx);
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&(reg, rev)| reg == 1 && rev == 1));
    }
}
