//! Command-line entry point: `maniaload <setId> <beatmapId> [config]`.

use maniaload::config::CONFIG_FILE;
use maniaload::{ArchiveStore, AssetManager, ConfiguredSource, LoaderConfig, Session};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let (set_id, beatmap_id) = match (args.get(1), args.get(2).map(|s| s.parse::<u64>())) {
        (Some(set_id), Some(Ok(beatmap_id))) => (set_id.clone(), beatmap_id),
        _ => {
            eprintln!("usage: maniaload <setId> <beatmapId> [config]");
            return ExitCode::from(2);
        }
    };
    let config_path = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    match run(&config_path, set_id, beatmap_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_quota_exceeded() => {
            log::error!("{}. Run the command again to re-download the set.", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("MAIN: Load failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: &Path, set_id: String, beatmap_id: u64) -> maniaload::Result<()> {
    let config = LoaderConfig::load(config_path)?;
    let source = ConfiguredSource::from_config(&config)?;
    let store = Arc::new(ArchiveStore::open(&config, source).await?);
    let (assets, events) = AssetManager::channel();

    let mut session = Session::new(store, assets);
    let record = session.load(&set_id.as_str().into(), beatmap_id).await?;

    let metadata = record.metadata();
    log::info!("MAIN: {}", metadata.display_name());
    log::info!(
        "MAIN: {} keys, {} timing points, {} taps, {} holds, {:.0} BPM, {:.1}s",
        record.key_count(),
        record.timing_points().len(),
        record.chart().tap_count(),
        record.chart().hold_count(),
        record.chart().main_bpm(),
        record.chart().duration_ms() / 1000.0
    );
    if let Some(song) = record.song() {
        log::info!("MAIN: song {}", song.url().unwrap_or("-"));
    }
    if let Some(bg) = record.background() {
        match bg.dimensions() {
            Some((w, h)) => log::info!("MAIN: background {} ({}x{})", bg.name(), w, h),
            None => log::info!("MAIN: background {}", bg.name()),
        }
    }
    log::info!("MAIN: {} hit-sound sample(s)", record.samples().len());
    if let Some(skin) = record.skin() {
        log::info!("MAIN: skin supports {:?} keys", skin.supported_key_counts());
    }

    let released = session.end();
    log::debug!(
        "MAIN: released {} asset(s), {} asset event(s) emitted",
        released,
        events.try_iter().count()
    );
    Ok(())
}
