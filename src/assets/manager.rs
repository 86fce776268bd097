//! Hands out asset handles.
//!
//! The manager keeps no registry of what it handed out: it only numbers URLs
//! and forwards register/revoke events. Whoever owns a handle owns its release.

use super::handle::{AssetEvent, AssetHandle, AssetKind};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// URL scheme of asset handles.
pub const ASSET_SCHEME: &str = "asset";

/// Wraps bytes into revocable handles and announces them on a channel.
#[derive(Clone, Debug)]
pub struct AssetManager {
    events: Sender<AssetEvent>,
    next_id: Arc<AtomicU64>,
}

impl AssetManager {
    /// Creates a manager sending events to `events`.
    pub fn new(events: Sender<AssetEvent>) -> Self {
        Self {
            events,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Creates a manager together with the receiving end of its event channel.
    /// The channel is unbounded; the receiver is expected to be drained as
    /// events arrive.
    pub fn channel() -> (Self, Receiver<AssetEvent>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    /// Wraps `bytes` in a live handle and registers its URL.
    pub fn acquire(&self, bytes: Vec<u8>, kind: AssetKind, name: &str) -> AssetHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}://{}/{}/{}", ASSET_SCHEME, kind.as_str(), id, name);
        let dimensions = match kind {
            AssetKind::Image => probe_dimensions(&bytes, name),
            AssetKind::Audio | AssetKind::Sound => None,
        };
        let bytes: Arc<[u8]> = Arc::from(bytes);

        log::debug!("Registering {} ({} bytes)", url, bytes.len());
        let _ = self.events.send(AssetEvent::Registered {
            url: url.clone(),
            kind,
            len: bytes.len(),
        });

        AssetHandle::new(
            kind,
            name.to_string(),
            url,
            bytes,
            dimensions,
            self.events.clone(),
        )
    }
}

/// Reads an image header for its size without decoding pixels.
fn probe_dimensions(bytes: &[u8], name: &str) -> Option<(u32, u32)> {
    let result = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.into_dimensions());
    match result {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            log::warn!("Could not read image {}: {}", name, e);
            None
        }
    }
}
