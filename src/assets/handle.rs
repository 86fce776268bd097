//! Revocable handles over binary assets.

use crate::error::AssetError;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// What an asset is used for by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Song audio.
    Audio,
    /// Background image.
    Image,
    /// Hit-sound sample.
    Sound,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Image => "image",
            AssetKind::Sound => "sound",
        }
    }
}

/// Events sent to whoever serves asset URLs (the renderer side).
///
/// Events carry no asset bytes; those are reached through the live handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// A new URL now serves `len` bytes.
    Registered {
        url: String,
        kind: AssetKind,
        len: usize,
    },
    /// The URL is dead and its bytes may be dropped.
    Revoked { url: String },
}

/// A binary asset exposed under a transient URL.
///
/// Exactly one release happens per handle: either an explicit
/// [`AssetHandle::release`] or, if the handle is dropped while still live,
/// an implicit one from `Drop`. After release the handle is inert.
#[derive(Debug)]
pub struct AssetHandle {
    kind: AssetKind,
    name: String,
    url: String,
    bytes: Option<Arc<[u8]>>,
    dimensions: Option<(u32, u32)>,
    events: Sender<AssetEvent>,
}

impl AssetHandle {
    pub(crate) fn new(
        kind: AssetKind,
        name: String,
        url: String,
        bytes: Arc<[u8]>,
        dimensions: Option<(u32, u32)>,
        events: Sender<AssetEvent>,
    ) -> Self {
        Self {
            kind,
            name,
            url,
            bytes: Some(bytes),
            dimensions,
            events,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Archive entry the asset came from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until the handle is released.
    pub fn is_live(&self) -> bool {
        self.bytes.is_some()
    }

    /// Transient URL, `None` once released.
    pub fn url(&self) -> Option<&str> {
        self.is_live().then_some(self.url.as_str())
    }

    /// Asset bytes, `None` once released.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Pixel size for images that could be probed.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Revokes the URL. A second call is a caller bug and is reported.
    pub fn release(&mut self) -> Result<(), AssetError> {
        if self.bytes.take().is_none() {
            log::error!("Asset {} released twice", self.url);
            return Err(AssetError::AlreadyReleased(self.url.clone()));
        }
        log::debug!("Revoking {}", self.url);
        let _ = self.events.send(AssetEvent::Revoked {
            url: self.url.clone(),
        });
        Ok(())
    }
}

impl Drop for AssetHandle {
    fn drop(&mut self) {
        if self.is_live() {
            let _ = self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManager;

    #[test]
    fn test_release_frees_bytes_while_events_are_pending() {
        let (manager, rx) = AssetManager::channel();
        let mut handle = manager.acquire(vec![0u8; 4096], AssetKind::Audio, "audio.mp3");
        let weak = handle.bytes.as_ref().map(Arc::downgrade).unwrap();

        handle.release().unwrap();
        assert!(weak.upgrade().is_none());

        let events: Vec<AssetEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            AssetEvent::Registered { len: 4096, kind: AssetKind::Audio, .. }
        ));
    }
}
