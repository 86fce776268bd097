//! Asset lifecycle: revocable handles for audio, images and samples.

pub mod handle;
pub mod manager;

pub use handle::{AssetEvent, AssetHandle, AssetKind};
pub use manager::AssetManager;
