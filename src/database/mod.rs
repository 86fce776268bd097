//! Persistent archive cache backed by SQLite.

pub mod connection;
pub mod query;
pub mod source;
pub mod store;

pub use connection::Database;
pub use source::{ArchiveSource, ConfiguredSource, DirectorySource, HttpSource, MemorySource};
pub use store::ArchiveStore;
