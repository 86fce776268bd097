//! The load pipeline: set id to render-ready chart.
//!
//! Archive bytes come from the [`ArchiveStore`](crate::database::ArchiveStore),
//! are decoded off the async runtime, and only then wrapped in asset handles.

pub mod loader;
pub mod record;
pub mod session;

pub use loader::load_chart;
pub use record::ChartRecord;
pub use session::Session;
