//! Dashboard screens

pub mod records;
pub mod tracker;

pub use records::{RecordKind, RecordsScreen};
pub use tracker::TrackerScreen;
