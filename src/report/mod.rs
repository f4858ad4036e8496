//! Report module - console summaries and JSON export

pub mod evaluation_export;
pub mod summary;

pub use evaluation_export::*;
pub use summary::*;
