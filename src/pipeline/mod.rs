//! Pipeline module - binning, mapping, decoding and evaluation stages

pub mod config;
pub mod decoder;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod mapper;
pub mod missing;
pub mod predictions;
pub mod quantizer;
pub mod records;

pub use config::*;
pub use decoder::*;
pub use error::*;
pub use evaluator::*;
pub use loader::*;
pub use mapper::*;
pub use missing::*;
pub use predictions::*;
pub use quantizer::*;
pub use records::*;
