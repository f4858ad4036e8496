//! yieldbin: quantile binning and bin-index evaluation
//!
//! Turns a continuous outcome column into quantile bins with per-bin means,
//! exports instruction records for a sequence model, and scores the model's
//! bin predictions as regression estimates.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
