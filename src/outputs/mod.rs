//! Output writers.
//!
//! - [`json`]: writes response envelopes to dated JSON snapshot files

pub mod json;
