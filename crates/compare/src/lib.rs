//! Alignment and comparison selection for the predchart pipeline.
//!
//! This crate handles:
//! - Left-joining actual and predicted series on timestamp
//! - Choosing the rendering mode for each aligned dataset

pub mod aligner;
pub mod selector;

pub use aligner::align;
pub use selector::plan;
