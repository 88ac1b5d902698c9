//! Chart emission and orchestration for the predchart pipeline.
//!
//! This crate provides:
//! - The chart renderer interface and a self-contained HTML/SVG renderer
//! - The pipeline that drives every table pair from discovery to artifact
//! - Per-pair outcome reporting

pub mod pipeline;
pub mod renderer;

pub use pipeline::{PairOutcome, PairStatus, Pipeline, PipelineReport};
pub use renderer::{output_id_for, ChartRenderer, HtmlChartRenderer};
