//! Data ingestion and normalization for the predchart pipeline.
//!
//! This crate handles:
//! - The table source interface (SQLite and in-memory backends)
//! - Table catalog resolution (actual/predicted pairing)
//! - Timestamp parsing
//! - Series normalization and duplicate resolution

pub mod catalog;
pub mod normalizer;
pub mod source;
pub mod sqlite;
pub mod timestamp;

pub use catalog::CatalogResolver;
pub use normalizer::SeriesNormalizer;
pub use source::{MemorySource, TableSource};
pub use sqlite::SqliteSource;
pub use timestamp::parse_timestamp;
