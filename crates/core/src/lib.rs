//! Core types and configuration for the predchart pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Raw tables, normalized series and aligned datasets
//! - Comparison plans
//! - Configuration structures
//! - Common error types

pub mod columns;
pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use types::*;
