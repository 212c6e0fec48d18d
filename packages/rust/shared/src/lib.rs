//! Shared types, error model, and configuration for ordertrack.
//!
//! This crate is the foundation depended on by all other ordertrack crates.
//! It provides:
//! - [`OrderTrackError`]: the unified error type
//! - Domain types ([`OrderRecord`], [`OrderCandidate`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, IngestConfig, OnKnown, ScheduleConfig, SourceConfig, StorageConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{OrderTrackError, Result};
pub use types::{DEFAULT_SOURCE_TAG, OrderCandidate, OrderRecord, PARAGRAPH_SEPARATOR};
