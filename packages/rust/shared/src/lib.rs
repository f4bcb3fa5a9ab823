//! Shared types, error model, and configuration for the keyness pipeline.
//!
//! This crate is the foundation depended on by all other keyness crates.
//! It provides:
//! - [`KeynessError`], the unified error type
//! - Domain types ([`DocumentId`], [`TermFrequency`], [`CorpusFrequency`],
//!   [`KeynessResult`], [`ArtifactKind`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalysisConfig, AppConfig, MIN_TERM_CHARS, PathsConfig, RunConfig, SIGNIFICANCE_CUTOFF,
    SMOOTHING_FLOOR, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
pub use error::{KeynessError, Result};
pub use types::{
    ArtifactKind, CorpusFrequency, DocumentId, KeyTerm, KeynessResult, TermFrequency,
};
