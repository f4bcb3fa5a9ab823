//! Keyness pipeline orchestration.
//!
//! Ties normalization, term counting, corpus aggregation, and scoring
//! together over a [`RawSource`], persisting each stage in an
//! [`ArtifactStore`](keyness_artifacts::ArtifactStore).

pub mod aggregate;
pub mod pipeline;
pub mod score;
pub mod source;

pub use aggregate::{aggregate, check_coverage, merge_into};
pub use pipeline::{
    PipelineOptions, ProgressReporter, RunSummary, SilentProgress, Staged, count_document,
    normalize_document, run, score_document,
};
pub use score::{KeynessScorer, ensure_scorable};
pub use source::{DirectorySource, MemorySource, RawSource};
