//! Run manifest: what a pipeline run wrote and what it skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyness_shared::{AnalysisConfig, ArtifactKind, DocumentId};

/// File name of the manifest at the store root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Checksum record for one written artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub kind: ArtifactKind,
    pub doc_id: DocumentId,
    /// Hex-encoded SHA-256 of the artifact bytes.
    pub sha256: String,
    pub size_bytes: usize,
}

/// A document that produced no artifacts in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub doc_id: DocumentId,
    /// Stable error kind, e.g. `missing-input`.
    pub kind: String,
    pub message: String,
}

/// The `manifest.json` structure written at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Tool version that produced the artifacts.
    pub tool_version: String,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// Parameters the run used.
    pub analysis: AnalysisConfig,
    /// Documents scored, in processing order.
    pub documents: Vec<DocumentId>,
    /// Documents skipped with the reason.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedDocument>,
    /// Distinct terms in the corpus frequency table.
    pub vocabulary_size: usize,
    /// Every artifact written, in write order.
    pub artifacts: Vec<ArtifactMeta>,
}

impl RunManifest {
    /// Checksum of the artifact of `kind` for `doc_id`, if one was written.
    pub fn checksum(&self, kind: ArtifactKind, doc_id: &DocumentId) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.kind == kind && &a.doc_id == doc_id)
            .map(|a| a.sha256.as_str())
    }
}
