//! Filesystem artifact store.
//!
//! Derived artifacts live under one root, one namespace per [`ArtifactKind`]:
//!
//! ```text
//! <root>/
//! ├── manifest.json
//! ├── normalized/<doc-id>.txt
//! ├── term-frequency/<doc-id>.tsv
//! └── keyness/<doc-id>.tsv
//! ```
//!
//! Every write goes to a dot-prefixed temporary sibling first and is then
//! renamed over the target, so readers see either the previous complete
//! artifact or the new one.

pub mod manifest;
pub mod tsv;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use keyness_shared::{
    ArtifactKind, DocumentId, KeynessError, KeynessResult, Result, TermFrequency,
};

pub use manifest::{ArtifactMeta, MANIFEST_FILE_NAME, RunManifest, SkippedDocument};

/// Handle to an artifact store rooted at a directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store at `root`, creating the root and every namespace.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for kind in ArtifactKind::ALL {
            let dir = root.join(kind.namespace());
            std::fs::create_dir_all(&dir).map_err(|e| KeynessError::storage_write(&dir, e))?;
        }
        debug!(root = %root.display(), "artifact store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the artifact of `kind` for `doc_id`.
    pub fn path_for(&self, kind: ArtifactKind, doc_id: &DocumentId) -> PathBuf {
        self.root
            .join(kind.namespace())
            .join(format!("{doc_id}.{}", kind.extension()))
    }

    /// Whether a complete artifact of `kind` exists for `doc_id`.
    pub fn exists(&self, kind: ArtifactKind, doc_id: &DocumentId) -> bool {
        self.path_for(kind, doc_id).is_file()
    }

    /// Delete every artifact held for `doc_id`. Returns how many existed.
    pub fn remove_document(&self, doc_id: &DocumentId) -> Result<usize> {
        let mut removed = 0;
        for kind in ArtifactKind::ALL {
            let path = self.path_for(kind, doc_id);
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(KeynessError::storage_write(path, e)),
            }
        }
        if removed > 0 {
            debug!(doc_id = %doc_id, removed, "removed document artifacts");
        }
        Ok(removed)
    }

    // --- normalized text ---

    pub fn put_normalized(&self, doc_id: &DocumentId, text: &str) -> Result<ArtifactMeta> {
        self.write_artifact(ArtifactKind::Normalized, doc_id, text)
    }

    pub fn get_normalized(&self, doc_id: &DocumentId) -> Result<Option<String>> {
        self.read_artifact(ArtifactKind::Normalized, doc_id)
    }

    // --- term frequencies ---

    pub fn put_term_frequency(
        &self,
        doc_id: &DocumentId,
        tf: &TermFrequency,
    ) -> Result<ArtifactMeta> {
        self.write_artifact(
            ArtifactKind::TermFrequency,
            doc_id,
            &tsv::encode_term_frequency(tf),
        )
    }

    pub fn get_term_frequency(&self, doc_id: &DocumentId) -> Result<Option<TermFrequency>> {
        self.read_artifact(ArtifactKind::TermFrequency, doc_id)?
            .map(|content| tsv::decode_term_frequency(&content))
            .transpose()
    }

    // --- keyness ---

    pub fn put_keyness(&self, doc_id: &DocumentId, result: &KeynessResult) -> Result<ArtifactMeta> {
        self.write_artifact(ArtifactKind::Keyness, doc_id, &tsv::encode_keyness(result))
    }

    pub fn get_keyness(&self, doc_id: &DocumentId) -> Result<Option<KeynessResult>> {
        self.read_artifact(ArtifactKind::Keyness, doc_id)?
            .map(|content| tsv::decode_keyness(&content))
            .transpose()
    }

    // --- manifest ---

    /// Write `manifest.json` at the store root.
    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest).map_err(|e| {
            KeynessError::validation(format!("JSON serialization failed: {e}"))
        })?;
        let target = self.root.join(MANIFEST_FILE_NAME);
        write_atomic(&target, json.as_bytes())?;
        debug!(path = %target.display(), "wrote manifest");
        Ok(())
    }

    /// Read `manifest.json`, if a run has completed here.
    pub fn read_manifest(&self) -> Result<Option<RunManifest>> {
        let path = self.root.join(MANIFEST_FILE_NAME);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| KeynessError::parse(format!("invalid {}: {e}", path.display())))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(kind = %kind, doc_id = %doc_id))]
    fn write_artifact(
        &self,
        kind: ArtifactKind,
        doc_id: &DocumentId,
        content: &str,
    ) -> Result<ArtifactMeta> {
        let target = self.path_for(kind, doc_id);
        write_atomic(&target, content.as_bytes())?;

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let sha256 = format!("{:x}", hasher.finalize());

        debug!(path = %target.display(), size = content.len(), "wrote artifact");

        Ok(ArtifactMeta {
            kind,
            doc_id: doc_id.clone(),
            sha256,
            size_bytes: content.len(),
        })
    }

    fn read_artifact(&self, kind: ArtifactKind, doc_id: &DocumentId) -> Result<Option<String>> {
        read_optional(&self.path_for(kind, doc_id))
    }
}

/// Write `bytes` to a temporary sibling of `target`, flush, then rename.
///
/// On any failure the temporary file is removed and `target` is untouched.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| KeynessError::validation(format!("invalid artifact path {target:?}")))?;
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    let written = File::create(&temp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| std::fs::rename(&temp, target));

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp);
        return Err(KeynessError::storage_write(target, e));
    }
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KeynessError::io(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
