//! Raw document supply.
//!
//! Fetching pages is somebody else's job; the pipeline only needs to list
//! document ids and read each one's markup.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use keyness_shared::{DocumentId, KeynessError, Result};

/// Extension of raw documents in a [`DirectorySource`].
pub const RAW_EXTENSION: &str = "html";

/// Supplies raw markup keyed by document id.
pub trait RawSource {
    /// Ids of every document in the corpus, in processing order.
    fn document_ids(&self) -> Result<Vec<DocumentId>>;

    /// Raw markup of one document.
    ///
    /// [`KeynessError::MissingInput`] if absent, [`KeynessError::UnreadableInput`]
    /// if present but not readable.
    fn read(&self, doc_id: &DocumentId) -> Result<String>;
}

// ---------------------------------------------------------------------------
// DirectorySource
// ---------------------------------------------------------------------------

/// Raw documents stored as `<dir>/<doc-id>.html`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    ids: Option<Vec<DocumentId>>,
}

impl DirectorySource {
    /// Every `*.html` file in `dir` is a document.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ids: None,
        }
    }

    /// Only the given ids are documents, whether or not their file exists.
    pub fn with_ids(dir: impl Into<PathBuf>, ids: Vec<DocumentId>) -> Self {
        Self {
            dir: dir.into(),
            ids: Some(ids),
        }
    }

    fn path_for(&self, doc_id: &DocumentId) -> PathBuf {
        self.dir.join(format!("{doc_id}.{RAW_EXTENSION}"))
    }

    fn scan(&self) -> Result<Vec<DocumentId>> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| KeynessError::io(&self.dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| KeynessError::io(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(RAW_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping raw file with non-UTF-8 name");
                continue;
            };
            match DocumentId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping raw file"),
            }
        }
        ids.sort();
        debug!(dir = %self.dir.display(), count = ids.len(), "scanned raw documents");
        Ok(ids)
    }
}

impl RawSource for DirectorySource {
    fn document_ids(&self) -> Result<Vec<DocumentId>> {
        match &self.ids {
            Some(ids) => Ok(ids.clone()),
            None => self.scan(),
        }
    }

    fn read(&self, doc_id: &DocumentId) -> Result<String> {
        let path = self.path_for(doc_id);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KeynessError::MissingInput {
                doc_id: doc_id.clone(),
            }),
            Err(source) => Err(KeynessError::UnreadableInput {
                doc_id: doc_id.clone(),
                path,
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// Raw documents held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    ids: Vec<DocumentId>,
    docs: BTreeMap<DocumentId, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with its markup. Re-inserting an id replaces the markup.
    pub fn insert(&mut self, doc_id: DocumentId, markup: impl Into<String>) -> &mut Self {
        if !self.ids.contains(&doc_id) {
            self.ids.push(doc_id.clone());
        }
        self.docs.insert(doc_id, markup.into());
        self
    }

    /// List a document whose markup is not available.
    pub fn insert_missing(&mut self, doc_id: DocumentId) -> &mut Self {
        if !self.ids.contains(&doc_id) {
            self.ids.push(doc_id);
        }
        self
    }
}

impl RawSource for MemorySource {
    fn document_ids(&self) -> Result<Vec<DocumentId>> {
        Ok(self.ids.clone())
    }

    fn read(&self, doc_id: &DocumentId) -> Result<String> {
        self.docs
            .get(doc_id)
            .cloned()
            .ok_or_else(|| KeynessError::MissingInput {
                doc_id: doc_id.clone(),
            })
    }
}
