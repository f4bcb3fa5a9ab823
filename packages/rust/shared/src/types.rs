//! Core domain types for the keyness pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::KeynessError;

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// Stable, filesystem-safe identity of one document in the corpus.
///
/// Ids are used verbatim as file stems inside every artifact namespace, so
/// they may not contain path separators, NUL bytes, or start with a dot
/// (dot-prefixed names are reserved for in-flight temporary files).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap a document id.
    pub fn new(id: impl Into<String>) -> Result<Self, KeynessError> {
        let id = id.into();
        if id.is_empty() {
            return Err(KeynessError::validation("document id must not be empty"));
        }
        if id.starts_with('.') {
            return Err(KeynessError::validation(format!(
                "document id '{id}' must not start with '.'"
            )));
        }
        if id.contains(['/', '\\', '\0']) {
            return Err(KeynessError::validation(format!(
                "document id '{}' contains a path separator or NUL",
                id.escape_default()
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = KeynessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = KeynessError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// TermFrequency
// ---------------------------------------------------------------------------

/// Occurrence count of each qualifying term within one document.
///
/// Backed by an ordered map so iteration (and therefore every tie-break
/// downstream) is lexicographic on the term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermFrequency {
    counts: BTreeMap<String, u64>,
}

impl TermFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `term`.
    pub fn increment(&mut self, term: impl Into<String>) {
        *self.counts.entry(term.into()).or_insert(0) += 1;
    }

    /// Add `count` occurrences of `term`. Zero counts are not stored.
    pub fn add(&mut self, term: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(term.into()).or_insert(0) += count;
    }

    pub fn get(&self, term: &str) -> Option<u64> {
        self.counts.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.counts.contains_key(term)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Entries ordered by descending count, ties in lexicographic term order.
    pub fn by_descending_count(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for TermFrequency {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut tf = Self::new();
        for (term, count) in iter {
            tf.add(term, count);
        }
        tf
    }
}

// ---------------------------------------------------------------------------
// CorpusFrequency
// ---------------------------------------------------------------------------

/// Total occurrences of each term summed across every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorpusFrequency {
    counts: BTreeMap<String, u64>,
}

impl CorpusFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to the running total of `term`, starting from zero.
    /// Zero counts are not stored.
    pub fn accumulate(&mut self, term: &str, count: u64) {
        if count == 0 {
            return;
        }
        match self.counts.get_mut(term) {
            Some(total) => *total += count,
            None => {
                self.counts.insert(term.to_owned(), count);
            }
        }
    }

    pub fn get(&self, term: &str) -> Option<u64> {
        self.counts.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.counts.contains_key(term)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }
}

// ---------------------------------------------------------------------------
// Keyness
// ---------------------------------------------------------------------------

/// One significant term and its log-likelihood critical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTerm {
    pub term: String,
    pub critical_value: f64,
}

/// Significant terms of one document, sorted by descending critical value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeynessResult {
    terms: Vec<KeyTerm>,
}

impl KeynessResult {
    /// Build a result from terms already sorted and thresholded by the scorer.
    pub fn from_sorted(terms: Vec<KeyTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[KeyTerm] {
        &self.terms
    }

    pub fn get(&self, term: &str) -> Option<f64> {
        self.terms
            .iter()
            .find(|k| k.term == term)
            .map(|k| k.critical_value)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Namespace of a derived artifact in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Normalized,
    TermFrequency,
    Keyness,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Normalized,
        ArtifactKind::TermFrequency,
        ArtifactKind::Keyness,
    ];

    /// Directory name of the namespace.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Normalized => "normalized",
            Self::TermFrequency => "term-frequency",
            Self::Keyness => "keyness",
        }
    }

    /// File extension of artifacts in the namespace.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Normalized => "txt",
            Self::TermFrequency | Self::Keyness => "tsv",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.namespace())
    }
}
