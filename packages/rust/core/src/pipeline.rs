//! End-to-end keyness pipeline: raw markup → normalized text → term
//! frequencies → corpus table → keyness, persisting every stage.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};

use keyness_artifacts::{ArtifactMeta, ArtifactStore, RunManifest, SkippedDocument};
use keyness_shared::{
    AnalysisConfig, CorpusFrequency, DocumentId, KeynessResult, Result, TermFrequency,
};
use keyness_text::Tokenizer;

use crate::aggregate;
use crate::score::{self, KeynessScorer};
use crate::source::RawSource;

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Tokenizer and scoring parameters.
    pub analysis: AnalysisConfig,
    /// Tool version recorded in the manifest.
    pub tool_version: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Documents whose keyness was computed, in processing order.
    pub scored: Vec<DocumentId>,
    /// Documents skipped with the reason.
    pub skipped: Vec<SkippedDocument>,
    /// Distinct terms in the corpus frequency table.
    pub vocabulary_size: usize,
    /// Number of artifacts written.
    pub artifacts_written: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Output of a stage together with the artifact it persisted.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    pub value: T,
    pub artifact: ArtifactMeta,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a document's term frequencies are stored.
    fn document_counted(&self, doc_id: &DocumentId, current: usize, total: usize);
    /// Called when a document is skipped.
    fn document_skipped(&self, doc_id: &DocumentId, reason: &str);
    /// Called when a document's keyness is stored.
    fn document_scored(&self, doc_id: &DocumentId, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_counted(&self, _doc_id: &DocumentId, _current: usize, _total: usize) {}
    fn document_skipped(&self, _doc_id: &DocumentId, _reason: &str) {}
    fn document_scored(&self, _doc_id: &DocumentId, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Read a document's markup, normalize it, and store the text.
#[instrument(skip_all, fields(doc_id = %doc_id))]
pub fn normalize_document(
    source: &dyn RawSource,
    store: &ArtifactStore,
    doc_id: &DocumentId,
) -> Result<Staged<String>> {
    let markup = source.read(doc_id)?;
    let text = keyness_text::normalize(&markup);
    let artifact = store.put_normalized(doc_id, &text)?;
    Ok(Staged {
        value: text,
        artifact,
    })
}

/// Count a document's terms and store the table.
#[instrument(skip_all, fields(doc_id = %doc_id))]
pub fn count_document(
    tokenizer: &Tokenizer,
    store: &ArtifactStore,
    doc_id: &DocumentId,
    text: &str,
) -> Result<Staged<TermFrequency>> {
    let tf = tokenizer.frequencies(text);
    let artifact = store.put_term_frequency(doc_id, &tf)?;
    Ok(Staged { value: tf, artifact })
}

/// Score a document against the corpus and store its significant terms.
#[instrument(skip_all, fields(doc_id = %doc_id))]
pub fn score_document(
    scorer: &KeynessScorer,
    store: &ArtifactStore,
    corpus: &CorpusFrequency,
    doc_id: &DocumentId,
    tf: &TermFrequency,
) -> Result<Staged<KeynessResult>> {
    let result = scorer.score(corpus, tf)?;
    let artifact = store.put_keyness(doc_id, &result)?;
    Ok(Staged {
        value: result,
        artifact,
    })
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the full pipeline over every document of `source`.
///
/// 1. Normalize and count each document (documents whose raw input is
///    missing or unreadable are skipped and their old artifacts removed)
/// 2. Aggregate the corpus table once every table is stored
/// 3. Check that the corpus covers every document term
/// 4. Score each counted document
/// 5. Write the run manifest
///
/// Storage failures, an empty corpus, and coverage violations abort the run.
#[instrument(skip_all, fields(store = %store.root().display()))]
pub fn run(
    source: &dyn RawSource,
    store: &ArtifactStore,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    options.analysis.validate()?;

    let tokenizer = Tokenizer::new(options.analysis.min_term_chars);
    let scorer = KeynessScorer::from(&options.analysis);
    let mut artifacts: Vec<ArtifactMeta> = Vec::new();
    let mut skipped: Vec<SkippedDocument> = Vec::new();

    // --- Phase 1: Normalize + count ---
    progress.phase("Counting terms");
    let doc_ids = source.document_ids()?;
    let total = doc_ids.len();
    info!(documents = total, "starting keyness pipeline");

    let mut tables: Vec<(DocumentId, TermFrequency)> = Vec::with_capacity(total);
    for (i, doc_id) in doc_ids.into_iter().enumerate() {
        let text = match normalize_document(source, store, &doc_id) {
            Ok(staged) => {
                artifacts.push(staged.artifact);
                staged.value
            }
            Err(e) if e.is_document_local() => {
                warn!(doc_id = %doc_id, error = %e, "skipping document");
                // Artifacts from an earlier run were scored against another corpus.
                store.remove_document(&doc_id)?;
                progress.document_skipped(&doc_id, e.kind());
                skipped.push(SkippedDocument {
                    doc_id,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let counted = count_document(&tokenizer, store, &doc_id, &text)?;
        artifacts.push(counted.artifact);
        progress.document_counted(&doc_id, i + 1, total);
        tables.push((doc_id, counted.value));
    }

    // --- Phase 2: Aggregate (barrier: every table is stored) ---
    progress.phase("Aggregating corpus");
    let corpus = aggregate::aggregate(tables.iter().map(|(_, tf)| tf));
    aggregate::check_coverage(&corpus, tables.iter().map(|(id, tf)| (id, tf)))?;
    score::ensure_scorable(&corpus)?;
    info!(
        vocabulary = corpus.len(),
        tokens = corpus.total(),
        "corpus frequency table ready"
    );

    // --- Phase 3: Score ---
    progress.phase("Scoring keyness");
    let scored_total = tables.len();
    let mut scored = Vec::with_capacity(scored_total);
    for (i, (doc_id, tf)) in tables.iter().enumerate() {
        let staged = score_document(&scorer, store, &corpus, doc_id, tf)?;
        info!(doc_id = %doc_id, significant = staged.value.len(), "document scored");
        artifacts.push(staged.artifact);
        progress.document_scored(doc_id, i + 1, scored_total);
        scored.push(doc_id.clone());
    }

    // --- Phase 4: Manifest ---
    progress.phase("Writing manifest");
    let manifest = RunManifest {
        tool_version: options.tool_version.clone(),
        generated_at: Utc::now(),
        analysis: options.analysis,
        documents: scored.clone(),
        skipped: skipped.clone(),
        vocabulary_size: corpus.len(),
        artifacts: artifacts.clone(),
    };
    store.write_manifest(&manifest)?;

    let summary = RunSummary {
        scored,
        skipped,
        vocabulary_size: corpus.len(),
        artifacts_written: artifacts.len(),
        elapsed: start.elapsed(),
    };

    info!(
        scored = summary.scored.len(),
        skipped = summary.skipped.len(),
        vocabulary = summary.vocabulary_size,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "keyness pipeline complete"
    );
    progress.done(&summary);

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use keyness_shared::{ArtifactKind, KeynessError};

    use super::*;
    use crate::source::{DirectorySource, MemorySource};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("keyness-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    fn doc(id: &str) -> DocumentId {
        DocumentId::new(id).unwrap()
    }

    fn repeated(word: &str, times: usize) -> String {
        format!("<html><body><p>{}</p></body></html>", vec![word; times].join(" "))
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn document_counted(&self, doc_id: &DocumentId, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("counted:{doc_id}:{current}/{total}"));
        }
        fn document_skipped(&self, doc_id: &DocumentId, reason: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("skipped:{doc_id}:{reason}"));
        }
        fn document_scored(&self, doc_id: &DocumentId, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("scored:{doc_id}:{current}/{total}"));
        }
        fn done(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", summary.scored.len()));
        }
    }

    #[test]
    fn single_document_scored_against_itself() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source.insert(doc("example-org"), repeated("Example", 10));

        let summary = run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        assert_eq!(summary.scored, vec![doc("example-org")]);
        assert_eq!(summary.vocabulary_size, 1);
        assert_eq!(summary.artifacts_written, 3);

        let tf = store.get_term_frequency(&doc("example-org")).unwrap().unwrap();
        assert_eq!(tf.get("example"), Some(10));

        let keyness = store.get_keyness(&doc("example-org")).unwrap().unwrap();
        let value = keyness.get("example").unwrap();
        assert!((value - 13.86).abs() < 0.01, "got {value}");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn disjoint_documents() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source
            .insert(doc("site-a"), repeated("alphabet", 5))
            .insert(doc("site-b"), repeated("beatnik", 5));

        run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();

        let a = store.get_keyness(&doc("site-a")).unwrap().unwrap();
        assert!(a.get("alphabet").unwrap() > 3.84);
        assert_eq!(a.get("beatnik"), None);

        let b = store.get_keyness(&doc("site-b")).unwrap().unwrap();
        assert!(b.get("beatnik").unwrap() > 3.84);
        assert_eq!(b.get("alphabet"), None);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_document_is_skipped_and_reported() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source
            .insert(doc("present"), repeated("network", 6))
            .insert_missing(doc("absent"));
        let progress = RecordingProgress::default();

        let summary = run(&source, &store, &PipelineOptions::default(), &progress).unwrap();
        assert_eq!(summary.scored, vec![doc("present")]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].doc_id, doc("absent"));
        assert_eq!(summary.skipped[0].kind, "missing-input");

        assert!(!store.exists(ArtifactKind::Normalized, &doc("absent")));
        assert!(store.exists(ArtifactKind::Keyness, &doc("present")));

        let events = progress.events.lock().unwrap();
        assert!(events.contains(&"skipped:absent:missing-input".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("done:1"));

        let manifest = store.read_manifest().unwrap().unwrap();
        assert_eq!(manifest.skipped, summary.skipped);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unreadable_document_does_not_stop_the_run() {
        let tmp = temp_dir();
        let raw = tmp.join("html");
        std::fs::create_dir_all(raw.join("broken.html")).unwrap();
        std::fs::write(raw.join("good.html"), repeated("meadow", 6)).unwrap();
        let store = ArtifactStore::open(tmp.join("results")).unwrap();
        let source = DirectorySource::with_ids(&raw, vec![doc("broken"), doc("good")]);

        let summary = run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        assert_eq!(summary.scored, vec![doc("good")]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].doc_id, doc("broken"));
        assert_eq!(summary.skipped[0].kind, "unreadable-input");
        assert!(store.get_keyness(&doc("good")).unwrap().unwrap().get("meadow").is_some());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn skipped_document_loses_artifacts_from_earlier_run() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source
            .insert(doc("stays"), repeated("harbor", 5))
            .insert(doc("leaves"), repeated("glacier", 5));
        run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        assert!(store.exists(ArtifactKind::Keyness, &doc("leaves")));

        let mut shrunk = MemorySource::new();
        shrunk
            .insert(doc("stays"), repeated("harbor", 5))
            .insert_missing(doc("leaves"));
        let summary = run(&shrunk, &store, &PipelineOptions::default(), &SilentProgress).unwrap();

        assert_eq!(summary.skipped[0].doc_id, doc("leaves"));
        for kind in ArtifactKind::ALL {
            assert!(!store.exists(kind, &doc("leaves")), "{kind} left behind");
        }
        assert!(store.exists(ArtifactKind::Keyness, &doc("stays")));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_corpus_aborts() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();

        let err = run(&MemorySource::new(), &store, &PipelineOptions::default(), &SilentProgress)
            .unwrap_err();
        assert!(matches!(err, KeynessError::EmptyCorpus));
        assert!(store.read_manifest().unwrap().is_none());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn corpus_of_short_words_is_empty() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source.insert(doc("tiny"), "<p>a bb ccc dddd</p>");

        let err = run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap_err();
        assert!(matches!(err, KeynessError::EmptyCorpus));
        // Earlier stages were still persisted before the barrier.
        assert!(store.exists(ArtifactKind::TermFrequency, &doc("tiny")));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn document_without_terms_gets_empty_keyness() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source
            .insert(doc("wordy"), repeated("campaign", 8))
            .insert(doc("images-only"), "<img src=\"a.png\"><img src=\"b.png\">");

        let summary = run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        assert_eq!(summary.scored.len(), 2);
        let empty = store.get_keyness(&doc("images-only")).unwrap().unwrap();
        assert!(empty.is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rerun_reproduces_identical_artifacts() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source
            .insert(doc("one"), "<p>Climate coalition climate summit energy</p>")
            .insert(doc("two"), "<p>Energy energy forest coalition</p>")
            .insert(doc("three"), "<p>Ocean ocean ocean summit forest</p>");

        run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        let first = store.read_manifest().unwrap().unwrap();
        run(&source, &store, &PipelineOptions::default(), &SilentProgress).unwrap();
        let second = store.read_manifest().unwrap().unwrap();

        assert_eq!(first.artifacts, second.artifacts);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn stages_persist_before_returning() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let mut source = MemorySource::new();
        source.insert(doc("page"), "<h1>Issue</h1>\n<p>Crawler   networks</p>");
        let id = doc("page");

        let normalized = normalize_document(&source, &store, &id).unwrap();
        assert_eq!(
            store.get_normalized(&id).unwrap().as_deref(),
            Some(normalized.value.as_str())
        );

        let counted = count_document(&Tokenizer::default(), &store, &id, &normalized.value).unwrap();
        assert_eq!(store.get_term_frequency(&id).unwrap().unwrap(), counted.value);
        assert_eq!(counted.value.get("issue"), Some(1));
        assert_eq!(counted.value.get("networks"), Some(1));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn directory_source_end_to_end() {
        let tmp = temp_dir();
        let raw = tmp.join("html");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("greens.html"), repeated("forest", 7)).unwrap();
        std::fs::write(raw.join("oceans.html"), repeated("whales", 7)).unwrap();
        let store = ArtifactStore::open(tmp.join("results")).unwrap();

        let summary = run(
            &DirectorySource::new(&raw),
            &store,
            &PipelineOptions::default(),
            &SilentProgress,
        )
        .unwrap();

        assert_eq!(summary.scored, vec![doc("greens"), doc("oceans")]);
        let keyness = std::fs::read_to_string(tmp.join("results/keyness/greens.tsv")).unwrap();
        assert!(keyness.starts_with("forest\t"));
        assert!(!keyness.contains("whales"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn invalid_analysis_config_is_rejected() {
        let tmp = temp_dir();
        let store = ArtifactStore::open(&tmp).unwrap();
        let options = PipelineOptions {
            analysis: AnalysisConfig {
                smoothing_floor: 0.0,
                ..AnalysisConfig::default()
            },
            ..PipelineOptions::default()
        };

        let err = run(&MemorySource::new(), &store, &options, &SilentProgress).unwrap_err();
        assert!(matches!(err, KeynessError::Config { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
