//! Log-likelihood keyness scoring.
//!
//! For a term with corpus count `a` and document count `b`, with `C` the
//! corpus total, `D` the document total and `e = a / (C + D)`:
//!
//! ```text
//! G = a * ln(a / (C * e)) + b * ln(b / (D * e))
//! ```
//!
//! A count absent from one side is replaced by the smoothing floor so the
//! logarithm stays defined. Only terms with `G` at or above the significance
//! cutoff are reported. See <http://ucrel.lancs.ac.uk/llwizard.html>.

use tracing::{debug, warn};

use keyness_shared::{
    AnalysisConfig, CorpusFrequency, KeyTerm, KeynessError, KeynessResult, Result,
    SIGNIFICANCE_CUTOFF, SMOOTHING_FLOOR, TermFrequency,
};

/// Scores one document's terms against the corpus table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeynessScorer {
    smoothing_floor: f64,
    significance_cutoff: f64,
}

impl Default for KeynessScorer {
    fn default() -> Self {
        Self::new(SMOOTHING_FLOOR, SIGNIFICANCE_CUTOFF)
    }
}

impl From<&AnalysisConfig> for KeynessScorer {
    fn from(config: &AnalysisConfig) -> Self {
        Self::new(config.smoothing_floor, config.significance_cutoff)
    }
}

impl KeynessScorer {
    pub fn new(smoothing_floor: f64, significance_cutoff: f64) -> Self {
        Self {
            smoothing_floor,
            significance_cutoff,
        }
    }

    /// Frequency used in the formula for an optional observed count.
    pub fn smoothed(&self, count: Option<u64>) -> f64 {
        match count {
            Some(c) if c > 0 => c as f64,
            _ => self.smoothing_floor,
        }
    }

    /// Critical value of every corpus term for `document`, highest first.
    ///
    /// The sort is stable and the corpus iterates in term order, so equal
    /// values come out in lexicographic term order.
    pub fn critical_values(
        &self,
        corpus: &CorpusFrequency,
        document: &TermFrequency,
    ) -> Result<Vec<KeyTerm>> {
        ensure_scorable(corpus)?;

        let term_freq_total = document.total() as f64;
        if term_freq_total == 0.0 {
            warn!("document has no qualifying terms; nothing to score");
            return Ok(Vec::new());
        }

        let doc_freq_total = corpus.total() as f64;
        let grand_total = doc_freq_total + term_freq_total;

        let mut scored: Vec<KeyTerm> = corpus
            .iter()
            .map(|(term, corpus_count)| {
                let a = self.smoothed(Some(corpus_count));
                let b = self.smoothed(document.get(term));
                let expected_rate = corpus_count as f64 / grand_total;
                let critical_value = a * (a / (doc_freq_total * expected_rate)).ln()
                    + b * (b / (term_freq_total * expected_rate)).ln();
                KeyTerm {
                    term: term.to_string(),
                    critical_value,
                }
            })
            .collect();

        scored.sort_by(|x, y| y.critical_value.total_cmp(&x.critical_value));
        Ok(scored)
    }

    /// Significant terms of `document`: critical value at or above the cutoff.
    pub fn score(&self, corpus: &CorpusFrequency, document: &TermFrequency) -> Result<KeynessResult> {
        let all = self.critical_values(corpus, document)?;
        let scored = all.len();
        let significant: Vec<KeyTerm> = all
            .into_iter()
            .take_while(|k| k.critical_value >= self.significance_cutoff)
            .collect();

        debug!(
            scored,
            significant = significant.len(),
            cutoff = self.significance_cutoff,
            "keyness scored"
        );
        Ok(KeynessResult::from_sorted(significant))
    }
}

/// Scoring is undefined against a corpus without any counted term.
pub fn ensure_scorable(corpus: &CorpusFrequency) -> Result<()> {
    if corpus.is_empty() || corpus.total() == 0 {
        return Err(KeynessError::EmptyCorpus);
    }
    Ok(())
}
