//! Markup normalization and term counting.
//!
//! [`normalize`] turns a raw HTML page into whitespace-collapsed plain text.
//! [`Tokenizer`] splits that text into case-folded terms and builds the
//! document's [`TermFrequency`](keyness_shared::TermFrequency) table.

mod normalize;
mod tokenize;

use tracing::{debug, instrument};

pub use tokenize::Tokenizer;

/// Convert raw markup to plain text.
///
/// Style and script blocks are removed with their content, then every
/// remaining tag, and finally each run of whitespace becomes one space.
/// The function is pure: identical input always yields identical output.
#[instrument(skip(markup), fields(raw_len = markup.len()))]
pub fn normalize(markup: &str) -> String {
    let text = normalize::run_pipeline(markup);
    debug!(text_len = text.len(), "normalization complete");
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    #[test]
    fn normalize_homepage_fixture() {
        let html = load_fixture("html/homepage.html");
        let text = normalize(&html);

        assert!(text.contains("Climate Action Network"));
        assert!(!text.contains("font-family"));
        assert!(!text.contains("trackVisit"));
        assert!(!text.contains("newsletter signup form"));
        assert!(!text.contains('<'));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn fixture_frequencies() {
        let text = normalize(&load_fixture("html/homepage.html"));
        let tf = Tokenizer::default().frequencies(&text);

        assert_eq!(tf.get("climate"), Some(4));
        assert_eq!(tf.get("coalition"), Some(2));
        assert_eq!(tf.get("o\u{2019}brien"), Some(1));
        assert!(tf.get("trackvisit();").is_none());
    }

    #[test]
    fn normalize_and_count_are_idempotent() {
        let html = load_fixture("html/homepage.html");
        let tok = Tokenizer::default();

        let first_text = normalize(&html);
        let second_text = normalize(&html);
        assert_eq!(first_text, second_text);

        assert_eq!(tok.frequencies(&first_text), tok.frequencies(&second_text));
    }
}
