//! Whitespace tokenizer and per-document frequency counting.

use scraper::Html;

use keyness_shared::{MIN_TERM_CHARS, TermFrequency};

/// Splits normalized text into case-folded terms and counts them.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    min_term_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(MIN_TERM_CHARS)
    }
}

impl Tokenizer {
    /// Tokenizer keeping terms of at least `min_term_chars` characters.
    pub fn new(min_term_chars: usize) -> Self {
        Self { min_term_chars }
    }

    /// Qualifying terms of `text`, in order of appearance.
    pub fn terms<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let min = self.min_term_chars;
        text.split_whitespace().filter_map(move |candidate| {
            let decoded = decode_entities(candidate);
            let trimmed = decoded.trim();
            (trimmed.chars().count() >= min).then(|| trimmed.to_lowercase())
        })
    }

    /// Count every qualifying term of `text`.
    pub fn frequencies(&self, text: &str) -> TermFrequency {
        let mut tf = TermFrequency::new();
        for term in self.terms(text) {
            tf.increment(term);
        }
        tf
    }
}

/// Decode HTML character references (`&amp;`, `&#8217;`, `&eacute;` ...).
///
/// Tokens without an ampersand are returned as-is. A literal `<` is escaped
/// before parsing so the HTML tokenizer cannot mistake it for a tag opener.
fn decode_entities(token: &str) -> String {
    if !token.contains('&') {
        return token.to_string();
    }

    let escaped = token.replace('<', "&lt;");
    let fragment = Html::parse_fragment(&escaped);
    fragment.root_element().text().collect()
}
