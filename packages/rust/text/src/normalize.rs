//! Markup-to-plain-text normalization passes.
//!
//! Each pass is a function `&str -> String` applied in sequence.
//! Embedded style and script blocks go first so their bodies never reach
//! the tag stripper.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full normalization pipeline on raw markup.
pub(crate) fn run_pipeline(markup: &str) -> String {
    let mut result = remove_style_blocks(markup);

    result = remove_script_blocks(&result);
    result = remove_comments(&result);
    result = strip_tags(&result);
    result = collapse_whitespace(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Remove <style> blocks
// ---------------------------------------------------------------------------

/// Drop `<style>` elements together with their CSS body.
fn remove_style_blocks(markup: &str) -> String {
    static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex")
    });

    STYLE_RE.replace_all(markup, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Remove <script> blocks
// ---------------------------------------------------------------------------

/// Drop `<script>` elements together with their body.
fn remove_script_blocks(markup: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex")
    });

    SCRIPT_RE.replace_all(markup, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Remove comments
// ---------------------------------------------------------------------------

/// Drop `<!-- ... -->` comments, including conditional comments.
fn remove_comments(markup: &str) -> String {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

    COMMENT_RE.replace_all(markup, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Strip remaining tags
// ---------------------------------------------------------------------------

/// Remove every remaining tag, doctype and processing instruction.
///
/// Tags are replaced by a space so adjacent block contents do not fuse into
/// one token. A `<` not followed by a tag-name character is text and stays.
fn strip_tags(markup: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?[A-Za-z!?][^>]*>").expect("valid regex"));

    TAG_RE.replace_all(markup, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 5: Collapse whitespace
// ---------------------------------------------------------------------------

/// Replace every maximal whitespace run with a single space.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
