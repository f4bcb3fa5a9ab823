//! Tab-separated record codec for frequency and keyness artifacts.
//!
//! One `term\tvalue` record per line, no header. Tab, newline, carriage
//! return and backslash inside a term are backslash-escaped so every record
//! stays on one line and decodes back to the same term.

use keyness_shared::{KeyTerm, KeynessError, KeynessResult, Result, TermFrequency};

/// Encode a term-frequency table, most frequent term first.
pub fn encode_term_frequency(tf: &TermFrequency) -> String {
    let mut out = String::new();
    for (term, count) in tf.by_descending_count() {
        push_record(&mut out, term, &count.to_string());
    }
    out
}

/// Decode a term-frequency artifact. Duplicate terms are rejected.
pub fn decode_term_frequency(content: &str) -> Result<TermFrequency> {
    let mut tf = TermFrequency::new();
    for (line_no, line) in records(content) {
        let (term, value) = split_record(line, line_no)?;
        let count: u64 = value.parse().map_err(|e| {
            KeynessError::parse(format!("line {line_no}: invalid count '{value}': {e}"))
        })?;
        if count == 0 {
            return Err(KeynessError::parse(format!("line {line_no}: zero count for '{term}'")));
        }
        if tf.contains(&term) {
            return Err(KeynessError::parse(format!("line {line_no}: duplicate term '{term}'")));
        }
        tf.add(term, count);
    }
    Ok(tf)
}

/// Encode a keyness result in its existing (descending) order.
pub fn encode_keyness(result: &KeynessResult) -> String {
    let mut out = String::new();
    for key in result.terms() {
        push_record(&mut out, &key.term, &key.critical_value.to_string());
    }
    out
}

/// Decode a keyness artifact, preserving record order.
pub fn decode_keyness(content: &str) -> Result<KeynessResult> {
    let mut terms = Vec::new();
    for (line_no, line) in records(content) {
        let (term, value) = split_record(line, line_no)?;
        let critical_value: f64 = value.parse().map_err(|e| {
            KeynessError::parse(format!("line {line_no}: invalid critical value '{value}': {e}"))
        })?;
        if !critical_value.is_finite() {
            return Err(KeynessError::parse(format!(
                "line {line_no}: non-finite critical value for '{term}'"
            )));
        }
        terms.push(KeyTerm {
            term,
            critical_value,
        });
    }
    Ok(KeynessResult::from_sorted(terms))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn push_record(out: &mut String, term: &str, value: &str) {
    out.push_str(&escape(term));
    out.push('\t');
    out.push_str(value);
    out.push('\n');
}

/// Non-empty lines with their 1-based line numbers.
fn records(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| (i + 1, line))
}

fn split_record(line: &str, line_no: usize) -> Result<(String, &str)> {
    let (raw_term, value) = line
        .split_once('\t')
        .ok_or_else(|| KeynessError::parse(format!("line {line_no}: missing tab separator")))?;
    if value.contains('\t') {
        return Err(KeynessError::parse(format!("line {line_no}: too many columns")));
    }
    Ok((unescape(raw_term, line_no)?, value))
}

fn escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str, line_no: usize) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            other => {
                return Err(KeynessError::parse(format!(
                    "line {line_no}: invalid escape '\\{}'",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}
