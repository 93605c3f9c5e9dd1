//! Eligibility gate: only texts with actual semantic content reach the
//! model. Everything else gets the fixed empty score without a forward pass.

use std::sync::OnceLock;

use regex::Regex;

/// Literal tokens that mean "no value" rather than content.
const NULL_TOKENS: &[&str] = &["none", "null", "nan"];

/// Minimum trimmed length, in characters.
const MIN_LEN: usize = 5;

fn symbols_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // non-word chars, digits, underscores: emoji/punctuation/number soup
    RE.get_or_init(|| Regex::new(r"^[\W\d_]+$").expect("valid regex"))
}

/// Whether a text is worth a model forward pass.
pub fn is_meaningful_text(text: &str) -> bool {
    let s = text.trim();

    if s.is_empty() {
        return false;
    }
    if NULL_TOKENS.contains(&s.to_lowercase().as_str()) {
        return false;
    }
    if symbols_only_re().is_match(s) {
        return false;
    }
    if s.chars().count() < MIN_LEN {
        return false;
    }
    true
}
