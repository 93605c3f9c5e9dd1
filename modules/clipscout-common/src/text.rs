use std::sync::OnceLock;

use regex::Regex;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"http\S+").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Normalize free text from pages and transcripts: strip URLs, collapse
/// whitespace runs to single spaces, trim.
pub fn clean_text(text: &str) -> String {
    let stripped = url_re().replace_all(text, "");
    let collapsed = whitespace_re().replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_urls_and_collapses_whitespace() {
        assert_eq!(
            clean_text("check   this https://example.com/x?y=1 \n out"),
            "check this out"
        );
    }

    #[test]
    fn empty_and_whitespace_collapse_to_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("  \t\n "), "");
    }
}
