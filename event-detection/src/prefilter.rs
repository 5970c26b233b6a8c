//! Pre-filter passes run before any regex/keyword matcher sees the text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTE_LINE: Regex = Regex::new(r"(?m)^\s*>.*$").unwrap();
    static ref ON_DATE_WROTE: Regex =
        Regex::new(r"(?is)\n?On .{0,80}? wrote:\s*.*$").unwrap();
    static ref FORWARDED: Regex = Regex::new(r"(?is)-{2,}\s*Forwarded message\s*-{2,}.*$").unwrap();
    static ref ORIGINAL_MESSAGE: Regex = Regex::new(r"(?is)-{2,}\s*Original Message\s*-{2,}.*$").unwrap();
}

/// Strips quoted email history (`>` quote lines, "On ... wrote:" blocks,
/// forwarded/original-message separators) so downstream regex matchers
/// never fire on the client's own prior message echoed back to them.
pub fn strip_quoted_history(body: &str) -> String {
    let mut out = ON_DATE_WROTE.replace(body, "").into_owned();
    out = FORWARDED.replace(&out, "").into_owned();
    out = ORIGINAL_MESSAGE.replace(&out, "").into_owned();
    out = QUOTE_LINE.replace_all(&out, "").into_owned();
    out.trim().to_string()
}

/// Normalizes curly/smart apostrophes to a plain `'` so keyword matches
/// like "that's fine" don't miss on a client's autocorrected quote glyph.
pub fn normalize_apostrophes(text: &str) -> String {
    text.replace(['\u{2018}', '\u{2019}', '\u{02BC}'], "'")
}

const ACKNOWLEDGMENTS: &[&str] = &[
    "thanks",
    "thank you",
    "ok noted",
    "okay noted",
    "noted",
    "got it",
    "sounds good",
    "perfect, thanks",
];

/// Short acknowledgment-only replies ("thanks", "ok noted") short-circuit
/// Q&A detection: they carry no question even if they happen to contain a
/// keyword Q&A trigger word.
pub fn is_acknowledgment_only(text: &str) -> bool {
    let normalized = normalize_apostrophes(text).trim().to_ascii_lowercase();
    let normalized = normalized.trim_end_matches(['.', '!']);
    if normalized.is_empty() {
        return false;
    }
    ACKNOWLEDGMENTS.iter().any(|ack| normalized == *ack) && !normalized.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quote_lines() {
        let body = "Sounds good.\n> previous message\n> more quoted text";
        assert_eq!(strip_quoted_history(body), "Sounds good.");
    }

    #[test]
    fn strips_on_date_wrote_block() {
        let body = "Yes please.\nOn Mon, Jan 5, 2026 Jane wrote:\n> can we book?";
        assert_eq!(strip_quoted_history(body), "Yes please.");
    }

    #[test]
    fn acknowledgment_only_matches_exact_phrase() {
        assert!(is_acknowledgment_only("Thanks!"));
        assert!(is_acknowledgment_only("ok noted."));
        assert!(!is_acknowledgment_only("Thanks, is Room B available?"));
    }

    #[test]
    fn curly_apostrophe_normalizes() {
        assert_eq!(normalize_apostrophes("that\u{2019}s fine"), "that's fine");
    }
}
