//! Lexical normalizer: case-fold, strip the flag token, collapse whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal token marking an entry as flagged.
pub const FLAG_TOKEN: &str = "sac";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalized message text plus the flag observed before stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub flag: bool,
}

/// Normalizes raw message text.
///
/// Order: lower-case, detect and remove every `FLAG_TOKEN` occurrence, trim,
/// collapse whitespace runs to one space. Never fails; empty input yields
/// empty text.
pub fn normalize(raw: &str) -> NormalizedText {
    let lowered = raw.to_lowercase();
    let flag = lowered.contains(FLAG_TOKEN);
    let stripped = lowered.replace(FLAG_TOKEN, "");
    let text = WHITESPACE_RE
        .replace_all(stripped.trim(), " ")
        .into_owned();
    NormalizedText { text, flag }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn strips_flag_token_and_collapses_whitespace() {
        let normalized = normalize("  12   B\tSAC ");
        assert_eq!(normalized.text, "12 b");
        assert!(normalized.flag);
    }

    #[test]
    fn flag_is_false_without_token() {
        let normalized = normalize("A5");
        assert_eq!(normalized.text, "a5");
        assert!(!normalized.flag);
    }

    #[test]
    fn removes_token_inside_words() {
        let normalized = normalize("a3sac");
        assert_eq!(normalized.text, "a3");
        assert!(normalized.flag);
    }

    #[test]
    fn empty_input_stays_empty() {
        let normalized = normalize("   ");
        assert!(normalized.text.is_empty());
        assert!(!normalized.flag);
    }
}
