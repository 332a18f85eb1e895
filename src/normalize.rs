//! Deterministic text cleaning for embedding-model training.
//!
//! Applied to raw descriptions before they are exported as a training
//! corpus for the external embedding trainer. NOT applied to scorer
//! input - the scorer works on the annotator-tagged raw text, and
//! normalizing it would break the annotation offsets.
//!
//! The transform: lower-case, strip HTML tags/entities and control
//! characters, normalize curly quotes and unicode dash variants, drop
//! digits and separator punctuation, collapse whitespace, trim trailing
//! punctuation.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<.*?>|&([a-z0-9]+|#[0-9]{1,6}|#x[0-9a-f]{1,6});").expect("Invalid HTML regex")
});
static CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x01-\x1f]").expect("Invalid control-char regex"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{201c}\u{201d}\u{2019}]").expect("Invalid quote regex"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Pd}").expect("Invalid dash regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("Invalid digit regex"));

/// Separator punctuation replaced with a space (not silently deleted, so
/// "java/python" tokenizes as two words).
const SEPARATORS: &[&str] = &["`", "\\", ",", "/", "<", ">", "+", "(", ")", ":", ";"];

/// Text normalizer for corpus preparation. Stateless; the struct exists
/// so call sites read like the rest of the pipeline.
#[derive(Debug, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut cleaned = text.to_lowercase();
        cleaned = HTML.replace_all(&cleaned, " ").into_owned();
        cleaned = CONTROL.replace_all(&cleaned, " ").into_owned();
        cleaned = WHITESPACE.replace_all(&cleaned, " ").into_owned();
        cleaned = QUOTES.replace_all(&cleaned, " ").into_owned();
        cleaned = DASHES.replace_all(&cleaned, " ").into_owned();
        cleaned = DIGITS.replace_all(&cleaned, " ").into_owned();

        cleaned = cleaned.replace(".. ", " ");
        cleaned = cleaned.replace("'s", " ");
        cleaned = cleaned.replace(". ", " ");
        for sep in SEPARATORS {
            cleaned = cleaned.replace(sep, " ");
        }

        cleaned = WHITESPACE.replace_all(&cleaned, " ").into_owned();
        cleaned
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> String {
        TextNormalizer::new().normalize(text)
    }

    #[test]
    fn test_lowercase_and_collapse() {
        assert_eq!(norm("Senior   Java\n\tDeveloper"), "senior java developer");
    }

    #[test]
    fn test_strips_digits_and_separators() {
        assert_eq!(norm("5+ years java/python (remote)"), "years java python remote");
    }

    #[test]
    fn test_strips_html() {
        assert_eq!(norm("<p>strong&nbsp;skills</p>"), "strong skills");
    }

    #[test]
    fn test_normalizes_quotes_and_dashes() {
        assert_eq!(norm("\u{201c}hands\u{2013}on\u{201d}"), "hands on");
    }

    #[test]
    fn test_trims_trailing_punctuation() {
        assert_eq!(norm("we offer benefits."), "we offer benefits");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(norm(""), "");
    }

    #[test]
    fn test_possessive_dropped() {
        assert_eq!(norm("the team's goals"), "the team goals");
    }
}
