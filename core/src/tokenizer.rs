use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    pub(crate) static ref TOKEN_RE: Regex = Regex::new(r"\w+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at",
            "be","by",
            "for","from",
            "has","he",
            "in","is","it","its",
            "of","on",
            "that","the","to",
            "was","were","will","with",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Split text into maximal runs of letters, digits and underscore, keeping original casing.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Lowercase every token. Output is position-aligned with the input.
pub fn normalize(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().map(|t| t.to_lowercase()).collect()
}

/// Drop stopwords. Positions are not preserved: removed tokens vanish from the sequence.
pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().filter(|t| !is_stopword(t)).collect()
}

/// The tokenize -> normalize -> stopword pipeline shared by indexing and querying.
pub fn analyze(text: &str) -> Vec<String> {
    remove_stopwords(normalize(tokenize(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Hello, world_wide 42!");
        assert_eq!(t, vec!["Hello", "world_wide", "42"]);
    }

    #[test]
    fn normalize_keeps_alignment() {
        let t = normalize(vec!["The".into(), "QUICK".into(), "fox".into()]);
        assert_eq!(t, vec!["the", "quick", "fox"]);
    }

    #[test]
    fn stopwords_are_case_sensitive_after_normalization() {
        let t = remove_stopwords(vec!["The".into(), "the".into(), "fox".into()]);
        assert_eq!(t, vec!["The", "fox"]);
    }
}
