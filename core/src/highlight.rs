use regex::Captures;
use std::collections::HashSet;

use crate::tokenizer::TOKEN_RE;

/// Wrap every token of `content` whose lowercase form is one of `terms`.
///
/// Works on the original text, so casing and punctuation survive. Only whole
/// tokens match: `fox` marks "Fox" but not "foxes".
pub fn highlight(content: &str, terms: &[String], pre: &str, post: &str) -> String {
    if terms.is_empty() {
        return content.to_string();
    }
    let wanted: HashSet<&str> = terms.iter().map(String::as_str).collect();
    TOKEN_RE
        .replace_all(content, |caps: &Captures| {
            let token = &caps[0];
            if wanted.contains(token.to_lowercase().as_str()) {
                format!("{pre}{token}{post}")
            } else {
                token.to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> { words.iter().map(|w| w.to_string()).collect() }

    #[test]
    fn marks_whole_tokens_case_insensitively() {
        let out = highlight("The Fox jumps over foxes.", &terms(&["fox"]), "**", "**");
        assert_eq!(out, "The **Fox** jumps over foxes.");
    }

    #[test]
    fn repeated_terms_do_not_double_wrap() {
        let out = highlight("quick fox", &terms(&["quick", "quick"]), "<em>", "</em>");
        assert_eq!(out, "<em>quick</em> fox");
    }
}
