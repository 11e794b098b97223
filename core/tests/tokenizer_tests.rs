use fts_core::tokenizer::{analyze, remove_stopwords, tokenize};

#[test]
fn it_splits_on_non_word_characters() {
    let toks = tokenize("Running, runner's run! snake_case x2");
    assert_eq!(toks, vec!["Running", "runner", "s", "run", "snake_case", "x2"]);
}

#[test]
fn it_handles_empty_and_punctuation_only_input() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("...---!!!").is_empty());
}

#[test]
fn it_filters_stopwords() {
    let words = analyze("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_drops_stopwords_without_leaving_gaps() {
    let filtered = remove_stopwords(vec!["a".into(), "b".into(), "is".into(), "c".into()]);
    assert_eq!(filtered, vec!["b", "c"]);
}

#[test]
fn it_lowercases_unicode_words() {
    assert_eq!(analyze("Café ÜBER"), vec!["café", "über"]);
}
