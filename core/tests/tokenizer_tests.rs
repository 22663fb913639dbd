use gijiroku_core::tokenizer::tokenize;

#[test]
fn it_extracts_japanese_word_candidates() {
    let toks = tokenize("予算委員会を開催した");
    // Greedy 2-4 char runs plus bigrams over the same text.
    assert!(toks.contains(&"予算委員".to_string()));
    assert!(toks.contains(&"予算".to_string()));
    assert!(toks.contains(&"委員".to_string()));
    assert!(toks.contains(&"開催".to_string()));
}

#[test]
fn long_runs_split_at_four_chars() {
    let toks = tokenize("一二三四五六");
    assert!(toks.contains(&"一二三四".to_string()));
    assert!(toks.contains(&"五六".to_string()));
}

#[test]
fn it_lowercases_alphanumerics() {
    let toks = tokenize("GDP成長率は2025年に向上");
    assert!(toks.contains(&"gdp".to_string()));
    assert!(toks.contains(&"2025".to_string()));
    assert!(toks.contains(&"成長".to_string()));
    assert!(!toks.contains(&"GDP".to_string()));
}

#[test]
fn bigrams_catch_compounds_across_punctuation() {
    // The middle dot splits the word-candidate runs; after cleaning, the
    // bigram pass still bridges the two halves.
    let toks = tokenize("行政・改革");
    assert!(toks.contains(&"行政".to_string()));
    assert!(toks.contains(&"改革".to_string()));
    assert!(toks.contains(&"政改".to_string()));
}

#[test]
fn katakana_and_prolonged_mark() {
    let toks = tokenize("デジタル庁のデータ");
    assert!(toks.contains(&"デジタル".to_string()));
    assert!(toks.contains(&"ル庁".to_string()));
    assert!(toks.contains(&"デー".to_string()));
}

#[test]
fn it_drops_single_char_tokens() {
    let toks = tokenize("A b 9 あ");
    assert!(toks.is_empty());
}

#[test]
fn it_deduplicates_preserving_first_seen_order() {
    let toks = tokenize("Tokyo TOKYO tokyo");
    assert_eq!(toks, vec!["tokyo".to_string()]);
}

#[test]
fn empty_text_yields_no_tokens() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \n\t ").is_empty());
}
