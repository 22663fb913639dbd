use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    // Greedy 2-4 char runs of hiragana, katakana, the prolonged sound mark,
    // or CJK ideographs. Approximates word extraction for unsegmented text.
    static ref JP_WORD: Regex = Regex::new(r"[ぁ-んァ-ヶー一-龯]{2,4}").expect("valid regex");
    static ref ASCII_ALNUM: Regex = Regex::new(r"[A-Za-z0-9]+").expect("valid regex");
}

fn is_japanese(c: char) -> bool {
    matches!(c, 'ぁ'..='ん' | 'ァ'..='ヶ' | 'ー' | '一'..='龯')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn push_token(token: String, seen: &mut HashSet<String>, out: &mut Vec<String>) {
    if token.chars().count() < 2 {
        return;
    }
    if seen.insert(token.clone()) {
        out.push(token);
    }
}

/// Tokenize text into lowercase index terms: 2-4 char Japanese word
/// candidates, Japanese-led bigrams over the cleaned text, and ASCII
/// alphanumeric runs.
///
/// Returns set semantics: each term appears once, in first-seen order, so
/// serialized token lists are deterministic. Term frequency within a chunk is
/// deliberately not tracked. No stemming and no real morphological
/// segmentation; the n-gram scheme trades precision for robustness on
/// unsegmented Japanese.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for mat in JP_WORD.find_iter(text) {
        push_token(mat.as_str().to_lowercase(), &mut seen, &mut tokens);
    }

    // Dense bigram pass: strip everything that is neither a word char nor
    // Japanese script, then keep every 2-char window led by a Japanese char.
    // Catches compounds the greedy word pass splits apart.
    let cleaned: Vec<char> = text
        .chars()
        .filter(|&c| is_word_char(c) || is_japanese(c))
        .collect();
    for window in cleaned.windows(2) {
        if is_japanese(window[0]) {
            let bigram: String = window.iter().collect();
            push_token(bigram.to_lowercase(), &mut seen, &mut tokens);
        }
    }

    for mat in ASCII_ALNUM.find_iter(text) {
        push_token(mat.as_str().to_lowercase(), &mut seen, &mut tokens);
    }

    tokens
}
