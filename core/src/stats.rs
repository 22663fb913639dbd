use crate::chunker::Chunk;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// BM25 term-saturation parameter attached to every annotated chunk.
pub const K1: f64 = 1.5;
/// BM25 length-normalization parameter attached to every annotated chunk.
pub const B: f64 = 0.75;

/// Corpus-wide token → IDF mapping, computed once per build and read-only
/// afterwards. Keys are sorted so serialization is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdfCache(BTreeMap<String, f64>);

impl IdfCache {
    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

/// A chunk annotated with its token set and the corpus statistics a
/// downstream scorer needs to compute BM25 without re-reading the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Token set in first-seen order; presence only, no frequencies.
    pub tokens: Vec<String>,
    pub token_count: usize,
    /// Mean chunk `char_count` over the whole corpus.
    pub avg_length: f64,
    pub k1: f64,
    pub b: f64,
}

/// Tokenize every chunk and compute corpus-global Okapi BM25 statistics.
///
/// A pure reduction over the finished chunk list: per-chunk token sets are
/// collected first, then folded into document-frequency counts in one
/// single-threaded pass. An empty corpus returns an empty cache and an
/// `avg_length` of 1.0 rather than failing.
pub fn compute_statistics(chunks: Vec<Chunk>) -> (Vec<AnnotatedChunk>, IdfCache) {
    let total = chunks.len();
    let avg_length = if total == 0 {
        1.0
    } else {
        chunks.iter().map(|c| c.char_count as f64).sum::<f64>() / total as f64
    };

    let annotated: Vec<AnnotatedChunk> = chunks
        .into_iter()
        .map(|chunk| {
            let tokens = tokenize(&chunk.text);
            let token_count = tokens.len();
            AnnotatedChunk { chunk, tokens, token_count, avg_length, k1: K1, b: B }
        })
        .collect();

    // df(t) counts chunks containing t; token lists are already deduplicated
    // per chunk, so each chunk contributes at most one to any token's count.
    let mut doc_freq: HashMap<&str, u32> = HashMap::new();
    for ac in &annotated {
        for token in &ac.tokens {
            *doc_freq.entry(token.as_str()).or_insert(0) += 1;
        }
    }

    let n = total as f64;
    let idf = IdfCache(
        doc_freq
            .into_iter()
            .map(|(token, df)| {
                let df = f64::from(df);
                // Okapi BM25 IDF with +1 smoothing: non-negative even for
                // terms present in every chunk.
                let value = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                (token.to_string(), value)
            })
            .collect(),
    );

    tracing::debug!(
        num_chunks = total,
        num_terms = idf.len(),
        avg_length,
        "computed corpus statistics"
    );

    (annotated, idf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocMetadata;

    fn chunk(id: usize, text: &str) -> Chunk {
        Chunk {
            chunk_id: format!("d1_c{id}"),
            doc_id: "d1".to_string(),
            chunk_index: id,
            text: text.to_string(),
            page_from: 1,
            page_to: 1,
            char_count: text.chars().count(),
            position: 0,
            metadata: DocMetadata::default(),
        }
    }

    #[test]
    fn empty_corpus_defaults() {
        let (annotated, idf) = compute_statistics(Vec::new());
        assert!(annotated.is_empty());
        assert!(idf.is_empty());
    }

    #[test]
    fn avg_length_is_mean_char_count() {
        let (annotated, _) = compute_statistics(vec![chunk(0, "予算案"), chunk(1, "予算審議会")]);
        assert!((annotated[0].avg_length - 4.0).abs() < 1e-12);
        assert_eq!(annotated[0].k1, 1.5);
        assert_eq!(annotated[0].b, 0.75);
    }

    #[test]
    fn ubiquitous_token_keeps_small_positive_idf() {
        let (_, idf) = compute_statistics(vec![chunk(0, "予算"), chunk(1, "予算")]);
        // df == N == 2: ln((2 - 2 + 0.5)/(2 + 0.5) + 1) = ln(1.2)
        let got = idf.get("予算").unwrap();
        assert!((got - 1.2f64.ln()).abs() < 1e-12);
        assert!(got > 0.0);
    }
}
