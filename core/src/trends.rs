use crate::config::{BuildConfig, TREND_KEYWORD_CAP, TREND_TOKEN_CAP};
use crate::stats::AnnotatedChunk;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCount {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingCount {
    pub meeting: String,
    pub count: u64,
}

/// Monthly aggregate over the chunk stream: top keywords, per-meeting chunk
/// counts, and document/chunk totals. A downstream projection of the same
/// chunk list the shards are built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub keywords: Vec<KeywordCount>,
    pub meetings: Vec<MeetingCount>,
    pub doc_count: usize,
    pub chunk_count: u64,
}

struct MonthAccumulator {
    keywords: HashMap<String, u64>,
    meetings: HashMap<String, u64>,
    docs: HashSet<String>,
}

/// Fold annotated chunks into one trend record per observed month, sorted by
/// month. Undated chunks count toward the fallback month. Counter ties break
/// by name so output order is stable across runs.
pub fn build_trends(chunks: &[AnnotatedChunk], cfg: &BuildConfig) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();

    for ac in chunks {
        let meta = &ac.chunk.metadata;
        let month = meta
            .date
            .as_deref()
            .filter(|d| d.chars().count() >= 7)
            .map(|d| d.chars().take(7).collect())
            .unwrap_or_else(|| cfg.fallback_month.clone());
        let meeting = if meta.meeting.is_empty() {
            cfg.fallback_meeting.clone()
        } else {
            meta.meeting.clone()
        };

        let acc = months.entry(month).or_insert_with(|| MonthAccumulator {
            keywords: HashMap::new(),
            meetings: HashMap::new(),
            docs: HashSet::new(),
        });
        for token in ac.tokens.iter().take(TREND_TOKEN_CAP) {
            *acc.keywords.entry(token.clone()).or_insert(0) += 1;
        }
        *acc.meetings.entry(meeting).or_insert(0) += 1;
        acc.docs.insert(ac.chunk.doc_id.clone());
    }

    months
        .into_iter()
        .map(|(month, acc)| {
            let chunk_count = acc.meetings.values().sum();
            MonthlyTrend {
                month,
                keywords: top_counts(acc.keywords, TREND_KEYWORD_CAP)
                    .into_iter()
                    .map(|(term, count)| KeywordCount { term, count })
                    .collect(),
                meetings: top_counts(acc.meetings, usize::MAX)
                    .into_iter()
                    .map(|(meeting, count)| MeetingCount { meeting, count })
                    .collect(),
                doc_count: acc.docs.len(),
                chunk_count,
            }
        })
        .collect()
}

fn top_counts(counts: HashMap<String, u64>, cap: usize) -> Vec<(String, u64)> {
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(cap);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use crate::document::DocMetadata;

    fn annotated(doc_id: &str, meeting: &str, date: Option<&str>, tokens: &[&str]) -> AnnotatedChunk {
        AnnotatedChunk {
            chunk: Chunk {
                chunk_id: format!("{doc_id}_c0"),
                doc_id: doc_id.to_string(),
                chunk_index: 0,
                text: String::new(),
                page_from: 1,
                page_to: 1,
                char_count: 0,
                position: 0,
                metadata: DocMetadata {
                    meeting: meeting.to_string(),
                    date: date.map(String::from),
                    ..Default::default()
                },
            },
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            token_count: tokens.len(),
            avg_length: 1.0,
            k1: 1.5,
            b: 0.75,
        }
    }

    #[test]
    fn aggregates_per_month() {
        let chunks = vec![
            annotated("d1", "審議会", Some("2025-03-01"), &["予算", "審議"]),
            annotated("d2", "審議会", Some("2025-03-20"), &["予算"]),
            annotated("d3", "審議会", Some("2025-04-02"), &["決算"]),
        ];
        let trends = build_trends(&chunks, &BuildConfig::default());
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].month, "2025-03");
        assert_eq!(trends[0].chunk_count, 2);
        assert_eq!(trends[0].doc_count, 2);
        assert_eq!(trends[0].keywords[0].term, "予算");
        assert_eq!(trends[0].keywords[0].count, 2);
        assert_eq!(trends[1].month, "2025-04");
    }

    #[test]
    fn undated_chunks_count_toward_fallback_month() {
        let chunks = vec![annotated("d1", "審議会", None, &["予算"])];
        let trends = build_trends(&chunks, &BuildConfig::default());
        assert_eq!(trends[0].month, "2025-01");
    }
}
