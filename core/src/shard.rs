use crate::config::{BuildConfig, SHARD_TOKEN_CAP, SNIPPET_CHARS};
use crate::stats::AnnotatedChunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shard grouping key: one shard family per meeting per month.
///
/// `year_month` is the `YYYY-MM` prefix of the document date, or the
/// configured fallback month when the date is absent, so undated documents
/// still land in exactly one shard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub meeting: String,
    pub year_month: String,
}

impl GroupKey {
    pub fn for_chunk(chunk: &AnnotatedChunk, cfg: &BuildConfig) -> Self {
        let meta = &chunk.chunk.metadata;
        let year_month = meta
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
        Self { meeting, year_month }
    }

    /// Wire form of the key, also the shard id prefix.
    pub fn label(&self) -> String {
        format!("{}_{}", self.meeting, self.year_month)
    }
}

/// Serving-time projection of an annotated chunk: snippet text capped for
/// display, token list capped, full text kept for client-side matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightweightChunk {
    pub chunk_id: String,
    pub doc_id: String,
    /// Snippet-length prefix of the chunk text.
    pub text: String,
    pub full_text: String,
    pub tokens: Vec<String>,
    pub meeting: String,
    pub agency: String,
    pub title: String,
    pub date: Option<String>,
    pub url: String,
    pub page_from: u32,
    pub page_to: u32,
    pub char_count: usize,
    pub avg_length: f64,
    pub k1: f64,
    pub b: f64,
}

impl LightweightChunk {
    fn project(ac: &AnnotatedChunk) -> Self {
        let c = &ac.chunk;
        Self {
            chunk_id: c.chunk_id.clone(),
            doc_id: c.doc_id.clone(),
            text: c.text.chars().take(SNIPPET_CHARS).collect(),
            full_text: c.text.clone(),
            tokens: ac.tokens.iter().take(SHARD_TOKEN_CAP).cloned().collect(),
            meeting: c.metadata.meeting.clone(),
            agency: c.metadata.agency.clone(),
            title: c.metadata.title.clone(),
            date: c.metadata.date.clone(),
            url: c.metadata.url.clone(),
            page_from: c.page_from,
            page_to: c.page_to,
            char_count: c.char_count,
            avg_length: ac.avg_length,
            k1: ac.k1,
            b: ac.b,
        }
    }
}

/// One bounded, independently loadable slice of the index. Constructed once
/// per build, persisted, then dropped.
#[derive(Debug, Clone)]
pub struct Shard {
    pub shard_id: String,
    pub group: GroupKey,
    pub chunk_count: usize,
    pub chunks: Vec<LightweightChunk>,
}

/// Group annotated chunks by `(meeting, year_month)` and split each group
/// into consecutive slices of at most `shard_size` chunks.
///
/// Groups are emitted in sorted key order and arrival order is preserved
/// within a group, so repeated builds over the same input produce identical
/// shard sequences. Slice `i` of group `g` becomes shard id `"{g}_{i}"`.
pub fn partition(chunks: &[AnnotatedChunk], cfg: &BuildConfig) -> Vec<Shard> {
    let mut groups: BTreeMap<GroupKey, Vec<&AnnotatedChunk>> = BTreeMap::new();
    for chunk in chunks {
        groups.entry(GroupKey::for_chunk(chunk, cfg)).or_default().push(chunk);
    }

    let mut shards = Vec::new();
    for (key, members) in groups {
        for (i, slice) in members.chunks(cfg.shard_size).enumerate() {
            shards.push(Shard {
                shard_id: format!("{}_{}", key.label(), i),
                group: key.clone(),
                chunk_count: slice.len(),
                chunks: slice.iter().map(|ac| LightweightChunk::project(ac)).collect(),
            });
        }
    }

    tracing::debug!(num_shards = shards.len(), "partitioned chunks into shards");
    shards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use crate::document::DocMetadata;

    fn annotated(id: usize, meeting: &str, date: Option<&str>) -> AnnotatedChunk {
        let text = "予算について".to_string();
        AnnotatedChunk {
            chunk: Chunk {
                chunk_id: format!("d_{id}"),
                doc_id: "d".to_string(),
                chunk_index: id,
                char_count: text.chars().count(),
                text,
                page_from: 1,
                page_to: 1,
                position: 0,
                metadata: DocMetadata {
                    meeting: meeting.to_string(),
                    date: date.map(String::from),
                    ..Default::default()
                },
            },
            tokens: vec!["予算".to_string()],
            token_count: 1,
            avg_length: 6.0,
            k1: 1.5,
            b: 0.75,
        }
    }

    #[test]
    fn every_chunk_lands_in_exactly_one_shard() {
        let chunks: Vec<_> = (0..7).map(|i| annotated(i, "審議会", Some("2025-03-14"))).collect();
        let cfg = BuildConfig { shard_size: 3, ..Default::default() };
        let shards = partition(&chunks, &cfg);
        assert_eq!(shards.len(), 3);
        let total: usize = shards.iter().map(|s| s.chunk_count).sum();
        assert_eq!(total, 7);
        assert_eq!(shards[0].shard_id, "審議会_2025-03_0");
        assert_eq!(shards[2].chunk_count, 1);
    }

    #[test]
    fn missing_date_routes_to_fallback_month() {
        let chunks = vec![annotated(0, "審議会", None)];
        let shards = partition(&chunks, &BuildConfig::default());
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].group.year_month, "2025-01");
    }

    #[test]
    fn missing_meeting_uses_fallback_name() {
        let chunks = vec![annotated(0, "", Some("2025-02-01"))];
        let shards = partition(&chunks, &BuildConfig::default());
        assert_eq!(shards[0].group.meeting, "unknown");
        assert_eq!(shards[0].shard_id, "unknown_2025-02_0");
    }

    #[test]
    fn groups_are_sorted_and_order_preserved_within_group() {
        let chunks = vec![
            annotated(0, "乙会議", Some("2025-02-01")),
            annotated(1, "甲会議", Some("2025-01-01")),
            annotated(2, "乙会議", Some("2025-02-15")),
        ];
        let shards = partition(&chunks, &BuildConfig::default());
        assert_eq!(shards.len(), 2);
        // Sorted by (meeting, month); arrival order kept inside the group.
        let b = shards.iter().find(|s| s.group.meeting == "乙会議").unwrap();
        assert_eq!(b.chunks[0].chunk_id, "d_0");
        assert_eq!(b.chunks[1].chunk_id, "d_2");
    }
}
