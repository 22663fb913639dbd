use crate::config::{BuildConfig, PAGE_SEPARATOR, SENTENCE_LOOKAHEAD};
use crate::document::{DocMetadata, Document};
use serde::{Deserialize, Serialize};

/// One overlapping, page-attributed slice of a document's concatenated text.
///
/// Invariants held at construction: `page_from <= page_to`, both inside the
/// owning document's page range, `text` is a trimmed contiguous substring of
/// the concatenated page text starting at char offset `position`, and
/// `chunk_index` is dense 0-based emission order. Never mutated after
/// statistics annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub doc_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub page_from: u32,
    pub page_to: u32,
    /// Character count of the trimmed chunk text.
    pub char_count: usize,
    /// Char offset of the window start in the concatenated document text.
    pub position: usize,
    #[serde(flatten)]
    pub metadata: DocMetadata,
}

/// Char-offset range `[start, end)` of one page inside the concatenated text.
#[derive(Debug, Clone, Copy)]
struct PageBoundary {
    number: u32,
    start: usize,
    end: usize,
}

/// Splits a document's page sequence into overlapping chunks whose ends snap
/// to Japanese sentence boundaries.
///
/// All offsets are measured in characters, never bytes, so multi-byte
/// Japanese text can never split a UTF-8 sequence.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    pub fn from_config(cfg: &BuildConfig) -> Self {
        Self::new(cfg.chunk_size, cfg.overlap)
    }

    /// Chunk a document. Never fails: a document with no extractable text
    /// yields an empty list and the caller records it in the build summary.
    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        let (full, boundaries) = concat_pages(doc);
        if full.is_empty() {
            return Vec::new();
        }

        let len = full.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut chunk_index = 0usize;

        while start < len {
            let mut end = start + self.chunk_size;

            // Snap to the last 。 within the lookahead window so chunks end
            // on sentence boundaries. Only when the naive end falls strictly
            // inside the text; the final window keeps its arithmetic end.
            if end < len {
                let hi = (end + SENTENCE_LOOKAHEAD).min(len);
                if let Some(rel) = full[start..hi].iter().rposition(|&c| c == '。') {
                    let abs = start + rel;
                    if abs > start {
                        end = abs + 1;
                    }
                }
            }

            let text: String = full[start..end.min(len)].iter().collect();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                let (page_from, page_to) = page_range(&boundaries, start, end);
                chunks.push(Chunk {
                    chunk_id: format!("{}_c{}", doc.doc_id, chunk_index),
                    doc_id: doc.doc_id.clone(),
                    chunk_index,
                    text: trimmed.to_string(),
                    page_from,
                    page_to,
                    char_count: trimmed.chars().count(),
                    position: start,
                    metadata: doc.metadata.clone(),
                });
                chunk_index += 1;
            }

            // Overlap the next window with this one, but always move forward
            // at least one char so a bad overlap/chunk_size pair cannot stall
            // the loop.
            let next = end.saturating_sub(self.overlap);
            start = if next > start { next } else { start + 1 };
        }

        chunks
    }
}

/// Join page texts with the fixed separator and record each page's char
/// range in the joined text.
fn concat_pages(doc: &Document) -> (Vec<char>, Vec<PageBoundary>) {
    let sep: Vec<char> = PAGE_SEPARATOR.chars().collect();
    let mut full = Vec::new();
    let mut boundaries = Vec::with_capacity(doc.pages.len());

    for (i, page) in doc.pages.iter().enumerate() {
        if i > 0 {
            full.extend_from_slice(&sep);
        }
        let start = full.len();
        full.extend(page.text.chars());
        boundaries.push(PageBoundary { number: page.number, start, end: full.len() });
    }

    (full, boundaries)
}

/// Map a chunk's char window to the page range it occupies.
///
/// A start inside a page separator attributes to the following page and an
/// end inside a separator (or at exactly the total length) to the preceding
/// one, so page ranges stay monotone across the chunk sequence. Out-of-range
/// offsets clamp to the first/last page.
fn page_range(boundaries: &[PageBoundary], start: usize, end: usize) -> (u32, u32) {
    let page_from = boundaries
        .iter()
        .find(|b| b.end > start)
        .or_else(|| boundaries.last())
        .map_or(1, |b| b.number);
    let page_to = boundaries
        .iter()
        .rev()
        .find(|b| b.start < end)
        .or_else(|| boundaries.first())
        .map_or(1, |b| b.number);
    (page_from, page_to)
}
