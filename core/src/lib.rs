//! Shard-based full-text index builder for Japanese government-meeting
//! documents.
//!
//! The pipeline turns per-document page text into overlapping, page-attributed
//! chunks, computes corpus-wide BM25 statistics, partitions the chunks into
//! bounded shards grouped by meeting and month, and persists the shards plus a
//! self-describing manifest as static JSON a client can fetch piecemeal.

pub mod chunker;
pub mod config;
pub mod document;
pub mod persist;
pub mod shard;
pub mod stats;
pub mod tokenizer;
pub mod trends;

pub use chunker::{Chunk, Chunker};
pub use config::BuildConfig;
pub use document::{DocMetadata, Document, Page};
pub use shard::{GroupKey, LightweightChunk, Shard};
pub use stats::{AnnotatedChunk, IdfCache};
