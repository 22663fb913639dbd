use anyhow::{bail, Result};
use serde::Deserialize;

/// Characters joined between consecutive pages when concatenating a document.
/// The chunker's page boundary table accounts for its length.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// How far past the naive cut point the chunker looks for a sentence-ending
/// `。` before giving up and cutting mid-sentence.
pub const SENTENCE_LOOKAHEAD: usize = 100;

/// Snippet text stored per shard chunk is capped at this many characters.
pub const SNIPPET_CHARS: usize = 500;

/// At most this many tokens are persisted per shard chunk.
pub const SHARD_TOKEN_CAP: usize = 100;

/// Tokens per chunk counted toward monthly keyword trends.
pub const TREND_TOKEN_CAP: usize = 50;

/// Keywords retained per monthly trend file.
pub const TREND_KEYWORD_CAP: usize = 50;

/// Batch parameters for one index build.
///
/// Defaults match the documented 1200/200/50/4 values. The fallbacks for a
/// missing date or meeting are named here rather than scattered inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
    /// Maximum chunks per shard.
    pub shard_size: usize,
    /// Worker threads for per-document chunking.
    pub workers: usize,
    /// Month a chunk is grouped under when its document has no date.
    pub fallback_month: String,
    /// Meeting name used when a document has none.
    pub fallback_meeting: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            overlap: 200,
            shard_size: 50,
            workers: 4,
            fallback_month: "2025-01".to_string(),
            fallback_meeting: "unknown".to_string(),
        }
    }
}

impl BuildConfig {
    /// Reject invariant-violating values before any processing starts.
    ///
    /// `overlap >= chunk_size` would stall the chunk window and
    /// `shard_size == 0` would grow shards without bound.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be positive");
        }
        if self.overlap >= self.chunk_size {
            bail!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap,
                self.chunk_size
            );
        }
        if self.shard_size == 0 {
            bail!("shard_size must be positive");
        }
        if self.workers == 0 {
            bail!("workers must be positive");
        }
        Ok(())
    }
}
