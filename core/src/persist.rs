use crate::shard::{LightweightChunk, Shard};
use crate::stats::IdfCache;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Build-level metadata written next to the shard directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_chunks: usize,
    pub num_shards: usize,
    pub created_at: String,
    pub version: u32,
}

/// Manifest entry a client reads first to decide which shard files to fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub shard_id: String,
    pub filename: String,
    pub group: String,
    pub chunk_count: usize,
}

/// One `docs-meta.json` entry per source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsMetaEntry {
    pub doc_id: String,
    pub meeting: String,
    pub agency: String,
    pub title: String,
    pub date: Option<String>,
    pub url: String,
    pub pages: usize,
    pub chunks_count: usize,
}

/// Serialized shard artifact. The IDF cache is logically shared across all
/// shards; repeating it per shard file is an accepted space/simplicity
/// tradeoff so each shard stays independently loadable.
#[derive(Serialize)]
struct ShardFileView<'a> {
    shard_id: &'a str,
    group: String,
    chunk_count: usize,
    chunks: &'a [LightweightChunk],
    idf: &'a IdfCache,
}

/// Owned counterpart of a shard artifact, for shard consumers and tests.
#[derive(Debug, Deserialize)]
pub struct ShardFile {
    pub shard_id: String,
    pub group: String,
    pub chunk_count: usize,
    pub chunks: Vec<LightweightChunk>,
    pub idf: IdfCache,
}

/// A shard whose write failed; recorded in the build summary, never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct ShardFailure {
    pub shard_id: String,
    pub error: String,
}

/// Outcome of persisting all shards: confirmed manifest entries plus the
/// per-shard failures that were isolated.
#[derive(Debug)]
pub struct WriteReport {
    pub manifest: Vec<ManifestEntry>,
    pub failures: Vec<ShardFailure>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn shards_dir(&self) -> PathBuf { self.root.join("shards") }
    pub fn trends_dir(&self) -> PathBuf { self.root.join("trends") }
    fn shard_file(&self, filename: &str) -> PathBuf { self.shards_dir().join(filename) }
    fn manifest(&self) -> PathBuf { self.shards_dir().join("_index.json") }
    fn idf(&self) -> PathBuf { self.shards_dir().join("_idf.json") }
    fn docs_meta(&self) -> PathBuf { self.root.join("docs-meta.json") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn read_to_string(path: &Path) -> Result<String> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(buf)
}

/// Write one shard as a compact, self-contained JSON artifact and return its
/// manifest entry.
pub fn save_shard(paths: &IndexPaths, shard: &Shard, idf: &IdfCache) -> Result<ManifestEntry> {
    create_dir_all(paths.shards_dir())?;
    let filename = format!("{}.json", shard.shard_id);
    let view = ShardFileView {
        shard_id: &shard.shard_id,
        group: shard.group.label(),
        chunk_count: shard.chunk_count,
        chunks: &shard.chunks,
        idf,
    };
    let json = serde_json::to_string(&view)?;
    let mut f = File::create(paths.shard_file(&filename))?;
    f.write_all(json.as_bytes())?;
    Ok(ManifestEntry {
        shard_id: shard.shard_id.clone(),
        filename,
        group: shard.group.label(),
        chunk_count: shard.chunk_count,
    })
}

/// Persist every shard, then the manifest and the standalone IDF artifact.
///
/// Each shard is its own unit of persistence: a failed write is logged and
/// recorded, and the manifest only lists shards that were confirmed on disk.
pub fn write_shards(paths: &IndexPaths, shards: &[Shard], idf: &IdfCache) -> Result<WriteReport> {
    let mut manifest = Vec::with_capacity(shards.len());
    let mut failures = Vec::new();

    for shard in shards {
        match save_shard(paths, shard, idf) {
            Ok(entry) => {
                tracing::debug!(shard_id = %entry.shard_id, chunk_count = entry.chunk_count, "saved shard");
                manifest.push(entry);
            }
            Err(e) => {
                tracing::warn!(shard_id = %shard.shard_id, error = %e, "shard write failed");
                failures.push(ShardFailure { shard_id: shard.shard_id.clone(), error: e.to_string() });
            }
        }
    }

    save_manifest(paths, &manifest)?;
    save_idf(paths, idf)?;
    Ok(WriteReport { manifest, failures })
}

pub fn save_manifest(paths: &IndexPaths, entries: &[ManifestEntry]) -> Result<()> {
    create_dir_all(paths.shards_dir())?;
    let json = serde_json::to_string_pretty(entries)?;
    let mut f = File::create(paths.manifest())?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_manifest(paths: &IndexPaths) -> Result<Vec<ManifestEntry>> {
    let entries = serde_json::from_str(&read_to_string(&paths.manifest())?)?;
    Ok(entries)
}

pub fn load_shard(paths: &IndexPaths, filename: &str) -> Result<ShardFile> {
    let shard = serde_json::from_str(&read_to_string(&paths.shard_file(filename))?)?;
    Ok(shard)
}

/// The IDF cache as a standalone artifact, for clients that fetch it once
/// instead of repeating it per shard.
pub fn save_idf(paths: &IndexPaths, idf: &IdfCache) -> Result<()> {
    create_dir_all(paths.shards_dir())?;
    let json = serde_json::to_string(idf)?;
    let mut f = File::create(paths.idf())?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_idf(paths: &IndexPaths) -> Result<IdfCache> {
    let idf = serde_json::from_str(&read_to_string(&paths.idf())?)?;
    Ok(idf)
}

pub fn save_docs_meta(paths: &IndexPaths, entries: &[DocsMetaEntry]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(entries)?;
    let mut f = File::create(paths.docs_meta())?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_docs_meta(paths: &IndexPaths) -> Result<Vec<DocsMetaEntry>> {
    let entries = serde_json::from_str(&read_to_string(&paths.docs_meta())?)?;
    Ok(entries)
}

pub fn save_trend(paths: &IndexPaths, trend: &crate::trends::MonthlyTrend) -> Result<()> {
    create_dir_all(paths.trends_dir())?;
    let json = serde_json::to_string_pretty(trend)?;
    let file = paths.trends_dir().join(format!("{}.json", trend.month));
    let mut f = File::create(file)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    let mut f = File::create(paths.meta())?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let meta = serde_json::from_str(&read_to_string(&paths.meta())?)?;
    Ok(meta)
}
