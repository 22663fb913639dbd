use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gijiroku_core::chunker::Chunk;
use gijiroku_core::persist::{self, DocsMetaEntry, IndexPaths, MetaFile};
use gijiroku_core::stats::compute_statistics;
use gijiroku_core::trends::build_trends;
use gijiroku_core::{BuildConfig, Chunker, Document};
use parking_lot::Mutex;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gijiroku-indexer")]
#[command(about = "Build shard-based BM25 search index from extracted meeting documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the shard index from extracted document JSON files
    Build {
        /// Input path: one extracted document JSON, or a directory of them
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Target chunk length in characters
        #[arg(long, default_value_t = 1200)]
        chunk_size: usize,
        /// Characters of overlap between consecutive chunks
        #[arg(long, default_value_t = 200)]
        overlap: usize,
        /// Maximum chunks per shard
        #[arg(long, default_value_t = 50)]
        shard_size: usize,
        /// Worker threads for per-document chunking
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
}

/// Per-run outcome counts; every non-fatal failure lands here.
#[derive(Debug, Default, Serialize)]
struct BuildSummary {
    docs_total: usize,
    docs_indexed: usize,
    docs_empty: usize,
    docs_failed: usize,
    chunks_total: usize,
    shards_written: usize,
    shards_failed: usize,
    months: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, chunk_size, overlap, shard_size, workers } => {
            let cfg = BuildConfig {
                chunk_size,
                overlap,
                shard_size,
                workers,
                ..Default::default()
            };
            cfg.validate()?;
            build_index(&input, &output, &cfg)
        }
    }
}

fn build_index(input: &str, output: &str, cfg: &BuildConfig) -> Result<()> {
    let mut summary = BuildSummary::default();

    let files = collect_input_files(Path::new(input));
    let mut docs: Vec<Document> = Vec::with_capacity(files.len());
    for file in &files {
        summary.docs_total += 1;
        match load_document(file) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unreadable document");
                summary.docs_failed += 1;
            }
        }
    }

    if docs.is_empty() {
        bail!("no extracted documents found under '{input}'; run the extractor first");
    }
    let total_chars: usize = docs.iter().map(Document::total_chars).sum();
    tracing::info!(num_docs = docs.len(), total_chars, "loaded extracted documents");

    // Chunking is independent per document; fan out over a bounded pool and
    // restore arrival order afterwards so output is deterministic.
    let chunker = Chunker::from_config(cfg);
    let per_doc = chunk_documents(&docs, &chunker, cfg.workers);

    let mut docs_meta = Vec::with_capacity(docs.len());
    let mut all_chunks: Vec<Chunk> = Vec::new();
    for (doc, chunks) in docs.iter().zip(&per_doc) {
        if chunks.is_empty() {
            tracing::warn!(doc_id = %doc.doc_id, "document has no extractable text");
            summary.docs_empty += 1;
        } else {
            summary.docs_indexed += 1;
        }
        docs_meta.push(DocsMetaEntry {
            doc_id: doc.doc_id.clone(),
            meeting: doc.metadata.meeting.clone(),
            agency: doc.metadata.agency.clone(),
            title: doc.metadata.title.clone(),
            date: doc.metadata.date.clone(),
            url: doc.metadata.url.clone(),
            pages: doc.pages.len(),
            chunks_count: chunks.len(),
        });
        all_chunks.extend(chunks.iter().cloned());
    }
    summary.chunks_total = all_chunks.len();
    tracing::info!(num_chunks = all_chunks.len(), "chunked corpus");

    // Corpus-global barrier: statistics need the full chunk list.
    let (annotated, idf) = compute_statistics(all_chunks);
    tracing::info!(num_terms = idf.len(), "computed idf cache");

    let shards = gijiroku_core::shard::partition(&annotated, cfg);
    let trends = build_trends(&annotated, cfg);
    summary.months = trends.len();

    let paths = IndexPaths::new(output);
    let report = persist::write_shards(&paths, &shards, &idf)?;
    summary.shards_written = report.manifest.len();
    summary.shards_failed = report.failures.len();

    persist::save_docs_meta(&paths, &docs_meta)?;
    for trend in &trends {
        persist::save_trend(&paths, trend)?;
    }

    let meta = MetaFile {
        num_docs: docs.len(),
        num_chunks: summary.chunks_total,
        num_shards: summary.shards_written,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    persist::save_meta(&paths, &meta)?;
    save_summary(&paths.root.join("build-summary.json"), &summary)?;

    tracing::info!(
        docs_indexed = summary.docs_indexed,
        docs_empty = summary.docs_empty,
        docs_failed = summary.docs_failed,
        chunks = summary.chunks_total,
        shards = summary.shards_written,
        shards_failed = summary.shards_failed,
        months = summary.months,
        output,
        "index build complete"
    );
    Ok(())
}

fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn load_document(file: &Path) -> Result<Document> {
    let f = File::open(file).with_context(|| format!("open {}", file.display()))?;
    let doc = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {}", file.display()))?;
    Ok(doc)
}

/// Run the chunker over all documents on `workers` threads, one document per
/// unit of work, and return the chunk lists in document order.
fn chunk_documents(docs: &[Document], chunker: &Chunker, workers: usize) -> Vec<Vec<Chunk>> {
    let queue: Mutex<VecDeque<(usize, &Document)>> =
        Mutex::new(docs.iter().enumerate().collect());
    let results: Mutex<Vec<(usize, Vec<Chunk>)>> = Mutex::new(Vec::with_capacity(docs.len()));

    let pool_size = workers.min(docs.len()).max(1);
    std::thread::scope(|s| {
        for _ in 0..pool_size {
            s.spawn(|| loop {
                let job = queue.lock().pop_front();
                let Some((i, doc)) = job else { break };
                let chunks = chunker.chunk(doc);
                results.lock().push((i, chunks));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(i, _)| *i);
    results.into_iter().map(|(_, chunks)| chunks).collect()
}

fn save_summary(path: &Path, summary: &BuildSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}
