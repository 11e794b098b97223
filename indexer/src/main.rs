use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fts_core::{Document, EngineConfig, Metadata, MetadataValue, SearchEngine, SearchOptions};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(alias = "body")]
    content: String,
    timestamp: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

impl InputDoc {
    fn into_document(self) -> Result<Document> {
        let mut doc = Document::new(self.id, self.content);
        doc.metadata = self.metadata;
        if let Some(ts) = self.timestamp {
            let parsed = OffsetDateTime::parse(&ts, &Rfc3339)
                .with_context(|| format!("invalid timestamp {ts:?} for document {}", doc.id))?;
            doc = doc.with_timestamp(parsed);
        }
        Ok(doc)
    }
}

#[derive(Parser)]
#[command(name = "fts")]
#[command(about = "Build and query an in-memory full-text index snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index JSON/JSONL documents from a file or directory and write a snapshot
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output snapshot file
        #[arg(long)]
        output: String,
    },
    /// Run a query against a snapshot
    Search {
        /// Snapshot file
        #[arg(long)]
        index: String,
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Mark matched terms in returned content
        #[arg(long, default_value_t = false)]
        highlight: bool,
        /// Metadata filter, key=value; repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Highlight opening marker
        #[arg(long, default_value = "**")]
        pre: String,
        /// Highlight closing marker
        #[arg(long, default_value = "**")]
        post: String,
    },
    /// List indexed terms starting with a prefix
    Suggest {
        #[arg(long)]
        index: String,
        prefix: String,
        /// 0 means no limit
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print document and term counts
    Stats {
        #[arg(long)]
        index: String,
    },
    /// Rebuild postings from stored documents and rewrite the snapshot
    Reindex {
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => {
            let engine = SearchEngine::new();
            build_index(&engine, Path::new(&input))?;
            write_snapshot(&engine, Path::new(&output))?;
            let stats = engine.stats();
            tracing::info!(output = %output, documents = stats.total_documents, terms = stats.total_terms, "index build complete");
        }
        Commands::Search { index, query, limit, offset, highlight, filters, pre, post } => {
            let config = EngineConfig { highlight_pre: pre, highlight_post: post, ..Default::default() };
            let engine = load_snapshot(SearchEngine::with_config(config), Path::new(&index))?;
            let opts = SearchOptions { limit, offset, highlight };
            let result = if filters.is_empty() {
                engine.search(&query, &opts)
            } else {
                let filters: Metadata = filters.into_iter().map(|(k, v)| (k, MetadataValue::String(v))).collect();
                engine.advanced_search(&query, &filters, &opts)
            };
            tracing::info!(total = result.total, took_s = result.took.as_secs_f64(), "query complete");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Suggest { index, prefix, limit } => {
            let engine = load_snapshot(SearchEngine::new(), Path::new(&index))?;
            println!("{}", serde_json::to_string_pretty(&engine.suggest(&prefix, limit))?);
        }
        Commands::Stats { index } => {
            let engine = load_snapshot(SearchEngine::new(), Path::new(&index))?;
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
        }
        Commands::Reindex { index } => {
            let path = Path::new(&index);
            let engine = load_snapshot(SearchEngine::new(), path)?;
            engine.reindex();
            write_snapshot(&engine, path)?;
        }
    }
    Ok(())
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn load_snapshot(engine: SearchEngine, path: &Path) -> Result<SearchEngine> {
    let data = fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    engine.import_index(&data).with_context(|| format!("loading snapshot {}", path.display()))?;
    Ok(engine)
}

fn write_snapshot(engine: &SearchEngine, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = engine.export_index()?;
    fs::write(path, bytes).with_context(|| format!("writing snapshot {}", path.display()))?;
    Ok(())
}

fn build_index(engine: &SearchEngine, input_path: &Path) -> Result<usize> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        return Err(anyhow!("input path {} does not exist", input_path.display()));
    }

    let mut count = 0;
    for file in files {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        tracing::debug!(file = %file.display(), docs = docs.len(), "read input file");
        for doc in docs {
            engine.index_document(doc.into_document()?);
            count += 1;
        }
    }
    tracing::info!(count, "ingested documents");
    Ok(count)
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(Vec::new()),
    }
}
