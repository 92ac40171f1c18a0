use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ircore::collection::{CollectionStats, PipelineStats};
use ircore::config::{RetrievalConfig, StopwordSetting, MAX_TOP_K, SNAPSHOT_VERSION};
use ircore::evaluation::evaluate_queries;
use ircore::persist::{
    load_config, load_docs, load_ground_truth, load_index, load_meta, load_stopwords, resolve_stopwords, save_docs,
    save_index, save_meta, save_stopwords, IndexPaths, MetaFile,
};
use ircore::vector::{TfWeighting, VectorSpaceConfig, VectorSpaceModel};
use ircore::{boolean, Collection, DocId, Document, InvertedIndex, Normalizer, Pipeline};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

mod source;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, query and evaluate in-memory inverted indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all pipeline indexes from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Stopwords: `english` or a path to a list file (one word per line)
        #[arg(long, conflicts_with = "common")]
        stopwords: Option<String>,
        /// Document-frequency ratio above which a term is a stopword, e.g. 0.5
        #[arg(long)]
        common: Option<f64>,
        /// Optional ratio at or below which a term is also a stopword
        #[arg(long, requires = "common")]
        rare: Option<f64>,
        /// JSON retrieval config; flags override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Rank documents against a free-text query with tf-idf cosine similarity
    Search {
        #[arg(long)]
        index: PathBuf,
        query: String,
        #[arg(long)]
        pipeline: Option<Pipeline>,
        /// Number of results to show (default 10, at most 10000)
        #[arg(long, value_parser = top_k_parser())]
        top_k: Option<usize>,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Use 1 + ln(tf) instead of raw term frequency
        #[arg(long, default_value_t = false)]
        log_tf: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Evaluate a Boolean query (AND, OR, NOT, parentheses)
    Boolean {
        #[arg(long)]
        index: PathBuf,
        query: String,
        #[arg(long)]
        pipeline: Option<Pipeline>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score a model against a ground-truth file
    Evaluate {
        #[arg(long)]
        index: PathBuf,
        /// JSON object: query -> [relevant doc ids or document titles]
        #[arg(long)]
        ground_truth: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Vector)]
        mode: Mode,
        #[arg(long)]
        pipeline: Option<Pipeline>,
        /// Ranking cutoff for the vector model (default: the whole ranking, at most 10000)
        #[arg(long, value_parser = top_k_parser())]
        top_k: Option<usize>,
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        #[arg(long, default_value_t = false)]
        log_tf: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print per-pipeline collection statistics
    Stats {
        #[arg(long)]
        index: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Boolean,
    Vector,
}

#[derive(Serialize)]
struct Hit<'a> {
    id: DocId,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, common, rare, config } => {
            let mut setting = retrieval_config(config.as_deref())?.stopwords;
            if let Some(s) = stopwords {
                setting = if s.eq_ignore_ascii_case("english") {
                    StopwordSetting::English
                } else {
                    StopwordSetting::List { path: PathBuf::from(s) }
                };
            } else if let Some(common) = common {
                setting = StopwordSetting::Frequency { common, rare };
            }
            build_index(&input, &output, setting)
        }
        Commands::Search { index, query, pipeline, top_k, smoothed_idf, log_tf, config } => {
            let cfg = retrieval_config(config.as_deref())?;
            let pipeline = pipeline.unwrap_or(cfg.pipeline);
            let vcfg = vector_config(cfg.vector, smoothed_idf, log_tf);
            let top_k = RetrievalConfig { top_k: top_k.or(cfg.top_k), ..cfg }.effective_top_k();
            let snapshot = Snapshot::open(&index)?;
            let idx = snapshot.index(pipeline)?;
            let ranked = VectorSpaceModel::new(&idx, vcfg).search_text(&query, &snapshot.normalizer, Some(top_k));
            let hits: Vec<Hit> = ranked.iter().map(|&(id, score)| snapshot.hit(id, Some(score))).collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
        Commands::Boolean { index, query, pipeline, config } => {
            let pipeline = pipeline.unwrap_or(retrieval_config(config.as_deref())?.pipeline);
            let snapshot = Snapshot::open(&index)?;
            let idx = snapshot.index(pipeline)?;
            let matches = boolean::search(&query, &idx, &snapshot.normalizer)?;
            let hits: Vec<Hit> = matches.iter().map(|&id| snapshot.hit(id, None)).collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
        Commands::Evaluate { index, ground_truth, mode, pipeline, top_k, smoothed_idf, log_tf, config } => {
            let cfg = retrieval_config(config.as_deref())?;
            let pipeline = pipeline.unwrap_or(cfg.pipeline);
            let vcfg = vector_config(cfg.vector, smoothed_idf, log_tf);
            let cutoff = RetrievalConfig { top_k: top_k.or(cfg.top_k), ..cfg }.cutoff();
            let snapshot = Snapshot::open(&index)?;
            let gt = load_ground_truth(&ground_truth, snapshot.docs.values())?;
            let idx = snapshot.index(pipeline)?;
            let report = match mode {
                Mode::Boolean => evaluate_queries(&gt, None, |q| {
                    Ok(boolean::search(q, &idx, &snapshot.normalizer)?.into_iter().collect())
                })?,
                Mode::Vector => {
                    let model = VectorSpaceModel::new(&idx, vcfg);
                    evaluate_queries(&gt, cutoff, |q| {
                        let ranked = model.search_text(q, &snapshot.normalizer, cutoff);
                        Ok(ranked.into_iter().map(|(id, _)| id).collect())
                    })?
                }
            };
            tracing::info!(
                %pipeline,
                queries = report.per_query.len(),
                undefined = report.undefined.len(),
                map = report.mean_average_precision,
                "evaluation done"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Stats { index } => {
            let stats = Snapshot::open(&index)?.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn top_k_parser() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::new().range(1..=MAX_TOP_K as u64)
}

fn retrieval_config(path: Option<&Path>) -> Result<RetrievalConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(RetrievalConfig::default()),
    }
}

fn vector_config(base: VectorSpaceConfig, smoothed_idf: bool, log_tf: bool) -> VectorSpaceConfig {
    VectorSpaceConfig {
        tf: if log_tf { TfWeighting::LogScaled } else { base.tf },
        smoothed_idf: smoothed_idf || base.smoothed_idf,
    }
}

fn build_index(input: &Path, output: &Path, stopwords: StopwordSetting) -> Result<()> {
    let paths = IndexPaths::new(output);
    fs::create_dir_all(&paths.root)?;

    let docs = source::load_documents(input)?;
    let collection = Collection::from_documents(docs)?.with_stopwords(resolve_stopwords(&stopwords)?);
    let normalizer = collection.normalizer()?;

    for pipeline in Pipeline::ALL {
        let index = collection.index(pipeline)?;
        save_index(&paths, &index)?;
        tracing::info!(%pipeline, terms = index.postings.len(), "saved index");
    }
    save_docs(&paths, collection.documents())?;
    save_stopwords(&paths, normalizer.stopwords())?;

    let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let meta = MetaFile {
        num_docs: collection.len() as u32,
        pipelines: Pipeline::ALL.to_vec(),
        stopwords,
        created_at,
        version: SNAPSHOT_VERSION,
    };
    save_meta(&paths, &meta)?;

    println!("Indexed {} docs into {}", collection.len(), paths.root.display());
    Ok(())
}

/// A built index directory opened for querying.
struct Snapshot {
    paths: IndexPaths,
    meta: MetaFile,
    docs: BTreeMap<DocId, Document>,
    normalizer: Normalizer,
}

impl Snapshot {
    fn open(root: &Path) -> Result<Self> {
        let paths = IndexPaths::new(root);
        let meta = load_meta(&paths)?;
        if meta.version != SNAPSHOT_VERSION {
            anyhow::bail!("snapshot version {} is not supported (expected {})", meta.version, SNAPSHOT_VERSION);
        }
        let docs = load_docs(&paths)?.into_iter().map(|d| (d.id, d)).collect();
        let normalizer = Normalizer::new(load_stopwords(&paths)?);
        Ok(Self { paths, meta, docs, normalizer })
    }

    fn index(&self, pipeline: Pipeline) -> Result<InvertedIndex> {
        if !self.meta.pipelines.contains(&pipeline) {
            anyhow::bail!("pipeline {pipeline} was not built into {}", self.paths.root.display());
        }
        load_index(&self.paths, pipeline).with_context(|| format!("loading {pipeline} index"))
    }

    /// Statistics of the indexes as saved, without re-reading stopword sources.
    fn stats(&self) -> Result<CollectionStats> {
        let mut pipelines = BTreeMap::new();
        for &pipeline in &self.meta.pipelines {
            pipelines.insert(pipeline, PipelineStats::of(&self.index(pipeline)?));
        }
        Ok(CollectionStats { documents: self.docs.len(), pipelines })
    }

    fn hit(&self, id: DocId, score: Option<f64>) -> Hit<'_> {
        let title = self.docs.get(&id).map(|d| d.title.as_str()).unwrap_or("");
        Hit { id, title, score }
    }
}
