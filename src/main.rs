//! skillgraph CLI - build and query the title/skill concept graph.
//!
//! Orchestrates the full pipeline:
//!
//! 1. Corpus export (optional): normalize descriptions for external
//!    embedding training
//! 2. Ingestion (--train): records → candidate scoring → graph, with
//!    periodic checkpoints
//! 3. Querying: ranked first-hop or second-hop neighbors of a node
//!
//! The query hop count follows the graph's alternating-kind shape:
//! titles connect to skills, so asking for the *other* kind is one hop
//! and asking for the *same* kind is two hops.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use skillgraph::config::Config;
use skillgraph::ingest::RecordReader;
use skillgraph::normalize::TextNormalizer;
use skillgraph::{graph, query, KeyedVectors, Pipeline, QueryMode};

/// Build and query a weighted job-title / skill concept graph
///
/// Examples:
///   skillgraph --train --records jobs.jsonl --model vectors.txt --graph graph.bin
///   skillgraph --graph graph.bin --name "ASP.NET" --kind skill --want title
///   skillgraph --records jobs.jsonl --export-corpus corpus.txt
#[derive(Parser, Debug)]
#[command(name = "skillgraph")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Path to the JSONL records file
    ///
    /// One JSON object per line with `title`, `description`, and the
    /// external annotator's `tokens` / `entities` arrays.
    #[arg(long, value_name = "PATH")]
    pub records: Option<PathBuf>,

    /// Path to the pre-trained word vectors (word2vec text format)
    ///
    /// Required with --train. Vectors are produced externally; use
    /// --export-corpus to prepare the training text.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Path to the graph checkpoint
    ///
    /// Written during --train (overwritten atomically every checkpoint
    /// interval) and read back for querying.
    #[arg(long, value_name = "PATH")]
    pub graph: Option<PathBuf>,

    /// Ingest records into the graph before querying
    #[arg(long)]
    pub train: bool,

    /// Write the normalized training corpus to PATH and exit
    ///
    /// One cleaned description per line, ready for an external embedding
    /// trainer.
    #[arg(long, value_name = "PATH")]
    pub export_corpus: Option<PathBuf>,

    /// Node to query (matched case-insensitively)
    #[arg(long)]
    pub name: Option<String>,

    /// What kind of node --name is
    #[arg(long, value_enum, default_value = "skill")]
    pub kind: KindArg,

    /// What kind of node to return
    ///
    /// Same kind as --kind means a second-hop query (e.g. skills related
    /// to a skill through shared titles); the other kind is first-hop.
    #[arg(long, value_enum, default_value = "title")]
    pub want: KindArg,

    /// How many results to return
    #[arg(long, default_value = "5")]
    pub count: usize,

    /// Skill candidates kept per document (overrides skillgraph.toml)
    #[arg(long)]
    pub topk: Option<usize>,

    /// Records between checkpoints (overrides skillgraph.toml)
    #[arg(long)]
    pub checkpoint_every: Option<usize>,

    /// Verbose output
    ///
    /// Shows per-stage progress and timing on stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Node kind as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Skill,
    Title,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let start = std::time::Instant::now();

    let config = Config::load(std::path::Path::new("."));
    let topk = cli.topk.unwrap_or(config.topk);
    let checkpoint_every = cli.checkpoint_every.unwrap_or(config.checkpoint_every);

    if cli.verbose {
        eprintln!("skillgraph v{}", env!("CARGO_PKG_VERSION"));
        if let Some(source) = &config.source {
            eprintln!("   Config: {}", source.display());
        }
        eprintln!("   topk = {}, checkpoint-every = {}", topk, checkpoint_every);
    }

    // Corpus export is a standalone mode: clean descriptions, write, exit.
    if let Some(corpus_path) = &cli.export_corpus {
        let records = cli
            .records
            .as_ref()
            .context("--export-corpus needs --records")?;
        let written = export_corpus(records, corpus_path)?;
        if cli.verbose {
            eprintln!("✓ Exported {} descriptions ({:.2?})", written, start.elapsed());
        }
        println!("Corpus written to {}", corpus_path.display());
        return Ok(());
    }

    let graph_path = cli.graph.as_ref().context("--graph is required")?;

    if cli.train {
        let records = cli.records.as_ref().context("--train needs --records")?;
        let model_path = cli.model.as_ref().context("--train needs --model")?;

        let load_start = std::time::Instant::now();
        let model = KeyedVectors::load(model_path)?;
        if cli.verbose {
            eprintln!(
                "✓ Loaded {} word vectors ({:.2?})",
                model.vocab_size(),
                load_start.elapsed()
            );
        }

        let reader = RecordReader::open(records)?;
        let mut pipeline = Pipeline::new(&model, topk, checkpoint_every, graph_path.clone());
        // Resume from an existing checkpoint so repeat runs keep merging
        // into the same graph instead of starting over.
        if graph_path.exists() {
            let existing = graph::store::load(graph_path)?;
            if cli.verbose {
                eprintln!(
                    "✓ Resuming from checkpoint: {} nodes, {} edges",
                    existing.node_count(),
                    existing.edge_count()
                );
            }
            pipeline = pipeline.with_graph(existing);
        }
        let stats = pipeline.run(reader, cli.verbose)?;

        if cli.verbose {
            let g = pipeline.graph();
            eprintln!(
                "✓ Ingested {} records ({} skipped) into {} nodes / {} edges ({:.2?})",
                stats.processed,
                stats.skipped,
                g.node_count(),
                g.edge_count(),
                start.elapsed()
            );
        }
    }

    let Some(name) = &cli.name else {
        if !cli.train {
            bail!("Nothing to do: pass --train, --export-corpus, or --name");
        }
        return Ok(());
    };

    let graph = graph::store::load(graph_path)?;
    if cli.verbose {
        eprintln!(
            "✓ Loaded graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
    }

    // Alternating-kind graph: same requested kind means two hops away.
    let mode = if cli.kind == cli.want {
        QueryMode::Next
    } else {
        QueryMode::Nearest
    };

    let neighbors = query(&graph, name, cli.count, mode)?;
    for neighbor in &neighbors {
        println!("{}\t{}\t{:.3}", neighbor.key, neighbor.kind.as_str(), neighbor.score);
    }
    if neighbors.is_empty() && cli.verbose {
        eprintln!("(no neighbors)");
    }

    Ok(())
}

/// Write one normalized description per line for external embedding
/// training. Malformed records are reported and skipped, like ingestion.
fn export_corpus(records: &std::path::Path, corpus_path: &std::path::Path) -> Result<usize> {
    use std::io::Write;

    let normalizer = TextNormalizer::new();
    let mut out = std::io::BufWriter::new(
        std::fs::File::create(corpus_path)
            .with_context(|| format!("Failed to create corpus: {}", corpus_path.display()))?,
    );

    let mut written = 0;
    for (lineno, result) in RecordReader::open(records)? {
        match result {
            Ok(record) => {
                let cleaned = normalizer.normalize(&record.description);
                if !cleaned.is_empty() {
                    writeln!(out, "{}", cleaned)?;
                    written += 1;
                }
            }
            Err(e) => eprintln!("⚠️  Skipping record at line {}: {:#}", lineno, e),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_minimal_query() {
        let cli = Cli::parse_from(["skillgraph", "--graph", "g.bin", "--name", "java"]);
        assert_eq!(cli.name, Some("java".into()));
        assert_eq!(cli.kind, KindArg::Skill);
        assert_eq!(cli.want, KindArg::Title);
        assert_eq!(cli.count, 5);
        assert!(!cli.train);
    }

    #[test]
    fn test_cli_parse_train() {
        let cli = Cli::parse_from([
            "skillgraph",
            "--train",
            "--records",
            "jobs.jsonl",
            "--model",
            "vectors.txt",
            "--graph",
            "g.bin",
            "--checkpoint-every",
            "50",
            "--topk",
            "7",
        ]);
        assert!(cli.train);
        assert_eq!(cli.records, Some(PathBuf::from("jobs.jsonl")));
        assert_eq!(cli.checkpoint_every, Some(50));
        assert_eq!(cli.topk, Some(7));
    }

    #[test]
    fn test_cli_parse_kinds() {
        let cli = Cli::parse_from([
            "skillgraph",
            "--graph",
            "g.bin",
            "--name",
            "java",
            "--kind",
            "skill",
            "--want",
            "skill",
        ]);
        // Same kind on both sides: second-hop query
        assert_eq!(cli.kind, cli.want);
    }

    #[test]
    fn test_cli_parse_export_corpus() {
        let cli = Cli::parse_from([
            "skillgraph",
            "--records",
            "jobs.jsonl",
            "--export-corpus",
            "corpus.txt",
        ]);
        assert_eq!(cli.export_corpus, Some(PathBuf::from("corpus.txt")));
    }
}
