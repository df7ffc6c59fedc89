//! civic-pulse CLI - triage civic-issue posts by sentiment, urgency and topic.

mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use civic_pulse::pipeline::{IngestConfig, IngestPipeline};
use civic_pulse::storage::{AccessEvent, AccessLog, FeedbackStore};
use civic_pulse::{FeedbackAnalyzer, FeedbackSummary, PulseConfig};

/// civic-pulse - Analyze civic feedback posts and rank them for follow-up.
#[derive(Parser)]
#[command(name = "civic-pulse")]
#[command(about = "Civic-issue feedback analysis pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (TOML); defaults to CIVIC_* environment variables
    #[arg(long, global = true, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze posts given on the command line and print the records as JSON
    Analyze {
        /// Post texts
        #[arg(required_unless_present = "file")]
        texts: Vec<String>,

        /// Read posts from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Analyze a hashtag dump and add the results to the store
    Ingest {
        /// Hashtag dump (JSON object of hashtag to posts)
        #[arg(long)]
        input: PathBuf,

        /// Feedback store file
        #[arg(long, default_value = "data/feedback.json")]
        store: PathBuf,

        /// Concurrent analyses (overrides configuration)
        #[arg(long)]
        workers: Option<usize>,

        /// Access log file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// List stored feedback for a hashtag, highest priority first
    Query {
        /// Hashtag, with or without '#'
        #[arg(long)]
        hashtag: String,

        /// Minimum priority score (10-100)
        #[arg(long, default_value = "0")]
        min_priority: u8,

        /// Feedback store file
        #[arg(long, default_value = "data/feedback.json")]
        store: PathBuf,

        /// Access log file
        #[arg(long, default_value = "data/access.jsonl")]
        log: PathBuf,

        /// Limit results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the topic set and keyword vocabularies in use
    Vocab,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays clean for JSON output
    let filter = if cli.verbose {
        EnvFilter::new("civic_pulse=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("civic_pulse=info,warn"))
    };

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { texts, file } => run_analyze(&config, texts, file).await,
        Commands::Ingest {
            input,
            store,
            workers,
            log,
        } => {
            tracing::info!(
                input = %input.display(),
                store = %store.display(),
                "Starting ingest"
            );
            run_ingest(&config, input, store, workers, log).await
        }
        Commands::Query {
            hashtag,
            min_priority,
            store,
            log,
            limit,
        } => run_query(&hashtag, min_priority, &store, &log, limit),
        Commands::Vocab => run_vocab(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    let config = match path {
        Some(path) => PulseConfig::from_file(path)?,
        None => PulseConfig::from_env(),
    };
    config.validate()?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

async fn run_analyze(config: &PulseConfig, mut texts: Vec<String>, file: Option<PathBuf>) -> Result<()> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        texts.extend(
            content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string),
        );
    }

    let analyzer = FeedbackAnalyzer::from_config(config)?;

    if let [text] = texts.as_slice() {
        let record = analyzer.analyze(text)?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let report = analyzer.analyze_batch_parallel(texts, config.workers).await;
    println!("{}", serde_json::to_string_pretty(&report.outcomes)?);

    for (index, error) in report.failures() {
        ui::print_error(&format!("post {index}: {error}"));
    }
    Ok(())
}

async fn run_ingest(
    config: &PulseConfig,
    input: PathBuf,
    store: PathBuf,
    workers: Option<usize>,
    log: Option<PathBuf>,
) -> Result<()> {
    let analyzer = FeedbackAnalyzer::from_config(config)?;
    let ingest = IngestConfig {
        input,
        store_path: store,
        access_log: log,
        workers: workers.unwrap_or(config.workers),
    };

    let result = IngestPipeline::new(ingest, analyzer).run().await?;

    ui::print_section("Ingest Summary");
    println!("   Fetched: {}", result.fetched);
    println!("   Analyzed: {}", result.analyzed);
    println!("   Saved: {}", result.saved);
    println!("   Skipped: {}", result.skipped);

    if result.errors.is_empty() {
        ui::print_success("Ingest complete");
    } else {
        ui::print_warning(&format!("{} posts failed analysis", result.errors.len()));
        for err in &result.errors {
            eprintln!("     - {err}");
        }
    }

    Ok(())
}

fn run_query(hashtag: &str, min_priority: u8, store: &Path, log: &Path, limit: usize) -> Result<()> {
    let store = FeedbackStore::load(store)?;

    if let Err(e) = AccessLog::new(log).append(&AccessEvent::query(hashtag, min_priority)) {
        tracing::warn!(error = %e, "Failed to append access log");
    }

    let entries = store.query(hashtag, min_priority);
    ui::print_section(&format!("#{hashtag} (priority >= {min_priority})"));

    if entries.is_empty() {
        println!("No entries found.");
        let known = store.hashtags();
        if !known.is_empty() {
            println!("Known hashtags: {}", known.join(", "));
        }
        return Ok(());
    }

    for entry in entries.iter().take(limit) {
        ui::print_entry(entry);
    }
    println!("\nShowing {} of {} entries", entries.len().min(limit), entries.len());

    let summary = FeedbackSummary::from_records(entries.iter().map(|e| &e.record));
    ui::print_summary(&summary);

    Ok(())
}

fn run_vocab(config: &PulseConfig) -> Result<()> {
    let analyzer = FeedbackAnalyzer::from_config(config)?;
    let vocabulary = analyzer.context().vocabulary();

    ui::print_section("Topics");
    for (i, topic) in vocabulary.topics().iter().enumerate() {
        println!("  {:>2}. {topic}", i + 1);
    }

    ui::print_section("Urgency keywords (checked in order)");
    println!("  {}", vocabulary.urgency_keywords().join(", "));

    ui::print_section("Topic fallback keywords");
    for entry in vocabulary.topic_keywords() {
        println!("  {:<20} {}", entry.topic, entry.keywords.join(", "));
    }

    Ok(())
}
