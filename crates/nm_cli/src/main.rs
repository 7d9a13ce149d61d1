mod duration;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use nm_core::config::parse_layer;
use nm_core::{Layered, StateStore, Summarizer};
use nm_feeds::{default_registry, handle_command, CollectorConfig, FeedArgs, FeedCollector, HttpFeedClient};
use nm_inference::{create_model, Config as InferenceConfig, Provider};
use nm_pipeline::context::{DEFAULT_MAX_SUMMARIES, DEFAULT_MODEL};
use nm_pipeline::{Pipeline, RunContext, RunInputs, ScoringTables, Settings, SimilarityMetric};
use nm_storage::JsonDirStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::duration::HumanDuration;

const ENV_MODEL: &str = "OPENROUTER_MODEL";
const ENV_MAX_SUMMARIES: &str = "MAX_SUMMARIES_PER_RUN";
const ENV_API_KEY: &str = "OPENROUTER_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "nm", author, version, about = "Collects news feeds, clusters and scores stories, and publishes summarized artifacts", long_about = None)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the pipeline once and publish new artifacts
    Run(RunArgs),
    /// Inspect the feed registry
    Feeds(FeedArgs),
    /// Print the statistics of the published artifacts
    Stats {
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Artifact directory
    #[arg(long, default_value = "data")]
    out: PathBuf,
    /// Summarization model; overrides OPENROUTER_MODEL
    #[arg(long)]
    model: Option<String>,
    /// Maximum summaries this run; overrides MAX_SUMMARIES_PER_RUN
    #[arg(long)]
    max_summaries: Option<usize>,
    /// Use the offline excerpt model instead of OpenRouter
    #[arg(long)]
    offline: bool,
    /// Drop articles older than this (e.g. 7d)
    #[arg(long)]
    retention: Option<HumanDuration>,
    /// How far back prior articles are considered for clustering (e.g. 48h)
    #[arg(long)]
    candidate_window: Option<HumanDuration>,
    /// Title similarity needed to cluster two reports
    #[arg(long)]
    threshold: Option<f64>,
    /// Title similarity metric: jaccard or overlap
    #[arg(long)]
    metric: Option<SimilarityMetric>,
    /// JSON file with keyword and weight tables
    #[arg(long)]
    scoring_tables: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn collector() -> anyhow::Result<FeedCollector> {
    let config = CollectorConfig::default();
    let client = HttpFeedClient::new(config.timeout)?;
    Ok(FeedCollector::new(Arc::new(client), default_registry(), config))
}

async fn settings(args: &RunArgs) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if let Some(retention) = args.retention {
        settings.retention = retention.to_chrono()?;
    }
    if let Some(window) = args.candidate_window {
        settings.cluster.candidate_window = window.to_chrono()?;
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("--threshold must be between 0 and 1, got {}", threshold);
        }
        settings.cluster.threshold = threshold;
    }
    if let Some(metric) = args.metric {
        settings.cluster.metric = metric;
    }
    if let Some(path) = &args.scoring_tables {
        settings.tables = ScoringTables::load(path)
            .await
            .with_context(|| format!("Failed to load scoring tables from {}", path.display()))?;
    }
    Ok(settings)
}

fn summarizer(ctx: &mut RunContext, offline: bool) -> anyhow::Result<Arc<dyn Summarizer>> {
    let api_key = env_var(ENV_API_KEY).filter(|key| !key.trim().is_empty());
    let provider = if offline {
        Provider::Dummy
    } else if api_key.is_none() {
        warn!("⚠️ {} is not set; no summaries will be generated this run", ENV_API_KEY);
        ctx.settings.summary.max_per_run = 0;
        Provider::Dummy
    } else {
        Provider::OpenRouter
    };

    let config = InferenceConfig {
        provider,
        api_key,
        timeout: ctx.settings.summary.timeout,
        ..InferenceConfig::default()
    };
    let model = create_model(&config)?;
    info!("🤖 Using {} summarizer", model.name());
    Ok(model)
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let settings = settings(&args).await?;
    let inputs = RunInputs {
        model: Layered::new(DEFAULT_MODEL.to_string())
            .with_manual(args.model.clone().filter(|m| !m.trim().is_empty()))
            .with_variable(parse_layer(env_var(ENV_MODEL).as_deref(), ENV_MODEL)?),
        max_summaries: Layered::new(DEFAULT_MAX_SUMMARIES)
            .with_manual(args.max_summaries)
            .with_variable(parse_layer(env_var(ENV_MAX_SUMMARIES).as_deref(), ENV_MAX_SUMMARIES)?),
    };
    let mut ctx = RunContext::resolve(Utc::now(), settings, inputs);
    let summarizer = summarizer(&mut ctx, args.offline)?;

    let store = Arc::new(JsonDirStore::new(&args.out));
    let pipeline = Pipeline::new(collector()?, summarizer, store);
    let outcome = pipeline
        .run(&ctx)
        .await
        .context("Failed to publish artifacts")?;

    info!(
        "📰 {}: {} items from {} feeds ({} failed), {}/{} summaries, {} articles",
        outcome.status,
        outcome.collected_items,
        outcome.feeds_ok,
        outcome.feeds_failed,
        outcome.summaries_succeeded,
        outcome.summaries_attempted,
        outcome.articles_total
    );
    Ok(ExitCode::from(outcome.status.exit_code()))
}

async fn stats(out: &Path) -> anyhow::Result<ExitCode> {
    let store = JsonDirStore::new(out);
    match store.load_artifacts().await? {
        Some(artifacts) => {
            println!("{}", serde_json::to_string_pretty(&artifacts.stats)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("No artifacts published under {}", out.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Feeds(args) => match collector() {
            Ok(collector) => handle_command(args, &collector)
                .await
                .map(|_| ExitCode::SUCCESS)
                .map_err(Into::into),
            Err(e) => Err(e),
        },
        Commands::Stats { out } => stats(&out).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
