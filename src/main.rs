use anyhow::{Context, Result};
use clap::Parser;
use docsum::{
    config::{self, ConfigOverrides},
    logging,
    processing::SummaryPipeline,
    summarization,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(
    name = "docsum",
    version,
    about = "Summarize a text file too large for a single model context window"
)]
struct Cli {
    /// Path of the text file to summarize.
    filename: PathBuf,
    /// Model identifier sent to the provider.
    #[arg(long)]
    model: Option<String>,
    /// Total attempts per provider call before the run fails.
    #[arg(long)]
    max_attempts: Option<u32>,
    /// Number of chunk summaries requested in parallel.
    #[arg(long)]
    concurrency: Option<usize>,
    /// Re-chunk and reduce the intermediate document while it still splits.
    #[arg(long)]
    recursive: bool,
    /// Upper bound on map rounds in recursive mode.
    #[arg(long)]
    max_rounds: Option<usize>,
}

impl From<&Cli> for ConfigOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            model: cli.model.clone(),
            max_attempts: cli.max_attempts,
            concurrency: cli.concurrency,
            recursive: cli.recursive,
            max_rounds: cli.max_rounds,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config(ConfigOverrides::from(&cli))
        .context("failed to load configuration")?;
    logging::init_tracing(config.log_file.as_deref());
    config.log_loaded();

    let text = tokio::fs::read_to_string(&cli.filename)
        .await
        .with_context(|| format!("failed to read {}", cli.filename.display()))?;

    let client = summarization::get_summarization_client(config)
        .context("failed to build summarization client")?;
    let pipeline = SummaryPipeline::from_config(Arc::from(client), config);

    let summary = pipeline
        .summarize_until(&text, tokio::signal::ctrl_c())
        .await
        .context("summarization failed")?;

    match serde_json::to_string(&pipeline.metrics_snapshot()) {
        Ok(metrics) => tracing::info!(%metrics, "Summarization finished"),
        Err(error) => tracing::debug!(%error, "Failed to serialize metrics"),
    }
    println!("{summary}");
    Ok(())
}
