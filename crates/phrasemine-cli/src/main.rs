//! phrasemine: staged keyphrase extraction over archived patent XML.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use phrasemine_core::DataPaths;
use phrasemine_infer::{create_embedder, EmbeddingScorer};
use phrasemine_runtime::PipelineDriver;
use phrasemine_store::FsStageStore;

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));
        if let Some(dir) = exe_dir {
            let parent_data = dir.join("../data");
            if parent_data.exists() {
                return parent_data;
            }
        }
        PathBuf::from("data")
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config().context("invalid configuration")?;

    let data_dir = resolve_data_dir(cli.data_dir.clone());
    info!("Data directory: {}", data_dir.display());
    let paths = DataPaths::new(&data_dir)
        .with_context(|| format!("cannot prepare data directory {}", data_dir.display()))?;

    info!(
        "Configuration: strategy={}, diversity={}, ngram=({}, {}), top_n={}, nr_candidates={}, model={}, batch_size={}, workers={}",
        config.diversification,
        config.diversity,
        config.ngram_range.min,
        config.ngram_range.max,
        config.top_n,
        config.nr_candidates,
        config.model,
        config.batch_size,
        config.workers
    );

    let store = FsStageStore::new(&paths);

    let model_dir = cli
        .model_dir
        .clone()
        .unwrap_or_else(|| paths.model_dir(config.model));
    let embedder = create_embedder(&model_dir, config.model);
    let scorer = Arc::new(EmbeddingScorer::new(embedder, &config));

    let driver = PipelineDriver::new(&config, &paths.patents, &store, scorer);
    let report = driver.run().context("pipeline aborted")?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        info!("Run report written to {}", path.display());
    }

    if !report.exit_ok() {
        tracing::error!("No shard produced keyphrases ({} failed)", report.failed());
        std::process::exit(1);
    }
    Ok(())
}
