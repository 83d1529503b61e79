//! Command-line flags and their mapping onto `PipelineConfig`.

use std::path::PathBuf;

use clap::Parser;

use phrasemine_core::{Diversification, EmbeddingModel, NgramRange, PipelineConfig, Result};

/// Extract ranked keyphrases from archived patent XML, shard by shard.
///
/// Re-running picks up where the previous run stopped: shards that already
/// have keyphrases are skipped, partially processed shards resume.
#[derive(Debug, Parser)]
#[command(name = "phrasemine", version, about)]
pub struct Cli {
    /// Root data directory (holds patents/, raw/, processed/, key_phrases/, models/).
    #[arg(long, env = "PHRASEMINE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory with model.onnx and tokenizer.json [default: <data-dir>/models/<model>].
    #[arg(long, env = "PHRASEMINE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Candidate diversification strategy: mss or mmr.
    #[arg(long, env = "PHRASEMINE_DIVERSIFICATION", default_value = "mmr")]
    pub diversification: Diversification,

    /// Diversity coefficient in [0, 1], only used by mmr.
    #[arg(long, env = "PHRASEMINE_DIVERSITY", default_value_t = 0.5)]
    pub diversity: f32,

    /// Shortest candidate phrase, in words.
    #[arg(long, env = "PHRASEMINE_NGRAM_MIN", default_value_t = 1)]
    pub ngram_min: usize,

    /// Longest candidate phrase, in words.
    #[arg(long, env = "PHRASEMINE_NGRAM_MAX", default_value_t = 2)]
    pub ngram_max: usize,

    /// Ranked phrases kept per document.
    #[arg(long, env = "PHRASEMINE_TOP_N", default_value_t = 30)]
    pub top_n: usize,

    /// Candidate pool size per document (must be >= top-n).
    #[arg(long, env = "PHRASEMINE_NR_CANDIDATES", default_value_t = 30)]
    pub nr_candidates: usize,

    /// Sentence embedding model.
    #[arg(long, env = "PHRASEMINE_MODEL", default_value = "all-MiniLM-L12-v2")]
    pub model: EmbeddingModel,

    /// Documents per embedding batch.
    #[arg(long, env = "PHRASEMINE_BATCH_SIZE", default_value_t = 2048)]
    pub batch_size: usize,

    /// Parser worker threads [default: number of CPUs].
    #[arg(long, env = "PHRASEMINE_WORKERS")]
    pub workers: Option<usize>,

    /// Do not expand .tgz bundles before parsing.
    #[arg(long)]
    pub no_extract: bool,

    /// Tag whose text is extracted from each document.
    #[arg(long, env = "PHRASEMINE_TAG", default_value = "abstract")]
    pub tag: String,

    /// Only process this shard (repeatable).
    #[arg(long = "shard", value_name = "NAME")]
    pub shards: Vec<String>,

    /// Write the run report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Build and validate the pipeline configuration.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            diversification: self.diversification,
            diversity: self.diversity,
            ngram_range: NgramRange::new(self.ngram_min, self.ngram_max),
            top_n: self.top_n,
            nr_candidates: self.nr_candidates,
            model: self.model,
            batch_size: self.batch_size,
            workers: self.workers.unwrap_or(defaults.workers),
            extract_archives: !self.no_extract,
            content_tag: self.tag.clone(),
            shards: self.shards.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
