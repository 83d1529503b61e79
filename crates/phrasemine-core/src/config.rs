//! Pipeline configuration and data directory management.
//!
//! `PipelineConfig` is built once at startup, validated, and then handed to
//! every component by reference. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stage::Stage;

/// Candidate diversification strategy. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diversification {
    /// Max-sum-similarity subset selection.
    Mss,
    /// Maximum marginal relevance.
    Mmr,
}

impl FromStr for Diversification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mss" | "maxsum" | "max-sum" => Ok(Self::Mss),
            "mmr" => Ok(Self::Mmr),
            other => Err(Error::Config(format!(
                "unknown diversification '{}' (expected mss or mmr)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Diversification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mss => write!(f, "mss"),
            Self::Mmr => write!(f, "mmr"),
        }
    }
}

/// Sentence embedding models the pipeline knows how to load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[default]
    #[serde(rename = "all-MiniLM-L12-v2")]
    MiniLmL12,
    #[serde(rename = "all-MiniLM-L6-v2")]
    MiniLmL6,
    #[serde(rename = "distilbert-base-nli-mean-tokens")]
    DistilBertNli,
    #[serde(rename = "all-distilroberta-v1")]
    DistilRoberta,
    #[serde(rename = "all-mpnet-base-v2")]
    MpnetBase,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 5] = [
        Self::MiniLmL12,
        Self::MiniLmL6,
        Self::DistilBertNli,
        Self::DistilRoberta,
        Self::MpnetBase,
    ];

    /// Model identifier, also the directory name under `models/`.
    pub fn id(self) -> &'static str {
        match self {
            Self::MiniLmL12 => "all-MiniLM-L12-v2",
            Self::MiniLmL6 => "all-MiniLM-L6-v2",
            Self::DistilBertNli => "distilbert-base-nli-mean-tokens",
            Self::DistilRoberta => "all-distilroberta-v1",
            Self::MpnetBase => "all-mpnet-base-v2",
        }
    }

    /// Output dimension of the pooled sentence embedding.
    pub fn dimension(self) -> usize {
        match self {
            Self::MiniLmL12 | Self::MiniLmL6 => 384,
            Self::DistilBertNli | Self::DistilRoberta | Self::MpnetBase => 768,
        }
    }
}

impl FromStr for EmbeddingModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.id()).collect();
                Error::Config(format!(
                    "unknown embedding model '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Inclusive word-count bounds for candidate phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

impl NgramRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min: 1, max: 2 }
    }
}

/// Immutable, process-wide pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidate diversification strategy.
    pub diversification: Diversification,
    /// Diversity coefficient in [0, 1]; only consulted under MMR.
    pub diversity: f32,
    /// Candidate phrase length bounds (in words).
    pub ngram_range: NgramRange,
    /// Maximum number of ranked phrases per document.
    pub top_n: usize,
    /// Candidate pool size per document before diversification.
    pub nr_candidates: usize,
    /// Sentence embedding model.
    pub model: EmbeddingModel,
    /// Documents per embedding batch.
    pub batch_size: usize,
    /// Parser worker pool size.
    pub workers: usize,
    /// Expand `.tgz` bundles before parsing.
    pub extract_archives: bool,
    /// Structural tag whose text content is extracted from each document.
    pub content_tag: String,
    /// Restrict the run to these shards (empty = all).
    pub shards: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            diversification: Diversification::Mmr,
            diversity: 0.5,
            ngram_range: NgramRange::default(),
            top_n: 30,
            nr_candidates: 30,
            model: EmbeddingModel::default(),
            batch_size: 2048,
            workers: available_workers(),
            extract_archives: true,
            content_tag: "abstract".to_string(),
            shards: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Reject invalid parameter combinations. Called once, before any shard runs.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::Config("top_n must be positive".into()));
        }
        if self.nr_candidates < self.top_n {
            return Err(Error::Config(format!(
                "nr_candidates ({}) must be >= top_n ({})",
                self.nr_candidates, self.top_n
            )));
        }
        if self.ngram_range.min == 0 {
            return Err(Error::Config("n-gram lower bound must be positive".into()));
        }
        if self.ngram_range.min > self.ngram_range.max {
            return Err(Error::Config(format!(
                "n-gram range ({}, {}) has min > max",
                self.ngram_range.min, self.ngram_range.max
            )));
        }
        if !self.diversity.is_finite() || !(0.0..=1.0).contains(&self.diversity) {
            return Err(Error::Config(format!(
                "diversity {} outside [0, 1]",
                self.diversity
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be positive".into()));
        }
        if self.content_tag.trim().is_empty() {
            return Err(Error::Config("content tag must not be empty".into()));
        }
        Ok(())
    }

    /// Whether a shard is selected by the shard filter.
    pub fn includes_shard(&self, shard: &str) -> bool {
        self.shards.is_empty() || self.shards.iter().any(|s| s == shard)
    }
}

/// Paths to all PhraseMine data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Compressed bundles and their expanded shard directories (`data/patents/`).
    pub patents: PathBuf,
    /// Parsed artifacts (`data/raw/`).
    pub raw: PathBuf,
    /// Normalized artifacts (`data/processed/`).
    pub processed: PathBuf,
    /// Keyphrase artifacts (`data/key_phrases/`).
    pub key_phrases: PathBuf,
    /// Embedding model files (`data/models/`).
    pub models: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            patents: root.join("patents"),
            raw: root.join("raw"),
            processed: root.join("processed"),
            key_phrases: root.join("key_phrases"),
            models: root.join("models"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Directory holding the artifacts of a persisted stage.
    pub fn stage_dir(&self, stage: Stage) -> Option<&Path> {
        match stage {
            Stage::Raw => None,
            Stage::Parsed => Some(&self.raw),
            Stage::Normalized => Some(&self.processed),
            Stage::Extracted => Some(&self.key_phrases),
        }
    }

    /// Directory holding the files for one embedding model.
    pub fn model_dir(&self, model: EmbeddingModel) -> PathBuf {
        self.models.join(model.id())
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.patents)?;
        std::fs::create_dir_all(&self.raw)?;
        std::fs::create_dir_all(&self.processed)?;
        std::fs::create_dir_all(&self.key_phrases)?;
        Ok(())
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.diversification, Diversification::Mmr);
        assert_eq!(config.ngram_range, NgramRange::new(1, 2));
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_rejects_top_n_above_pool() {
        let config = PipelineConfig {
            top_n: 10,
            nr_candidates: 5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_ngram_range() {
        let config = PipelineConfig {
            ngram_range: NgramRange::new(3, 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            ngram_range: NgramRange::new(0, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_diversity() {
        for diversity in [-0.1, 1.5, f32::NAN] {
            let config = PipelineConfig {
                diversity,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {}", diversity);
        }
    }

    #[test]
    fn test_parse_strategy_and_model() {
        assert_eq!("MMR".parse::<Diversification>().unwrap(), Diversification::Mmr);
        assert_eq!("mss".parse::<Diversification>().unwrap(), Diversification::Mss);
        assert!("greedy".parse::<Diversification>().is_err());

        let model: EmbeddingModel = "all-mpnet-base-v2".parse().unwrap();
        assert_eq!(model, EmbeddingModel::MpnetBase);
        assert_eq!(model.dimension(), 768);
        assert!("bert-large".parse::<EmbeddingModel>().is_err());
    }

    #[test]
    fn test_default_model_is_minilm_l12() {
        let model = EmbeddingModel::default();
        assert_eq!(model, EmbeddingModel::MiniLmL12);
        assert_eq!(model.id(), "all-MiniLM-L12-v2");
        assert_eq!(model.dimension(), 384);
        assert_eq!(PipelineConfig::default().model, model);
    }

    #[test]
    fn test_shard_filter() {
        let mut config = PipelineConfig::default();
        assert!(config.includes_shard("anything"));
        config.shards = vec!["ongoing_1".into()];
        assert!(config.includes_shard("ongoing_1"));
        assert!(!config.includes_shard("ongoing_2"));
    }

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.raw.is_dir());
        assert!(paths.processed.is_dir());
        assert!(paths.key_phrases.is_dir());
        assert_eq!(paths.stage_dir(Stage::Parsed), Some(paths.raw.as_path()));
        assert_eq!(paths.stage_dir(Stage::Raw), None);
    }
}
