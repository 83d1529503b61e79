//! Pipeline driver: per-shard stage machine over the Stage Store.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPool;
use tracing::{debug, info, warn};

use phrasemine_core::{Error, PipelineConfig, Result, ShardName, Stage};
use phrasemine_extract::KeyphraseExtractor;
use phrasemine_infer::CandidateScorer;
use phrasemine_ingest::{
    build_pool, extract_bundles, normalize_shard, shard_directories, DocumentParser,
};
use phrasemine_store::{ShardStatus, StageStore};

use crate::types::*;

/// Drives every selected shard to `Stage::Extracted`.
///
/// The driver is the only writer of stage artifacts. Each shard is finished
/// (or abandoned) before the next one starts.
pub struct PipelineDriver<'a> {
    config: &'a PipelineConfig,
    patents_dir: PathBuf,
    store: &'a dyn StageStore,
    extractor: KeyphraseExtractor,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        patents_dir: impl Into<PathBuf>,
        store: &'a dyn StageStore,
        scorer: Arc<dyn CandidateScorer>,
    ) -> Self {
        Self {
            config,
            patents_dir: patents_dir.into(),
            store,
            extractor: KeyphraseExtractor::new(scorer, config),
        }
    }

    /// Run the whole pipeline once.
    ///
    /// Only storage failures and setup errors are returned as `Err`;
    /// shard-level failures end up in the report.
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        if self.config.extract_archives {
            match extract_bundles(&self.patents_dir) {
                Ok(archives) => report.bundles_failed = archives.failed.len(),
                Err(e) => warn!("Bundle extraction skipped: {}", e),
            }
        }

        let shards = self.discover_shards()?;
        info!("Processing {} shards", shards.len());

        let parser = DocumentParser::new(&self.config.content_tag)?;
        let pool = build_pool(self.config.workers)?;

        for shard in &shards {
            report.shards.push(self.process_shard(shard, &parser, &pool)?);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Run complete: completed={}, already_complete={}, failed={}, bundles_failed={}, duration={}ms",
            report.completed(),
            report.already_complete(),
            report.failed(),
            report.bundles_failed,
            report.duration_ms
        );
        Ok(report)
    }

    /// Shard directories under the patents directory plus every shard with a
    /// stage artifact, restricted by the configured shard filter.
    pub fn discover_shards(&self) -> Result<Vec<ShardName>> {
        let mut shards: BTreeSet<ShardName> = shard_directories(&self.patents_dir)?
            .into_iter()
            .collect();
        for stage in Stage::PERSISTED {
            shards.extend(self.store.list(stage)?);
        }
        Ok(shards
            .into_iter()
            .filter(|s| self.config.includes_shard(s))
            .collect())
    }

    /// Advance one shard from its latest completed stage to `Extracted`.
    pub fn process_shard(
        &self,
        shard: &str,
        parser: &DocumentParser,
        pool: &ThreadPool,
    ) -> Result<ShardReport> {
        let resumed_from = ShardStatus::resolve(self.store, shard);
        let report = |outcome| ShardReport {
            shard: shard.to_string(),
            resumed_from,
            outcome,
        };

        if resumed_from.is_terminal() {
            debug!("Shard {} already extracted, skipping", shard);
            return Ok(report(ShardOutcome::AlreadyComplete));
        }

        info!("Shard {}: resuming after stage {}", shard, resumed_from);
        let shard_start = Instant::now();
        let mut stage = resumed_from;
        let mut documents = 0;
        while let Some(next) = stage.next() {
            let stage_start = Instant::now();
            match self.run_stage(shard, next, parser, pool) {
                Ok(count) => {
                    documents = count;
                    stage = next;
                    info!(
                        "Shard {}: {} {} documents in {}ms",
                        shard,
                        next,
                        count,
                        stage_start.elapsed().as_millis()
                    );
                }
                Err(e) if e.is_shard_local() => {
                    warn!("Shard {} failed at stage {}: {}", shard, next, e);
                    return Ok(report(ShardOutcome::Failed {
                        stage: next,
                        reason: e.to_string(),
                    }));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report(ShardOutcome::Completed {
            elapsed_ms: shard_start.elapsed().as_millis() as u64,
            documents,
        }))
    }

    /// Produce and persist one stage's artifact. Returns the document count.
    fn run_stage(
        &self,
        shard: &str,
        stage: Stage,
        parser: &DocumentParser,
        pool: &ThreadPool,
    ) -> Result<usize> {
        match stage {
            Stage::Raw => Ok(0),
            Stage::Parsed => {
                let dir = self.patents_dir.join(shard);
                if !dir.is_dir() {
                    return Err(Error::Parse(format!(
                        "shard directory {} not found",
                        dir.display()
                    )));
                }
                let parsed = parser.parse_shard(&dir, pool)?;
                if parsed.read_failures > 0 {
                    warn!(
                        "Shard {}: {} unreadable documents recorded as empty",
                        shard, parsed.read_failures
                    );
                }
                self.store.write_texts(Stage::Parsed, shard, &parsed.docs)?;
                Ok(parsed.docs.len())
            }
            Stage::Normalized => {
                let docs = self.store.read_texts(Stage::Parsed, shard)?;
                let normalized = normalize_shard(&docs);
                self.store
                    .write_texts(Stage::Normalized, shard, &normalized)?;
                Ok(normalized.len())
            }
            Stage::Extracted => {
                let docs = self.store.read_texts(Stage::Normalized, shard)?;
                let keyphrases = self.extractor.extract_shard(shard, &docs)?;
                self.store.write_keyphrases(shard, &keyphrases)?;
                Ok(keyphrases.len())
            }
        }
    }
}
