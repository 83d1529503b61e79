//! Batched keyphrase extraction for one shard.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use phrasemine_core::{Error, PipelineConfig, Result};
use phrasemine_infer::CandidateScorer;
use phrasemine_store::{DocumentId, KeyphraseResult, ShardKeyphrases, ShardTexts};

use crate::reduce::rank;
use crate::strategy::DiversificationStrategy;

/// Turns normalized documents into ranked keyphrase results.
pub struct KeyphraseExtractor {
    scorer: Arc<dyn CandidateScorer>,
    strategy: DiversificationStrategy,
    top_n: usize,
    batch_size: usize,
}

impl KeyphraseExtractor {
    pub fn new(scorer: Arc<dyn CandidateScorer>, config: &PipelineConfig) -> Self {
        Self {
            scorer,
            strategy: DiversificationStrategy::from_config(config),
            top_n: config.top_n,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Extract one batch. Output position `i` belongs to input document `i`.
    ///
    /// A document without candidates gets an empty result; the batch only
    /// fails if the scorer does.
    pub fn extract(&self, batch: &[&str]) -> Result<Vec<KeyphraseResult>> {
        let scored = self.scorer.score_batch(batch)?;
        if scored.len() != batch.len() {
            return Err(Error::Inference(format!(
                "scorer returned {} candidate lists for {} documents",
                scored.len(),
                batch.len()
            )));
        }
        Ok(scored
            .par_iter()
            .map(|candidates| rank(self.strategy.select(candidates, self.top_n), self.top_n))
            .collect())
    }

    /// Extract every document of a shard, `batch_size` documents per scorer call.
    ///
    /// A shard with no documents, or a batch without any candidate phrase,
    /// abandons the whole shard with `Error::EmptyContent`.
    pub fn extract_shard(&self, shard: &str, docs: &ShardTexts) -> Result<ShardKeyphrases> {
        if docs.is_empty() {
            return Err(Error::EmptyContent {
                shard: shard.to_string(),
            });
        }

        let ids: Vec<&DocumentId> = docs.keys().collect();
        let texts: Vec<&str> = docs.values().map(String::as_str).collect();
        let batches = texts.len().div_ceil(self.batch_size);

        let mut out = ShardKeyphrases::new();
        for (batch_no, (id_chunk, text_chunk)) in ids
            .chunks(self.batch_size)
            .zip(texts.chunks(self.batch_size))
            .enumerate()
        {
            let start = Instant::now();
            let results = self.extract(text_chunk).map_err(|e| match e {
                Error::EmptyVocabulary => Error::EmptyContent {
                    shard: shard.to_string(),
                },
                other => other,
            })?;
            for (id, result) in id_chunk.iter().zip(results) {
                out.insert((*id).clone(), result);
            }
            debug!(
                "Shard {}: batch {}/{} ({} documents) extracted in {}ms",
                shard,
                batch_no + 1,
                batches,
                text_chunk.len(),
                start.elapsed().as_millis()
            );
        }
        Ok(out)
    }
}
