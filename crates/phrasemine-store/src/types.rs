//! Shard payload types shared by every stage.

use std::collections::BTreeMap;

use phrasemine_core::{Result, ShardName, Stage};

/// Document identifier, derived from the source file name.
pub type DocumentId = String;

/// One shard's documents: document-id → text.
///
/// Ordered maps keep serialized artifacts byte-stable across runs.
pub type ShardTexts = BTreeMap<DocumentId, String>;

/// Ranked phrases for one document: 1-based rank → phrase.
pub type KeyphraseResult = BTreeMap<u32, String>;

/// One shard's extraction output: document-id → ranked phrases.
pub type ShardKeyphrases = BTreeMap<DocumentId, KeyphraseResult>;

/// Persistence contract between pipeline stages.
///
/// Each (stage, shard) artifact is written once by the driver and is
/// self-contained: reading it never requires another shard.
pub trait StageStore: Send + Sync {
    /// Whether an artifact exists for the shard at this stage.
    fn exists(&self, stage: Stage, shard: &str) -> bool;

    /// Shards with an artifact at this stage, sorted by name.
    fn list(&self, stage: Stage) -> Result<Vec<ShardName>>;

    /// Read a text artifact (`Parsed` or `Normalized`).
    fn read_texts(&self, stage: Stage, shard: &str) -> Result<ShardTexts>;

    /// Write a text artifact (`Parsed` or `Normalized`).
    fn write_texts(&self, stage: Stage, shard: &str, docs: &ShardTexts) -> Result<()>;

    /// Read the `Extracted` artifact.
    fn read_keyphrases(&self, shard: &str) -> Result<ShardKeyphrases>;

    /// Write the `Extracted` artifact.
    fn write_keyphrases(&self, shard: &str, docs: &ShardKeyphrases) -> Result<()>;
}

/// Guard used by implementations: text artifacts only exist for the two middle stages.
pub(crate) fn ensure_text_stage(stage: Stage) -> Result<()> {
    match stage {
        Stage::Parsed | Stage::Normalized => Ok(()),
        other => Err(phrasemine_core::Error::Storage(format!(
            "stage '{}' does not hold text artifacts",
            other
        ))),
    }
}
