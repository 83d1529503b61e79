//! In-memory Stage Store for driver tests.
//!
//! Artifacts are kept as serialized JSON bytes so tests exercise the same
//! encoding as `FsStageStore` and can compare writes byte for byte.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::*;
use phrasemine_core::{Error, Result, ShardName, Stage};

#[derive(Default)]
pub struct MemoryStageStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    artifacts: BTreeMap<(Stage, ShardName), Vec<u8>>,
    writes: usize,
}

impl MemoryStageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total artifact writes since creation.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Raw serialized bytes of an artifact.
    pub fn artifact_bytes(&self, stage: Stage, shard: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .artifacts
            .get(&(stage, shard.to_string()))
            .cloned()
    }

    fn get<T: DeserializeOwned>(&self, stage: Stage, shard: &str) -> Result<T> {
        let inner = self.inner.lock();
        let bytes = inner
            .artifacts
            .get(&(stage, shard.to_string()))
            .ok_or_else(|| Error::Storage(format!("no {} artifact for {}", stage, shard)))?;
        Ok(serde_json::from_slice(bytes)?)
    }

    fn put<T: Serialize>(&self, stage: Stage, shard: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        let mut inner = self.inner.lock();
        inner.artifacts.insert((stage, shard.to_string()), bytes);
        inner.writes += 1;
        Ok(())
    }
}

impl StageStore for MemoryStageStore {
    fn exists(&self, stage: Stage, shard: &str) -> bool {
        self.inner
            .lock()
            .artifacts
            .contains_key(&(stage, shard.to_string()))
    }

    fn list(&self, stage: Stage) -> Result<Vec<ShardName>> {
        Ok(self
            .inner
            .lock()
            .artifacts
            .keys()
            .filter(|(s, _)| *s == stage)
            .map(|(_, shard)| shard.clone())
            .collect())
    }

    fn read_texts(&self, stage: Stage, shard: &str) -> Result<ShardTexts> {
        ensure_text_stage(stage)?;
        self.get(stage, shard)
    }

    fn write_texts(&self, stage: Stage, shard: &str, docs: &ShardTexts) -> Result<()> {
        ensure_text_stage(stage)?;
        self.put(stage, shard, docs)
    }

    fn read_keyphrases(&self, shard: &str) -> Result<ShardKeyphrases> {
        self.get(Stage::Extracted, shard)
    }

    fn write_keyphrases(&self, shard: &str, docs: &ShardKeyphrases) -> Result<()> {
        self.put(Stage::Extracted, shard, docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_counts() {
        let store = MemoryStageStore::new();
        let mut docs = ShardTexts::new();
        docs.insert("d1".into(), "text".into());

        store.write_texts(Stage::Parsed, "s1", &docs).unwrap();
        assert!(store.exists(Stage::Parsed, "s1"));
        assert_eq!(store.read_texts(Stage::Parsed, "s1").unwrap(), docs);
        assert_eq!(store.list(Stage::Parsed).unwrap(), vec!["s1"]);
        assert!(store.list(Stage::Normalized).unwrap().is_empty());
        assert_eq!(store.write_count(), 1);
    }
}
