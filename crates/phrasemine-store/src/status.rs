//! Shard status lookup: shard → latest completed stage.
//!
//! Status is derived from which artifacts the store holds. The driver asks
//! this lookup before recomputing anything.

use std::collections::BTreeMap;

use crate::types::StageStore;
use phrasemine_core::{ShardName, Stage};

pub struct ShardStatus;

impl ShardStatus {
    /// Latest stage the shard has completed. `Raw` when no artifact exists.
    pub fn resolve(store: &dyn StageStore, shard: &str) -> Stage {
        Stage::PERSISTED
            .iter()
            .rev()
            .copied()
            .find(|&stage| store.exists(stage, shard))
            .unwrap_or(Stage::Raw)
    }

    /// Status of every named shard.
    pub fn snapshot<'a, I>(store: &dyn StageStore, shards: I) -> BTreeMap<ShardName, Stage>
    where
        I: IntoIterator<Item = &'a ShardName>,
    {
        shards
            .into_iter()
            .map(|shard| (shard.clone(), Self::resolve(store, shard)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStageStore;
    use crate::types::{ShardKeyphrases, ShardTexts};

    #[test]
    fn test_resolve_latest_stage() {
        let store = MemoryStageStore::new();
        assert_eq!(ShardStatus::resolve(&store, "s"), Stage::Raw);

        store.write_texts(Stage::Parsed, "s", &ShardTexts::new()).unwrap();
        assert_eq!(ShardStatus::resolve(&store, "s"), Stage::Parsed);

        store
            .write_texts(Stage::Normalized, "s", &ShardTexts::new())
            .unwrap();
        assert_eq!(ShardStatus::resolve(&store, "s"), Stage::Normalized);

        store.write_keyphrases("s", &ShardKeyphrases::new()).unwrap();
        assert_eq!(ShardStatus::resolve(&store, "s"), Stage::Extracted);
    }

    #[test]
    fn test_snapshot() {
        let store = MemoryStageStore::new();
        store.write_keyphrases("done", &ShardKeyphrases::new()).unwrap();
        let shards = vec!["done".to_string(), "fresh".to_string()];
        let status = ShardStatus::snapshot(&store, &shards);
        assert_eq!(status["done"], Stage::Extracted);
        assert_eq!(status["fresh"], Stage::Raw);
    }
}
