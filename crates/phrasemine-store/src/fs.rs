//! Filesystem Stage Store: one `<shard>.json` file per shard per stage.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::types::*;
use phrasemine_core::{DataPaths, Error, Result, ShardName, Stage};

const ARTIFACT_EXT: &str = "json";

/// Stage Store backed by the `raw/`, `processed/` and `key_phrases/` directories.
#[derive(Debug, Clone)]
pub struct FsStageStore {
    parsed: PathBuf,
    normalized: PathBuf,
    extracted: PathBuf,
}

impl FsStageStore {
    /// Open the store over the stage directories of `paths`.
    pub fn new(paths: &DataPaths) -> Self {
        Self {
            parsed: paths.raw.clone(),
            normalized: paths.processed.clone(),
            extracted: paths.key_phrases.clone(),
        }
    }

    /// Path of the artifact for a shard at a persisted stage.
    pub fn artifact_path(&self, stage: Stage, shard: &str) -> Result<PathBuf> {
        let dir = self.stage_dir(stage)?;
        Ok(dir.join(format!("{}.{}", shard, ARTIFACT_EXT)))
    }

    fn stage_dir(&self, stage: Stage) -> Result<&Path> {
        match stage {
            Stage::Parsed => Ok(&self.parsed),
            Stage::Normalized => Ok(&self.normalized),
            Stage::Extracted => Ok(&self.extracted),
            Stage::Raw => Err(Error::Storage("raw shards have no artifact".into())),
        }
    }

    fn read_artifact<T: DeserializeOwned>(&self, stage: Stage, shard: &str) -> Result<T> {
        let path = self.artifact_path(stage, shard)?;
        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("open {}: {}", path.display(), e)))?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        debug!("Read {} artifact {}", stage, path.display());
        Ok(value)
    }

    /// Serialize to a sibling temp file, then rename into place.
    fn write_artifact<T: Serialize>(&self, stage: Stage, shard: &str, value: &T) -> Result<()> {
        let path = self.artifact_path(stage, shard)?;
        let tmp = path.with_extension(format!("{}.tmp", ARTIFACT_EXT));

        let file = File::create(&tmp)
            .map_err(|e| Error::Storage(format!("create {}: {}", tmp.display(), e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer
            .flush()
            .map_err(|e| Error::Storage(format!("flush {}: {}", tmp.display(), e)))?;
        drop(writer);

        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::Storage(format!("rename {}: {}", path.display(), e)))?;
        debug!("Wrote {} artifact {}", stage, path.display());
        Ok(())
    }
}

impl StageStore for FsStageStore {
    fn exists(&self, stage: Stage, shard: &str) -> bool {
        self.artifact_path(stage, shard)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn list(&self, stage: Stage) -> Result<Vec<ShardName>> {
        let dir = self.stage_dir(stage)?;
        let mut shards = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                shards.push(stem.to_string());
            }
        }
        shards.sort();
        Ok(shards)
    }

    fn read_texts(&self, stage: Stage, shard: &str) -> Result<ShardTexts> {
        ensure_text_stage(stage)?;
        self.read_artifact(stage, shard)
    }

    fn write_texts(&self, stage: Stage, shard: &str, docs: &ShardTexts) -> Result<()> {
        ensure_text_stage(stage)?;
        self.write_artifact(stage, shard, docs)
    }

    fn read_keyphrases(&self, shard: &str) -> Result<ShardKeyphrases> {
        self.read_artifact(Stage::Extracted, shard)
    }

    fn write_keyphrases(&self, shard: &str, docs: &ShardKeyphrases) -> Result<()> {
        self.write_artifact(Stage::Extracted, shard, docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (FsStageStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        (FsStageStore::new(&paths), dir)
    }

    fn sample_texts() -> ShardTexts {
        let mut docs = ShardTexts::new();
        docs.insert("US001.xml".into(), "battery charging circuit".into());
        docs.insert("US002.xml".into(), String::new());
        docs.insert("US003.xml".into(), "unicode é ß ✓ and \"quotes\"".into());
        docs
    }

    #[test]
    fn test_text_roundtrip() {
        let (store, _dir) = test_store();
        let docs = sample_texts();
        store.write_texts(Stage::Parsed, "shard_a", &docs).unwrap();

        assert!(store.exists(Stage::Parsed, "shard_a"));
        assert!(!store.exists(Stage::Normalized, "shard_a"));
        assert_eq!(store.read_texts(Stage::Parsed, "shard_a").unwrap(), docs);
    }

    #[test]
    fn test_keyphrase_roundtrip() {
        let (store, _dir) = test_store();
        let mut ranked = KeyphraseResult::new();
        ranked.insert(1, "charging circuit".into());
        ranked.insert(2, "battery".into());
        let mut docs = ShardKeyphrases::new();
        docs.insert("US001.xml".into(), ranked);
        docs.insert("US002.xml".into(), KeyphraseResult::new());

        store.write_keyphrases("shard_a", &docs).unwrap();
        assert_eq!(store.read_keyphrases("shard_a").unwrap(), docs);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let (store, _dir) = test_store();
        let docs = sample_texts();
        store.write_texts(Stage::Normalized, "s", &docs).unwrap();
        let path = store.artifact_path(Stage::Normalized, "s").unwrap();
        let first = std::fs::read(&path).unwrap();

        store.write_texts(Stage::Normalized, "s", &docs).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_list_ignores_temp_and_foreign_files() {
        let (store, dir) = test_store();
        store.write_texts(Stage::Parsed, "b", &sample_texts()).unwrap();
        store.write_texts(Stage::Parsed, "a", &sample_texts()).unwrap();
        std::fs::write(dir.path().join("raw").join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("raw").join("c.json.tmp"), "{").unwrap();

        assert_eq!(store.list(Stage::Parsed).unwrap(), vec!["a", "b"]);
        assert!(store.list(Stage::Extracted).unwrap().is_empty());
    }

    #[test]
    fn test_text_write_rejected_for_extracted_stage() {
        let (store, _dir) = test_store();
        let err = store
            .write_texts(Stage::Extracted, "s", &sample_texts())
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_missing_artifact_is_storage_error() {
        let (store, _dir) = test_store();
        assert!(matches!(
            store.read_texts(Stage::Parsed, "absent"),
            Err(Error::Storage(_))
        ));
    }
}
