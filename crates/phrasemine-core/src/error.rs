//! Error types for PhraseMine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No extractable text in shard {shard}")]
    EmptyContent { shard: String },

    #[error("Empty vocabulary: no candidate phrases in batch")]
    EmptyVocabulary,

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shard-level failures are reported and skipped; everything else aborts the run.
    pub fn is_shard_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent { .. }
                | Self::EmptyVocabulary
                | Self::Inference(_)
                | Self::Parse(_)
                | Self::Archive(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_local_classification() {
        assert!(Error::EmptyContent { shard: "a".into() }.is_shard_local());
        assert!(Error::Inference("model".into()).is_shard_local());
        assert!(!Error::Storage("disk full".into()).is_shard_local());
        assert!(!Error::Config("top_n".into()).is_shard_local());
    }

    #[test]
    fn test_empty_content_message_names_shard() {
        let err = Error::EmptyContent {
            shard: "ongoing_100001_120000".into(),
        };
        assert!(err.to_string().contains("ongoing_100001_120000"));
    }
}
