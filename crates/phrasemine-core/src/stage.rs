//! Per-shard stage model.

use serde::{Deserialize, Serialize};

/// Name of a shard: one expanded bundle directory or one stage artifact stem.
pub type ShardName = String;

/// Pipeline stages a shard moves through, strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Expanded documents on disk, nothing persisted yet.
    Raw,
    /// document-id → tag text.
    Parsed,
    /// document-id → normalized text.
    Normalized,
    /// document-id → rank → phrase. Terminal.
    Extracted,
}

impl Stage {
    /// Stages that persist an artifact in the Stage Store.
    pub const PERSISTED: [Stage; 3] = [Stage::Parsed, Stage::Normalized, Stage::Extracted];

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::Raw => Some(Self::Parsed),
            Self::Parsed => Some(Self::Normalized),
            Self::Normalized => Some(Self::Extracted),
            Self::Extracted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Extracted
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Parsed => write!(f, "parsed"),
            Self::Normalized => write!(f, "normalized"),
            Self::Extracted => write!(f, "extracted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_sequence() {
        let mut stage = Stage::Raw;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![Stage::Raw, Stage::Parsed, Stage::Normalized, Stage::Extracted]
        );
        assert!(stage.is_terminal());
    }
}
