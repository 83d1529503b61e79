//! Runtime types.

use serde::Serialize;

use phrasemine_core::{ShardName, Stage};

/// What happened to one shard during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ShardOutcome {
    /// Every remaining stage ran and the keyphrase artifact was written.
    Completed {
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
        documents: usize,
    },
    /// The keyphrase artifact already existed; nothing was recomputed.
    AlreadyComplete,
    /// A shard-local error stopped the shard at `stage`.
    Failed { stage: Stage, reason: String },
}

/// Per-shard entry of a `RunReport`.
#[derive(Debug, Clone, Serialize)]
pub struct ShardReport {
    pub shard: ShardName,
    /// Latest completed stage when the run reached this shard.
    #[serde(rename = "resumedFrom")]
    pub resumed_from: Stage,
    pub outcome: ShardOutcome,
}

/// Result of one driver run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub shards: Vec<ShardReport>,
    /// Bundles that could not be expanded.
    #[serde(rename = "bundlesFailed")]
    pub bundles_failed: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, ShardOutcome::Completed { .. }))
    }

    pub fn already_complete(&self) -> usize {
        self.count(|o| matches!(o, ShardOutcome::AlreadyComplete))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ShardOutcome::Failed { .. }))
    }

    /// False only when shards failed and no shard has its keyphrases.
    pub fn exit_ok(&self) -> bool {
        self.failed() == 0 || self.completed() + self.already_complete() > 0
    }

    fn count(&self, pred: impl Fn(&ShardOutcome) -> bool) -> usize {
        self.shards.iter().filter(|s| pred(&s.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<ShardOutcome>) -> RunReport {
        RunReport {
            shards: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| ShardReport {
                    shard: format!("s{}", i),
                    resumed_from: Stage::Raw,
                    outcome,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn failed() -> ShardOutcome {
        ShardOutcome::Failed {
            stage: Stage::Extracted,
            reason: "empty".into(),
        }
    }

    #[test]
    fn test_exit_policy() {
        assert!(report(vec![]).exit_ok());
        assert!(report(vec![ShardOutcome::AlreadyComplete]).exit_ok());
        assert!(report(vec![
            failed(),
            ShardOutcome::Completed {
                elapsed_ms: 1,
                documents: 2
            }
        ])
        .exit_ok());
        assert!(!report(vec![failed()]).exit_ok());
        assert!(report(vec![failed(), ShardOutcome::AlreadyComplete]).exit_ok());
        assert!(!report(vec![failed(), failed()]).exit_ok());
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_value(report(vec![failed()])).unwrap();
        assert_eq!(json["shards"][0]["outcome"]["status"], "failed");
        assert_eq!(json["shards"][0]["outcome"]["stage"], "extracted");
        assert_eq!(json["shards"][0]["resumedFrom"], "raw");
        assert_eq!(json["bundlesFailed"], 0);
    }
}
