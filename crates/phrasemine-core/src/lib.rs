//! PhraseMine Core: pipeline configuration, stage model, data directories, errors.

pub mod config;
pub mod error;
pub mod stage;

pub use config::{DataPaths, Diversification, EmbeddingModel, NgramRange, PipelineConfig};
pub use error::{Error, Result};
pub use stage::{ShardName, Stage};
