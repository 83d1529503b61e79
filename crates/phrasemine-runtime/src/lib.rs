//! Pipeline driver: moves every shard through `Raw → Parsed → Normalized → Extracted`.
//!
//! Completed stages are read back from the Stage Store instead of being
//! recomputed, and a shard-level failure is reported without stopping the
//! other shards.

pub mod driver;
pub mod types;

pub use driver::PipelineDriver;
pub use types::*;
