//! PhraseMine Store: per-shard stage artifacts and shard status lookup.

pub mod fs;
pub mod memory;
pub mod status;
pub mod types;

pub use fs::FsStageStore;
pub use memory::MemoryStageStore;
pub use status::ShardStatus;
pub use types::*;
