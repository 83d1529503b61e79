//! PhraseMine Ingest: bundle expansion, parallel tag extraction, text normalization.

pub mod archive;
pub mod normalize;
pub mod parser;

pub use archive::{extract_bundles, shard_directories, ArchiveReport};
pub use normalize::{normalize, normalize_shard};
pub use parser::{build_pool, DocumentParser, ParsedShard};
