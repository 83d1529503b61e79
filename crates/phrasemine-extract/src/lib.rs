//! PhraseMine Extract: candidate diversification and ranked keyphrase results.
//!
//! Scored candidates come from a `CandidateScorer`; one diversification
//! strategy picks the final phrases, and the reduction step turns them into
//! the canonical rank → phrase mapping stored per document.

pub mod extractor;
pub mod reduce;
pub mod strategy;

pub use extractor::KeyphraseExtractor;
pub use reduce::rank;
pub use strategy::DiversificationStrategy;
