//! PhraseMine Infer: embedding backends, phrase cache, candidate generation and scoring.
//!
//! Provides the `EmbedderBackend` trait for sentence embeddings and the
//! `CandidateScorer` capability the extractor depends on. When the `onnx`
//! feature is enabled and model files are present, `OnnxEmbedder` runs the
//! configured SentenceTransformers model. Without it, `HashingEmbedder`
//! gives deterministic lexical embeddings so the pipeline still runs offline.

pub mod cache;
pub mod candidates;
pub mod embedder;
pub mod hashing;
pub mod onnx_embedder;
pub mod scorer;

pub use cache::{CachedEmbedder, EmbeddingCache};
pub use candidates::{is_stop_word, CandidateGenerator, ENGLISH_STOP_WORDS};
pub use embedder::{cosine, l2_normalize, EmbedderBackend};
pub use hashing::HashingEmbedder;
pub use scorer::{CandidateScorer, EmbeddingScorer, ScoredCandidate};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

use phrasemine_core::EmbeddingModel;

/// Create the best available embedder for the given model directory.
///
/// Tries ONNX first (if feature enabled and model files present),
/// falls back to `HashingEmbedder` of the model's dimension. Either way the
/// backend is wrapped in a phrase cache.
pub fn create_embedder(model_dir: &Path, model: EmbeddingModel) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir, model) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(CachedEmbedder::new(embedder, EmbeddingCache::default_cache()));
            }
            Err(e) => {
                tracing::warn!(
                    "ONNX embedder unavailable: {}. Falling back to hashing embedder.",
                    e
                );
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::warn!(
            "ONNX feature disabled, model at {} not loaded. Using hashing embedder.",
            model_dir.display()
        );
    }

    Arc::new(CachedEmbedder::new(
        HashingEmbedder::new(model.dimension()),
        EmbeddingCache::default_cache(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_embedder_matches_model_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = create_embedder(dir.path(), EmbeddingModel::default());
        assert_eq!(embedder.dimension(), EmbeddingModel::default().dimension());
        let v = embedder.embed("heat exchanger").unwrap();
        assert_eq!(v.len(), embedder.dimension());
    }
}
