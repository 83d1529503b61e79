//! Candidate scoring: the embed-and-score capability behind keyphrase extraction.
//!
//! For each document the scorer generates candidate phrases, embeds the
//! document and every candidate, and keeps the `nr_candidates` phrases most
//! similar to the document. Embeddings travel with the candidates so the
//! diversification step can compare phrases with each other.

use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array1;
use tracing::debug;

use crate::candidates::CandidateGenerator;
use crate::embedder::{cosine, EmbedderBackend};
use phrasemine_core::{Error, PipelineConfig, Result};

/// One candidate phrase with its relevance to the source document.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub phrase: String,
    /// Cosine similarity to the document embedding.
    pub relevance: f32,
    pub embedding: Array1<f32>,
}

/// Scores candidate phrases for a batch of documents.
///
/// Returns one candidate list per input document, each sorted by descending
/// relevance (ties keep generation order). Documents without candidates get
/// an empty list. `Error::EmptyVocabulary` means the whole batch produced no
/// candidate at all.
pub trait CandidateScorer: Send + Sync {
    fn score_batch(&self, docs: &[&str]) -> Result<Vec<Vec<ScoredCandidate>>>;
}

/// `CandidateScorer` built on an `EmbedderBackend`.
pub struct EmbeddingScorer {
    embedder: Arc<dyn EmbedderBackend>,
    generator: CandidateGenerator,
    nr_candidates: usize,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn EmbedderBackend>, config: &PipelineConfig) -> Self {
        Self {
            embedder,
            generator: CandidateGenerator::new(config.ngram_range),
            nr_candidates: config.nr_candidates,
        }
    }
}

impl CandidateScorer for EmbeddingScorer {
    fn score_batch(&self, docs: &[&str]) -> Result<Vec<Vec<ScoredCandidate>>> {
        let per_doc: Vec<Vec<String>> = docs.iter().map(|d| self.generator.candidates(d)).collect();

        // Embed every distinct phrase in the batch once.
        let mut vocab: Vec<&str> = Vec::new();
        let mut vocab_index: HashMap<&str, usize> = HashMap::new();
        for phrase in per_doc.iter().flatten() {
            if !vocab_index.contains_key(phrase.as_str()) {
                vocab_index.insert(phrase.as_str(), vocab.len());
                vocab.push(phrase.as_str());
            }
        }
        if vocab.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let phrase_embeddings = self.embedder.embed_batch(&vocab)?;
        if phrase_embeddings.len() != vocab.len() {
            return Err(Error::Inference(format!(
                "{} returned {} embeddings for {} phrases",
                self.embedder.name(),
                phrase_embeddings.len(),
                vocab.len()
            )));
        }

        let with_text: Vec<usize> = (0..docs.len()).filter(|&i| !per_doc[i].is_empty()).collect();
        let texts: Vec<&str> = with_text.iter().map(|&i| docs[i]).collect();
        let doc_embeddings = self.embedder.embed_batch(&texts)?;
        if doc_embeddings.len() != texts.len() {
            return Err(Error::Inference(format!(
                "{} returned {} embeddings for {} documents",
                self.embedder.name(),
                doc_embeddings.len(),
                texts.len()
            )));
        }

        let mut out: Vec<Vec<ScoredCandidate>> = vec![Vec::new(); docs.len()];
        for (&i, doc_embedding) in with_text.iter().zip(doc_embeddings.iter()) {
            let mut scored: Vec<ScoredCandidate> = per_doc[i]
                .iter()
                .map(|phrase| {
                    let embedding = phrase_embeddings[vocab_index[phrase.as_str()]].clone();
                    ScoredCandidate {
                        phrase: phrase.clone(),
                        relevance: cosine(doc_embedding, &embedding),
                        embedding,
                    }
                })
                .collect();
            scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
            scored.truncate(self.nr_candidates);
            out[i] = scored;
        }

        debug!(
            "Scored {} documents ({} distinct phrases) with {}",
            docs.len(),
            vocab.len(),
            self.embedder.name()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scorer(nr_candidates: usize) -> EmbeddingScorer {
        let config = PipelineConfig {
            nr_candidates,
            top_n: nr_candidates.min(5),
            ..Default::default()
        };
        EmbeddingScorer::new(Arc::new(HashingEmbedder::new(256)), &config)
    }

    #[test]
    fn test_empty_document_gets_empty_list() {
        let out = scorer(10)
            .score_batch(&["battery charging circuit", ""])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(!out[0].is_empty());
        assert!(out[1].is_empty());
    }

    #[test]
    fn test_sorted_and_bounded_by_pool_size() {
        let out = scorer(3)
            .score_batch(&["lithium battery charging circuit with thermal sensor"])
            .unwrap();
        assert_eq!(out[0].len(), 3);
        assert!(out[0].windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }

    #[test]
    fn test_batch_without_vocabulary_is_error() {
        let err = scorer(5).score_batch(&["", "the of and"]).unwrap_err();
        assert!(matches!(err, Error::EmptyVocabulary));
    }

    /// Answers the first batch (phrases) in full and every later one short.
    struct ShortDocBatches {
        inner: HashingEmbedder,
        batches: AtomicUsize,
    }

    impl EmbedderBackend for ShortDocBatches {
        fn embed(&self, text: &str) -> Result<Array1<f32>> {
            self.inner.embed(text)
        }
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            let mut out = self.inner.embed_batch(texts)?;
            if self.batches.fetch_add(1, Ordering::SeqCst) > 0 {
                out.pop();
            }
            Ok(out)
        }
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
        fn name(&self) -> &str {
            "short-docs"
        }
    }

    #[test]
    fn test_short_document_embeddings_are_inference_error() {
        let embedder = ShortDocBatches {
            inner: HashingEmbedder::new(64),
            batches: AtomicUsize::new(0),
        };
        let scorer = EmbeddingScorer::new(Arc::new(embedder), &PipelineConfig::default());
        let err = scorer
            .score_batch(&["battery charging circuit", "thermal sensor array"])
            .unwrap_err();
        assert!(matches!(err, Error::Inference(_)), "got {:?}", err);
    }
}
