//! Embedding engine trait and shared vector helpers.
//!
//! The `EmbedderBackend` trait abstracts over sentence embedding generation.
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with a SentenceTransformers export (requires `onnx`)
//! - `HashingEmbedder`: deterministic feature-hashing vectors, no model files needed
//! - `CachedEmbedder`: memoising wrapper around either

use ndarray::Array1;
use phrasemine_core::Result;

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    fn embed(&self, text: &str) -> Result<Array1<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Short backend description for logs.
    fn name(&self) -> &str;
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    let na = a.dot(a).sqrt();
    let nb = b.dot(b).sqrt();
    if na < 1e-12 || nb < 1e-12 {
        return 0.0;
    }
    a.dot(b) / (na * nb)
}

/// Scale to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut Array1<f32>) {
    let norm = v.dot(v).sqrt();
    if norm > 1e-12 {
        v.mapv_inplace(|x| x / norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine() {
        let a = array![1.0, 0.0];
        let b = array![0.0, 2.0];
        assert_eq!(cosine(&a, &b), 0.0);
        assert!((cosine(&a, &array![3.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&a, &array![0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = array![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = array![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, array![0.0, 0.0]);
    }
}
