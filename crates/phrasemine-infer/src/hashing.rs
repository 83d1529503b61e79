//! Feature-hashing embedder used when no ONNX model is available.
//!
//! Each text becomes a bag of word unigrams and character trigrams hashed
//! into a fixed number of signed buckets, then L2-normalised. Phrases that
//! share words or sub-word fragments land close together, which is enough
//! for candidate ranking and diversification to behave sensibly offline.

use ndarray::Array1;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::embedder::{l2_normalize, EmbedderBackend};
use phrasemine_core::Result;

const WORD_SEED: u64 = 0x5eed_0001;
const TRIGRAM_SEED: u64 = 0x5eed_0003;
const TRIGRAM_WEIGHT: f32 = 0.5;

pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn add_feature(&self, v: &mut Array1<f32>, feature: &[u8], seed: u64, weight: f32) {
        let h = xxh3_64_with_seed(feature, seed);
        let bucket = (h % self.dim as u64) as usize;
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign * weight;
    }
}

impl EmbedderBackend for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let mut v = Array1::zeros(self.dim);
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            self.add_feature(&mut v, word.as_bytes(), WORD_SEED, 1.0);

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for tri in padded.windows(3) {
                let gram: String = tri.iter().collect();
                self.add_feature(&mut v, gram.as_bytes(), TRIGRAM_SEED, TRIGRAM_WEIGHT);
            }
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
