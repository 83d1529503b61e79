//! LRU cache for phrase embeddings.
//!
//! Candidate n-grams repeat heavily across the documents of a shard, so the
//! same phrase would otherwise be embedded thousands of times.
//! Default: 100k entries.

use std::collections::{BTreeMap, HashMap};

use ndarray::Array1;
use parking_lot::Mutex;

use crate::embedder::EmbedderBackend;
use phrasemine_core::{Error, Result};

/// Thread-safe LRU embedding cache.
pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    /// key → (embedding, last-use tick)
    entries: HashMap<String, (Array1<f32>, u64)>,
    /// last-use tick → key; the first entry is the eviction candidate
    order: BTreeMap<u64, String>,
    tick: u64,
    max_size: usize,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

impl EmbeddingCache {
    /// Create a new cache with the given capacity.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size.min(1 << 16)),
                order: BTreeMap::new(),
                tick: 0,
                max_size,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Create a cache with default settings (100k entries).
    pub fn default_cache() -> Self {
        Self::new(100_000)
    }

    /// Get a cached embedding, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let tick = inner.next_tick();
        let Some((embedding, last)) = inner.entries.get_mut(key).map(|(e, last)| {
            let prev = *last;
            *last = tick;
            (e.clone(), prev)
        }) else {
            inner.misses += 1;
            return None;
        };
        inner.hits += 1;
        inner.order.remove(&last);
        inner.order.insert(tick, key.to_string());
        Some(embedding)
    }

    /// Insert an embedding, evicting the least recently used entry at capacity.
    pub fn put(&self, key: String, embedding: Array1<f32>) {
        let mut inner = self.inner.lock();
        let tick = inner.next_tick();

        if let Some((_, last)) = inner.entries.remove(&key) {
            inner.order.remove(&last);
        }

        while inner.entries.len() >= inner.max_size {
            match inner.order.pop_first() {
                Some((_, oldest)) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        inner.order.insert(tick, key.clone());
        inner.entries.insert(key, (embedding, tick));
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        let inner = self.inner.lock();
        (inner.hits, inner.misses)
    }
}

/// Embedder wrapper that serves repeated texts from an `EmbeddingCache`.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: EmbeddingCache,
}

impl<E: EmbedderBackend> CachedEmbedder<E> {
    pub fn new(inner: E, cache: EmbeddingCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

impl<E: EmbedderBackend> EmbedderBackend for CachedEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(hit);
        }
        let embedding = self.inner.embed(text)?;
        self.cache.put(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Only misses reach the wrapped backend, in one batch call.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        let mut out: Vec<Option<Array1<f32>>> = texts.iter().map(|t| self.cache.get(t)).collect();
        let missing: Vec<usize> = (0..texts.len()).filter(|&i| out[i].is_none()).collect();

        if !missing.is_empty() {
            let miss_texts: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let fresh = self.inner.embed_batch(&miss_texts)?;
            if fresh.len() != missing.len() {
                return Err(Error::Inference(format!(
                    "{} returned {} embeddings for {} texts",
                    self.inner.name(),
                    fresh.len(),
                    missing.len()
                )));
            }
            for (&i, embedding) in missing.iter().zip(fresh) {
                self.cache.put(texts[i].to_string(), embedding.clone());
                out[i] = Some(embedding);
            }
        }

        Ok(out.into_iter().flatten().collect())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
