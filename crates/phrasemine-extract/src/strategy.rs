//! Diversification strategies over a document's candidate pool.
//!
//! Both strategies take candidates sorted by descending relevance (as the
//! scorer returns them) and yield `(phrase, relevance)` pairs, relevance
//! rounded to 4 decimals.

use ndarray::Array2;
use tracing::debug;

use phrasemine_core::{Diversification, PipelineConfig};
use phrasemine_infer::{cosine, ScoredCandidate};

/// Subsets examined exhaustively before max-sum falls back to greedy selection.
const MAX_SUM_COMBINATIONS: u128 = 200_000;

/// Similarity sums closer than this are treated as equal.
const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiversificationStrategy {
    /// Max-sum-similarity: the `top_n` subset with the least pairwise similarity.
    MaxSum,
    /// Maximum marginal relevance with a diversity coefficient in [0, 1].
    Mmr { diversity: f32 },
}

impl DiversificationStrategy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        match config.diversification {
            Diversification::Mss => Self::MaxSum,
            Diversification::Mmr => Self::Mmr {
                diversity: config.diversity,
            },
        }
    }

    /// Pick up to `top_n` phrases from the candidate pool.
    pub fn select(&self, candidates: &[ScoredCandidate], top_n: usize) -> Vec<(String, f32)> {
        if candidates.is_empty() || top_n == 0 {
            return Vec::new();
        }
        let picked = match *self {
            Self::MaxSum => max_sum(candidates, top_n),
            Self::Mmr { diversity } => mmr(candidates, top_n, diversity),
        };
        picked
            .into_iter()
            .map(|i| (candidates[i].phrase.clone(), round4(candidates[i].relevance)))
            .collect()
    }
}

fn round4(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

fn similarity_matrix(candidates: &[ScoredCandidate]) -> Array2<f32> {
    let n = candidates.len();
    let mut sim = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let s = cosine(&candidates[i].embedding, &candidates[j].embedding);
            sim[[i, j]] = s;
            sim[[j, i]] = s;
        }
    }
    sim
}

fn max_sum(candidates: &[ScoredCandidate], top_n: usize) -> Vec<usize> {
    let n = candidates.len();
    if n <= top_n {
        return (0..n).collect();
    }
    let sim = similarity_matrix(candidates);
    if binomial(n, top_n) > MAX_SUM_COMBINATIONS {
        debug!(
            "max-sum over {} candidates choose {} exceeds exhaustive limit, using greedy selection",
            n, top_n
        );
        return max_sum_greedy(candidates, &sim, top_n);
    }

    let mut combo: Vec<usize> = (0..top_n).collect();
    let mut best: Vec<usize> = combo.clone();
    let mut best_sim = f32::INFINITY;
    let mut best_rel = f32::NEG_INFINITY;
    loop {
        let mut pair_sum = 0.0f32;
        for (a, &i) in combo.iter().enumerate() {
            for &j in &combo[a + 1..] {
                pair_sum += sim[[i, j]];
            }
        }
        let rel_sum: f32 = combo.iter().map(|&i| candidates[i].relevance).sum();
        let better = pair_sum < best_sim - EPSILON
            || ((pair_sum - best_sim).abs() <= EPSILON && rel_sum > best_rel);
        if better {
            best_sim = pair_sum;
            best_rel = rel_sum;
            best.clone_from(&combo);
        }
        if !next_combination(&mut combo, n) {
            break;
        }
    }
    best
}

/// Start from the most relevant candidate, then repeatedly add the one with
/// the least summed similarity to those already picked.
fn max_sum_greedy(candidates: &[ScoredCandidate], sim: &Array2<f32>, top_n: usize) -> Vec<usize> {
    let n = candidates.len();
    let mut picked = vec![0usize];
    let mut remaining: Vec<usize> = (1..n).collect();
    while picked.len() < top_n && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_sum = f32::INFINITY;
        for (pos, &c) in remaining.iter().enumerate() {
            let s: f32 = picked.iter().map(|&p| sim[[c, p]]).sum();
            if s < best_sum - EPSILON {
                best_sum = s;
                best_pos = pos;
            }
        }
        picked.push(remaining.remove(best_pos));
    }
    picked.sort_unstable();
    picked
}

fn mmr(candidates: &[ScoredCandidate], top_n: usize, diversity: f32) -> Vec<usize> {
    let n = candidates.len();
    let sim = similarity_matrix(candidates);

    let mut first = 0;
    for i in 1..n {
        if candidates[i].relevance > candidates[first].relevance {
            first = i;
        }
    }
    let mut picked = vec![first];
    let mut remaining: Vec<usize> = (0..n).filter(|&i| i != first).collect();

    while picked.len() < top_n && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &c) in remaining.iter().enumerate() {
            let max_sim = picked
                .iter()
                .map(|&p| sim[[c, p]])
                .fold(f32::NEG_INFINITY, f32::max);
            let score = diversity * (1.0 - max_sim) + (1.0 - diversity) * candidates[c].relevance;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        picked.push(remaining.remove(best_pos));
    }
    picked
}

/// n choose k, saturating just above the exhaustive-search limit.
fn binomial(n: usize, k: usize) -> u128 {
    let k = k.min(n - k) as u128;
    let n = n as u128;
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) / (i + 1);
        if acc > MAX_SUM_COMBINATIONS {
            return MAX_SUM_COMBINATIONS + 1;
        }
    }
    acc
}

/// Advance `combo` to the next k-combination of `0..n` in lexicographic order.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combo[i] < n - k + i {
            combo[i] += 1;
            for j in (i + 1)..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
