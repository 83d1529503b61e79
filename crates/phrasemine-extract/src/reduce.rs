//! Reduction of selected `(phrase, score)` pairs to a ranked keyphrase result.

use phrasemine_store::KeyphraseResult;

/// Sort by descending score, drop repeated phrases (the first, highest
/// occurrence wins) and number the survivors `1..=k`, `k <= top_n`.
///
/// Equal scores keep their selection order, so no phrase is lost to a tie.
pub fn rank(mut selected: Vec<(String, f32)>, top_n: usize) -> KeyphraseResult {
    selected.sort_by(|a, b| sort_key(b.1).total_cmp(&sort_key(a.1)));

    let mut seen = std::collections::HashSet::new();
    selected
        .into_iter()
        .filter(|(phrase, _)| seen.insert(phrase.clone()))
        .take(top_n)
        .zip(1u32..)
        .map(|((phrase, _), rank)| (rank, phrase))
        .collect()
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
