//! Regex text normalization applied to every parsed document.
//!
//! Four rewrites in fixed order: strip newlines, digits and apostrophes;
//! squash runs of non-word characters to a space; squash whitespace runs;
//! lower-case. Leading and trailing spaces are trimmed so the output is a
//! fixed point of the pipeline.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use phrasemine_store::ShardTexts;

static STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\d']").expect("strip regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("non-word regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Normalize one document's text. Pure and total.
pub fn normalize(text: &str) -> String {
    let stripped = STRIP.replace_all(text, "");
    let words = NON_WORD.replace_all(&stripped, " ");
    let collapsed = WHITESPACE.replace_all(&words, " ");
    collapsed.trim().to_lowercase()
}

/// Normalize every document of a shard. The key set is preserved exactly.
pub fn normalize_shard(docs: &ShardTexts) -> ShardTexts {
    docs.par_iter()
        .map(|(id, text)| (id.clone(), normalize(text)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patent_sentence() {
        let input = "The method comprises 3 steps: heating, cooling, and mixing.";
        assert_eq!(
            normalize(input),
            "the method comprises steps heating cooling and mixing"
        );
    }

    #[test]
    fn test_apostrophes_and_newlines_removed_before_squash() {
        // The apostrophe is dropped outright, so the word is not split.
        assert_eq!(normalize("device's\nhousing"), "deviceshousing");
        assert_eq!(normalize("A\n\nB"), "ab");
    }

    #[test]
    fn test_underscore_is_a_word_character() {
        assert_eq!(normalize("foo_bar -- baz"), "foo_bar baz");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("12345 ... !!!"), "");
    }

    #[test]
    fn test_unicode_letters_survive() {
        assert_eq!(normalize("Élément—Größe"), "élément größe");
    }

    #[test]
    fn test_shard_keys_preserved() {
        let mut docs = ShardTexts::new();
        docs.insert("a".into(), "Battery CHARGING circuit".into());
        docs.insert("b".into(), String::new());
        docs.insert("c".into(), "42".into());

        let out = normalize_shard(&docs);
        assert_eq!(out.len(), 3);
        assert_eq!(out["a"], "battery charging circuit");
        assert_eq!(out["b"], "");
        assert_eq!(out["c"], "");
    }
}
