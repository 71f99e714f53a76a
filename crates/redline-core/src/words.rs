//! Word-level diffing of two text runs.

use std::collections::BTreeSet;

/// Tokens present in exactly one of the two texts.
///
/// Each text is split on whitespace runs; the result is the symmetric
/// difference of the two token sets. Tokens are compared byte-exactly (no
/// case folding, no punctuation stripping), so `"Word"` and `"word"`, or
/// `"end."` and `"end"`, are distinct. Duplicates collapse; the returned set
/// iterates in lexicographic order, which keeps downstream annotation
/// emission (and thus output files) reproducible across runs.
pub fn differing_words(new_text: &str, old_text: &str) -> BTreeSet<String> {
    let new_words: BTreeSet<&str> = new_text.split_whitespace().collect();
    let old_words: BTreeSet<&str> = old_text.split_whitespace().collect();

    new_words
        .symmetric_difference(&old_words)
        .map(|w| w.to_string())
        .collect()
}
