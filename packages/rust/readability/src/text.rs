//! Tokenization and counting primitives behind the readability formulas.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Dale-Chall familiar words, lowercase, whitespace separated.
static EASY_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| include_str!("easy_words.txt").split_whitespace().collect());

/// Split text into words: whitespace tokens with surrounding punctuation
/// removed. Tokens without a letter or digit are dropped.
pub(crate) fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .map(|tok| tok.trim_matches('\''))
        .filter(|tok| tok.chars().any(char::is_alphanumeric))
        .collect()
}

/// Count sentences. Fragments of two words or fewer are not counted, and a
/// text with any words has at least one sentence.
pub(crate) fn sentence_count(text: &str) -> usize {
    static SENTENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b[^.!?]+[.!?]*").expect("valid regex"));

    let fragments: Vec<&str> = SENTENCE_RE.find_iter(text).map(|m| m.as_str()).collect();
    let ignored = fragments.iter().filter(|s| words(s).len() <= 2).count();

    (fragments.len() - ignored).max(1)
}

/// Estimate the syllables in one word from its vowel groups.
pub(crate) fn syllables(word: &str) -> usize {
    let w: String = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if w.is_empty() {
        return 0;
    }
    if w.chars().count() <= 3 {
        return 1;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for c in w.chars() {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // Silent endings: "make", "jumped", "makes".
    if count > 1 {
        if w.ends_with('e') && !w.ends_with("le") && !w.ends_with("ee") {
            count -= 1;
        } else if w.ends_with("ed") && !w.ends_with("ted") && !w.ends_with("ded") {
            count -= 1;
        } else if w.ends_with("es")
            && !["ses", "zes", "ces", "ges", "xes", "shes", "ches"]
                .iter()
                .any(|suffix| w.ends_with(suffix))
        {
            count -= 1;
        }
    }

    count.max(1)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Whether `word` is on the familiar list, allowing regular inflections.
pub(crate) fn is_familiar(word: &str) -> bool {
    let w = word.to_lowercase();
    if EASY_WORDS.contains(w.as_str()) {
        return true;
    }

    // Regular inflections of familiar words count as familiar.
    const SUFFIXES: [&str; 8] = ["s", "es", "ed", "d", "ing", "er", "est", "ly"];
    if SUFFIXES.iter().any(|suffix| {
        w.strip_suffix(suffix)
            .is_some_and(|stem| !stem.is_empty() && EASY_WORDS.contains(stem))
    }) {
        return true;
    }

    ["ies", "ied", "ier", "iest", "ily"].iter().any(|suffix| {
        w.strip_suffix(suffix)
            .is_some_and(|stem| EASY_WORDS.contains(format!("{stem}y").as_str()))
    })
}

/// A word the Dale-Chall formula treats as difficult.
pub(crate) fn is_difficult(word: &str) -> bool {
    !word.chars().all(|c| c.is_ascii_digit()) && syllables(word) >= 2 && !is_familiar(word)
}
