//! Readability scoring for edugen content.
//!
//! Computes six published formulas from sentence, word, syllable and letter
//! counts: Flesch-Kincaid grade, SMOG, Coleman-Liau, ARI, Linsear Write and
//! Dale-Chall. Scores are rounded to two decimals. Text with no words yields
//! an all-zero [`ReadabilityReport`] whose
//! [`is_sufficient`](ReadabilityReport::is_sufficient) is false.

mod text;

use edugen_shared::{ReadabilityReport, Section, TextStats};
use tracing::{debug, instrument};

/// Number of leading words the Linsear Write formula samples.
const LINSEAR_SAMPLE_WORDS: usize = 100;

/// Minimum sentences SMOG is defined for.
const SMOG_MIN_SENTENCES: usize = 3;

/// Score `text` with all six formulas.
#[instrument(skip_all, fields(chars = text.len()))]
pub fn analyze(text: &str) -> ReadabilityReport {
    let stats = text_stats(text);

    if stats.words == 0 {
        debug!("no words to score");
        return ReadabilityReport {
            stats,
            ..Default::default()
        };
    }

    let report = ReadabilityReport {
        flesch_kincaid_grade: round2(flesch_kincaid_grade(&stats)),
        smog_index: round2(smog_index(&stats)),
        coleman_liau_index: round2(coleman_liau_index(&stats)),
        automated_readability_index: round2(automated_readability_index(&stats)),
        linsear_write_formula: round2(linsear_write_formula(text)),
        dale_chall_score: round2(dale_chall_score(&stats)),
        stats,
    };

    debug!(
        fk = report.flesch_kincaid_grade,
        words = stats.words,
        sentences = stats.sentences,
        "readability computed"
    );

    report
}

/// Gather the raw counts for `text`.
pub fn text_stats(text: &str) -> TextStats {
    let words = text::words(text);
    if words.is_empty() {
        return TextStats::default();
    }

    let mut stats = TextStats {
        sentences: text::sentence_count(text),
        words: words.len(),
        ..Default::default()
    };

    for word in &words {
        let syl = text::syllables(word);
        stats.syllables += syl;
        if syl >= 3 {
            stats.polysyllables += 1;
        }
        if text::is_difficult(word) {
            stats.difficult_words += 1;
        }
        stats.letters += word.chars().filter(|c| c.is_alphabetic()).count();
        stats.characters += word.chars().filter(|c| c.is_alphanumeric()).count();
    }

    stats
}

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

/// Build the scored text from a persisted content document.
///
/// Concatenates `title`, `summary` and each `sections[].content`, each
/// followed by `". "`. Missing or non-string fields are skipped.
pub fn extract_text(doc: &serde_json::Value) -> String {
    let mut out = String::new();

    for key in ["title", "summary"] {
        if let Some(s) = doc.get(key).and_then(|v| v.as_str()) {
            push_sentence(&mut out, s);
        }
    }

    if let Some(sections) = doc.get("sections").and_then(|v| v.as_array()) {
        for section in sections {
            if let Some(s) = section.get("content").and_then(|v| v.as_str()) {
                push_sentence(&mut out, s);
            }
        }
    }

    out
}

/// Same layout as [`extract_text`], from typed parts.
pub fn compose_text(title: &str, summary: Option<&str>, sections: &[Section]) -> String {
    let mut out = String::new();
    push_sentence(&mut out, title);
    if let Some(summary) = summary {
        push_sentence(&mut out, summary);
    }
    for section in sections {
        push_sentence(&mut out, &section.content);
    }
    out
}

fn push_sentence(out: &mut String, s: &str) {
    out.push_str(s);
    out.push_str(". ");
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

fn words_per_sentence(s: &TextStats) -> f64 {
    s.words as f64 / s.sentences as f64
}

fn flesch_kincaid_grade(s: &TextStats) -> f64 {
    0.39 * words_per_sentence(s) + 11.8 * (s.syllables as f64 / s.words as f64) - 15.59
}

fn smog_index(s: &TextStats) -> f64 {
    if s.sentences < SMOG_MIN_SENTENCES {
        return 0.0;
    }
    1.043 * (s.polysyllables as f64 * 30.0 / s.sentences as f64).sqrt() + 3.1291
}

fn coleman_liau_index(s: &TextStats) -> f64 {
    let letters_per_100 = s.letters as f64 / s.words as f64 * 100.0;
    let sentences_per_100 = s.sentences as f64 / s.words as f64 * 100.0;
    0.0588 * letters_per_100 - 0.296 * sentences_per_100 - 15.8
}

fn automated_readability_index(s: &TextStats) -> f64 {
    4.71 * (s.characters as f64 / s.words as f64) + 0.5 * words_per_sentence(s) - 21.43
}

fn linsear_write_formula(text: &str) -> f64 {
    let sample: Vec<&str> = text.split_whitespace().take(LINSEAR_SAMPLE_WORDS).collect();
    let sample_text = sample.join(" ");

    let (easy, hard) = text::words(&sample_text)
        .iter()
        .fold((0usize, 0usize), |(easy, hard), w| {
            if text::syllables(w) < 3 {
                (easy + 1, hard)
            } else {
                (easy, hard + 1)
            }
        });

    let r = (easy + hard * 3) as f64 / text::sentence_count(&sample_text) as f64;
    if r > 20.0 { r / 2.0 } else { (r - 2.0) / 2.0 }
}

fn dale_chall_score(s: &TextStats) -> f64 {
    let pct_difficult = s.difficult_words as f64 / s.words as f64 * 100.0;
    let mut score = 0.1579 * pct_difficult + 0.0496 * words_per_sentence(s);
    if pct_difficult > 5.0 {
        score += 3.6365;
    }
    score
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
