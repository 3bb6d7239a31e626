//! Sentence-level speech optimization.
//!
//! Cleans leftover markdown syntax, segments text into sentences, gives long
//! sentences breathing room, and converts emphasis markers into annotation
//! tags the synthesis side understands.

use once_cell::sync::Lazy;
use regex::Regex;
use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

/// Sentences longer than this get `[PAUSE]` markers before connectives.
pub const DEFAULT_LONG_SENTENCE_CHARS: usize = 200;

static HEADING_HASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("heading pattern"));
static HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:-{3,}|\*{3,})\s*$").expect("hr pattern"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s*").expect("quote pattern"));
static UNORDERED_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[*+-]\s+").expect("ul pattern"));
static ORDERED_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("ol pattern"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code pattern"));
static INLINE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern"));
static REFERENCE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").expect("ref link pattern"));

static CONNECTIVES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(and|but|however|therefore|moreover|furthermore)\b").expect("connective pattern")
});
static STRONG_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("strong emphasis pattern"));
static SLIGHT_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("slight emphasis pattern"));

static DETECTOR: OnceLock<SentenceDetectorDialog> = OnceLock::new();

fn detector() -> &'static SentenceDetectorDialog {
    DETECTOR.get_or_init(|| {
        SentenceDetectorDialog::new().expect("seams sentence detector should initialize")
    })
}

/// Split text into sentences using the dialog-aware detector.
fn split_into_sentences(text: &str) -> Vec<String> {
    let sentences = detector()
        .detect_sentences_borrowed(text)
        .expect("seams sentence detection should succeed");

    sentences
        .iter()
        .map(|s| s.normalize())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Optimize text structure for natural speech.
pub fn optimize_for_speech(content: &str, long_sentence_chars: usize) -> String {
    let cleaned = clean_markup(content);

    let mut optimized = Vec::new();
    for sentence in split_into_sentences(&cleaned) {
        let sentence = sentence
            .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
            .trim()
            .to_string();
        if sentence.is_empty() {
            continue;
        }

        let sentence = if sentence.len() > long_sentence_chars {
            CONNECTIVES
                .replace_all(&sentence, "[PAUSE] ${1}")
                .into_owned()
        } else {
            sentence
        };

        let sentence = STRONG_EMPHASIS
            .replace_all(&sentence, "[EMPHASIS] ${1} [/EMPHASIS]")
            .into_owned();
        let sentence = SLIGHT_EMPHASIS
            .replace_all(&sentence, "[SLIGHT_EMPHASIS] ${1} [/SLIGHT_EMPHASIS]")
            .into_owned();

        optimized.push(sentence);
    }

    optimized.join(". ")
}

/// Strip markdown syntax that reads badly aloud, keeping the content.
fn clean_markup(content: &str) -> String {
    let cleaned = HEADING_HASHES.replace_all(content, "");
    let cleaned = HORIZONTAL_RULE.replace_all(&cleaned, "");
    let cleaned = BLOCKQUOTE.replace_all(&cleaned, "");
    let cleaned = UNORDERED_LIST.replace_all(&cleaned, "");
    let cleaned = ORDERED_LIST.replace_all(&cleaned, "");
    let cleaned = INLINE_CODE.replace_all(&cleaned, "${1}");
    let cleaned = INLINE_LINK.replace_all(&cleaned, "${1}");
    let cleaned = REFERENCE_LINK.replace_all(&cleaned, "${1}");

    // Collapse all whitespace; paragraph structure no longer matters here
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
