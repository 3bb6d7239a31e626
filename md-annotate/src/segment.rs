//! Chapter segmentation: partition the final buffer and re-base offsets.
//!
//! Applied once, after the whole buffer is built, by the audio-generation
//! side. Chapter i covers [breaks[i], breaks[i+1]); the last chapter runs to
//! the end of the buffer.

use log::warn;

use crate::engine::{EnhancedText, VoiceSpan};

/// Title used when a document produced no chapter breaks at all.
const FALLBACK_TITLE: &str = "Chapter 1";

/// One chapter's text plus chapter-local metadata.
#[derive(Debug, Clone)]
pub struct ChapterSegment {
    /// Original chapter title.
    pub title: String,
    /// The chapter's slice of the buffer.
    pub text: String,
    /// Voice spans re-keyed to chapter-local byte offsets.
    pub voice_spans: Vec<VoiceSpan>,
}

/// Partition an enhanced buffer into chapter segments.
pub fn split_chapters(enhanced: &EnhancedText) -> Vec<ChapterSegment> {
    let content = &enhanced.content;
    let breaks = &enhanced.chapter_breaks;

    if breaks.is_empty() {
        return vec![ChapterSegment {
            title: FALLBACK_TITLE.to_string(),
            text: content.clone(),
            voice_spans: enhanced.voice_spans.clone(),
        }];
    }

    let mut chapters = Vec::with_capacity(breaks.len());

    for (i, &start) in breaks.iter().enumerate() {
        let end = breaks.get(i + 1).copied().unwrap_or(content.len());

        let voice_spans = enhanced
            .voice_spans
            .iter()
            .filter(|span| span.start >= start && span.start < end)
            .filter_map(|span| {
                if span.end > end {
                    // Spans are created by title handling and always close
                    // before the next break; one straddling a boundary means
                    // the engine's bookkeeping broke upstream.
                    warn!(
                        "dropping voice span ({}, {}) straddling chapter boundary at {}",
                        span.start, span.end, end
                    );
                    return None;
                }
                Some(VoiceSpan {
                    start: span.start - start,
                    end: span.end - start,
                    role: span.role,
                })
            })
            .collect();

        chapters.push(ChapterSegment {
            title: enhanced
                .chapter_titles
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Chapter {}", i + 1)),
            text: content[start..end].to_string(),
            voice_spans,
        });
    }

    chapters
}
