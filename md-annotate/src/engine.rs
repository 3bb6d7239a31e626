//! Annotation engine: tree traversal, offset bookkeeping, and validation.
//!
//! Pre-order, depth-first, parent before children, one monotonically
//! increasing write cursor over the output buffer. Every transform that can
//! change string length runs BEFORE any span offsets for that text are
//! recorded; recording against pre-transform lengths is the classic bug this
//! module exists to avoid.

use std::collections::BTreeMap;

use log::warn;
use regex::Regex;

use once_cell::sync::Lazy;

use crate::citation;
use crate::config::AnnotateConfig;
use crate::document::{Document, DocumentNode, MathExpression};
use crate::error::{EnhanceError, Result};
use crate::math::MathTransducer;
use crate::optimize;
use crate::parser;
use crate::pronounce::PronunciationDict;
use crate::rewrite::{RewriteOutcome, Rewriter};
use crate::wrap;

/// Pause before a heading, in seconds. Skipped for the first node.
const PAUSE_BEFORE_HEADING_SECS: f32 = 1.5;
/// Pause after a heading and its separator, in seconds.
const PAUSE_AFTER_HEADING_SECS: f32 = 2.5;
/// Separator between a heading and the content that follows it.
const TITLE_SEPARATOR: &str = "\n\n";
/// Sentences longer than this are flagged by validation.
const MAX_SENTENCE_CHARS: usize = 300;
/// Buffers shorter than this are flagged by validation.
const MIN_CONTENT_CHARS: usize = 50;

/// Voice selection tag, derived from heading depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRole {
    MainTitle,
    Chapter,
    Section,
    Subsection,
}

impl VoiceRole {
    /// Map a heading depth to its narration role.
    pub fn for_depth(depth: usize) -> Self {
        match depth {
            1 => Self::MainTitle,
            2 => Self::Chapter,
            3 => Self::Section,
            _ => Self::Subsection,
        }
    }

    /// Stable identifier used by the synthesis side to pick a voice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainTitle => "main_title_voice",
            Self::Chapter => "chapter_voice",
            Self::Section => "section_voice",
            Self::Subsection => "subsection_voice",
        }
    }
}

/// A voice assignment over a byte range of the final buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSpan {
    pub start: usize,
    pub end: usize,
    pub role: VoiceRole,
}

/// A pause anchored to a byte offset of the final buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseMarker {
    pub offset: usize,
    pub duration_secs: f32,
}

/// Speech-ready text with positional metadata, built once per document and
/// consumed read-only by segmentation and synthesis.
#[derive(Debug, Clone)]
pub struct EnhancedText {
    /// The annotated buffer.
    pub content: String,
    /// Voice assignments, keyed by byte range.
    pub voice_spans: Vec<VoiceSpan>,
    /// Pauses, keyed by byte offset.
    pub pause_markers: Vec<PauseMarker>,
    /// Chapter start offsets, strictly increasing.
    pub chapter_breaks: Vec<usize>,
    /// Original (untransformed) titles, parallel to `chapter_breaks`.
    pub chapter_titles: Vec<String>,
    /// The pronunciation dictionary used, for diagnostics.
    pub pronunciation_guides: BTreeMap<String, String>,
    /// False once an opaque rewrite pass has run: every offset above is then
    /// a best-effort approximation, not an exact position.
    pub offsets_exact: bool,
}

/// Accumulators owned by one traversal. The write cursor is the buffer
/// length; there is no ambient state outside this struct.
struct TraversalContext {
    buffer: String,
    voice_spans: Vec<VoiceSpan>,
    pause_markers: Vec<PauseMarker>,
    chapter_breaks: Vec<usize>,
    chapter_titles: Vec<String>,
}

impl TraversalContext {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            voice_spans: Vec::new(),
            pause_markers: Vec::new(),
            chapter_breaks: Vec::new(),
            chapter_titles: Vec::new(),
        }
    }

    fn cursor(&self) -> usize {
        self.buffer.len()
    }
}

/// Drives the per-node transforms and owns the offset bookkeeping.
pub struct AnnotationEngine {
    config: AnnotateConfig,
    transducer: Box<dyn MathTransducer>,
    pronunciations: PronunciationDict,
    rewriter: Option<Box<dyn Rewriter>>,
}

impl AnnotationEngine {
    pub fn new(
        config: AnnotateConfig,
        transducer: Box<dyn MathTransducer>,
        rewriter: Option<Box<dyn Rewriter>>,
    ) -> Result<Self> {
        let pronunciations = PronunciationDict::from_terms(config.pronunciation_terms()?)?;

        Ok(Self {
            config,
            transducer,
            pronunciations,
            rewriter,
        })
    }

    /// Build the annotated buffer for a whole document.
    ///
    /// Atomic from the caller's perspective: either a complete
    /// `EnhancedText` comes back or an error does; no partial buffer is
    /// observable.
    pub fn enhance(&self, doc: &Document) -> Result<EnhancedText> {
        let mut ctx = TraversalContext::new();

        for (i, node) in doc.nodes.iter().enumerate() {
            self.visit(node, i == 0, 0, &mut ctx)?;
        }

        let mut content = ctx.buffer;
        let mut offsets_exact = true;

        // The optional whole-buffer rewrite runs exactly once, after all
        // offsets are recorded. The collaborator gives no length guarantee,
        // so a rewritten buffer demotes every offset to an approximation.
        if let Some(rewriter) = &self.rewriter {
            match rewriter.rewrite(&content) {
                RewriteOutcome::Rewritten(rewritten) => {
                    content = rewritten;
                    offsets_exact = false;
                }
                RewriteOutcome::Unchanged => {}
            }
        }

        Ok(EnhancedText {
            content,
            voice_spans: ctx.voice_spans,
            pause_markers: ctx.pause_markers,
            chapter_breaks: ctx.chapter_breaks,
            chapter_titles: ctx.chapter_titles,
            pronunciation_guides: self.pronunciations.guides().clone(),
            offsets_exact,
        })
    }

    fn visit(
        &self,
        node: &DocumentNode,
        is_first: bool,
        parent_depth: usize,
        ctx: &mut TraversalContext,
    ) -> Result<()> {
        if node.depth == 0 {
            return Err(EnhanceError::MalformedTree(format!(
                "heading '{}' has depth 0",
                node.title
            )));
        }
        if node.depth <= parent_depth {
            return Err(EnhanceError::MalformedTree(format!(
                "heading '{}' at depth {} does not descend from its parent at depth {}",
                node.title, node.depth, parent_depth
            )));
        }

        let break_offset = ctx.cursor();

        if !is_first {
            ctx.pause_markers.push(PauseMarker {
                offset: break_offset,
                duration_secs: PAUSE_BEFORE_HEADING_SECS,
            });
        }

        // Titles get pronunciation substitution only; math and citation
        // handling stay out of headings. The span is recorded against the
        // transformed length, never the raw title's.
        let spoken_title = self.pronunciations.apply(&node.title);
        let title_start = ctx.cursor();
        ctx.buffer.push_str(&spoken_title);
        let title_end = ctx.cursor();
        if title_end > title_start {
            ctx.voice_spans.push(VoiceSpan {
                start: title_start,
                end: title_end,
                role: VoiceRole::for_depth(node.depth),
            });
        }

        ctx.buffer.push_str(TITLE_SEPARATOR);
        let after_separator = ctx.cursor();
        ctx.pause_markers.push(PauseMarker {
            offset: after_separator,
            duration_secs: PAUSE_AFTER_HEADING_SECS,
        });

        ctx.chapter_breaks.push(break_offset);
        ctx.chapter_titles.push(node.title.clone());

        if !node.body.trim().is_empty() {
            let body = self.enhance_body(&node.body);
            ctx.buffer.push_str(&body);
        }

        for child in &node.children {
            self.visit(child, false, node.depth, ctx)?;
        }

        Ok(())
    }

    /// Run one node's own body text through the transform pipeline.
    fn enhance_body(&self, body: &str) -> String {
        let mut text = body.to_string();

        if self.config.math.enabled {
            text = wrap::auto_wrap_math(&text);
            // Re-derive expression locations: wrapping just changed the text
            let expressions = parser::extract_math(&text);
            text = self.apply_math(&text, &expressions);
        }

        if self.config.citations.enabled {
            let citations = parser::extract_citations(&text);
            text = citation::naturalize_all(&text, &citations);
        }

        text = self.pronunciations.apply(&text);

        optimize::optimize_for_speech(&text, self.config.speech.long_sentence_chars)
    }

    /// Convert each math expression in place, wrapped in annotation markers.
    fn apply_math(&self, content: &str, expressions: &[MathExpression]) -> String {
        let mut result = content.to_string();

        for expr in expressions {
            if expr.latex.is_empty() {
                continue;
            }

            let spoken = self.transducer.spoken(&expr.latex, expr.is_block);
            let escaped = regex::escape(&expr.latex);
            let (pattern, replacement) = if expr.is_block {
                (
                    format!(r"\$\$\s*{}\s*\$\$", escaped),
                    format!("[MATH_BLOCK] {} [/MATH_BLOCK]", spoken),
                )
            } else {
                (
                    format!(r"\$\s*{}\s*\$", escaped),
                    format!("[MATH] {} [/MATH]", spoken),
                )
            };

            match Regex::new(&pattern) {
                Ok(re) => {
                    result = re
                        .replace(&result, regex::NoExpand(&replacement))
                        .into_owned();
                }
                Err(e) => {
                    warn!("skipping math expression '{}': {}", expr.latex, e);
                }
            }
        }

        result
    }
}

static LEFTOVER_INLINE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[^$]+\$").expect("leftover inline pattern"));
static LEFTOVER_BLOCK_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$[^$]+\$\$").expect("leftover block pattern"));
static SENTENCE_ENDERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence ender pattern"));

/// Check an enhanced buffer for narration problems.
///
/// Never fails; returns whether the buffer is clean plus human-readable
/// issues.
pub fn validate(enhanced: &EnhancedText) -> (bool, Vec<String>) {
    let mut issues = Vec::new();
    let content = &enhanced.content;

    if LEFTOVER_BLOCK_MATH.is_match(content) {
        issues.push("Unprocessed block math expressions found".to_string());
    }
    if LEFTOVER_INLINE_MATH.is_match(content) {
        issues.push("Unprocessed inline math expressions found".to_string());
    }

    let long_sentences = SENTENCE_ENDERS
        .split(content)
        .filter(|s| s.trim().len() > MAX_SENTENCE_CHARS)
        .count();
    if long_sentences > 0 {
        issues.push(format!(
            "Found {} very long sentences that may be hard to narrate",
            long_sentences
        ));
    }

    let emphasis_starts = content.matches("[EMPHASIS]").count();
    let emphasis_ends = content.matches("[/EMPHASIS]").count();
    if emphasis_starts != emphasis_ends {
        issues.push("Unbalanced emphasis markers".to_string());
    }

    if content.trim().len() < MIN_CONTENT_CHARS {
        issues.push("Enhanced content is very short".to_string());
    }

    (issues.is_empty(), issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::RegexTransducer;
    use proptest::prelude::*;

    fn engine() -> AnnotationEngine {
        AnnotationEngine::new(
            AnnotateConfig::default(),
            Box::new(RegexTransducer::new()),
            None,
        )
        .unwrap()
    }

    fn node(depth: usize, title: &str, body: &str, children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode {
            depth,
            title: title.to_string(),
            body: body.to_string(),
            children,
        }
    }

    fn doc(nodes: Vec<DocumentNode>) -> Document {
        Document {
            title: "Test".to_string(),
            nodes,
        }
    }

    #[test]
    fn test_single_node_offsets() {
        let enhanced = engine()
            .enhance(&doc(vec![node(1, "One", "", vec![])]))
            .unwrap();

        assert_eq!(enhanced.content, "One\n\n");
        assert_eq!(enhanced.chapter_breaks, vec![0]);
        assert_eq!(enhanced.chapter_titles, vec!["One".to_string()]);
        assert_eq!(
            enhanced.voice_spans,
            vec![VoiceSpan {
                start: 0,
                end: 3,
                role: VoiceRole::MainTitle,
            }]
        );
        // First node gets no leading pause, only the post-heading one
        assert_eq!(enhanced.pause_markers.len(), 1);
        assert_eq!(enhanced.pause_markers[0].offset, 5);
        assert_eq!(enhanced.pause_markers[0].duration_secs, 2.5);
        assert!(enhanced.offsets_exact);
    }

    #[test]
    fn test_second_node_gets_leading_pause() {
        let enhanced = engine()
            .enhance(&doc(vec![
                node(1, "One", "", vec![]),
                node(1, "Two", "", vec![]),
            ]))
            .unwrap();

        assert_eq!(enhanced.chapter_breaks, vec![0, 5]);
        let leading: Vec<_> = enhanced
            .pause_markers
            .iter()
            .filter(|p| p.duration_secs == 1.5)
            .collect();
        assert_eq!(leading.len(), 1);
        assert_eq!(leading[0].offset, 5);
    }

    #[test]
    fn test_depth_to_role_assignment() {
        let tree = doc(vec![node(
            1,
            "Root",
            "",
            vec![
                node(2, "A", "", vec![]),
                node(2, "B", "", vec![node(3, "C", "", vec![])]),
            ],
        )]);
        let enhanced = engine().enhance(&tree).unwrap();

        let roles: Vec<VoiceRole> = enhanced.voice_spans.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                VoiceRole::MainTitle,
                VoiceRole::Chapter,
                VoiceRole::Chapter,
                VoiceRole::Section,
            ]
        );
    }

    #[test]
    fn test_original_titles_recorded() {
        let config: AnnotateConfig = toml::from_str(
            r#"
[pronunciation.terms.physics]
qubit = "cue-bit"
"#,
        )
        .unwrap();
        let engine = AnnotationEngine::new(config, Box::new(RegexTransducer::new()), None).unwrap();

        let enhanced = engine
            .enhance(&doc(vec![node(1, "The qubit", "", vec![])]))
            .unwrap();

        // Buffer carries the substitution, the title list stays original
        assert!(enhanced.content.starts_with("The cue-bit"));
        assert_eq!(enhanced.chapter_titles, vec!["The qubit".to_string()]);

        let span = enhanced.voice_spans[0];
        assert_eq!(&enhanced.content[span.start..span.end], "The cue-bit");
    }

    #[test]
    fn test_body_math_pipeline() {
        let enhanced = engine()
            .enhance(&doc(vec![node(
                2,
                "Probability",
                "The value $\\frac{1}{2}$ appears, and P(A) matters.",
                vec![],
            )]))
            .unwrap();

        assert!(
            enhanced.content.contains("[MATH] 1 over 2 [/MATH]"),
            "got: {}",
            enhanced.content
        );
        assert!(
            enhanced.content.contains("probability of A"),
            "got: {}",
            enhanced.content
        );
    }

    #[test]
    fn test_body_citation_pipeline() {
        let enhanced = engine()
            .enhance(&doc(vec![node(
                2,
                "History",
                "The inequality appeared first in (Bell, 1964) and reshaped the field.",
                vec![],
            )]))
            .unwrap();

        assert!(
            enhanced.content.contains("Bell, nineteen sixty-four"),
            "got: {}",
            enhanced.content
        );
    }

    #[test]
    fn test_depth_zero_is_fatal() {
        let result = engine().enhance(&doc(vec![node(0, "Bad", "", vec![])]));
        assert!(matches!(result, Err(EnhanceError::MalformedTree(_))));
    }

    #[test]
    fn test_non_descending_child_is_fatal() {
        let tree = doc(vec![node(
            2,
            "Parent",
            "",
            vec![node(2, "Child", "", vec![])],
        )]);
        let result = engine().enhance(&tree);
        assert!(matches!(result, Err(EnhanceError::MalformedTree(_))));
    }

    #[test]
    fn test_rewriter_unchanged_keeps_offsets_exact() {
        struct Noop;
        impl Rewriter for Noop {
            fn rewrite(&self, _content: &str) -> RewriteOutcome {
                RewriteOutcome::Unchanged
            }
        }

        let engine = AnnotationEngine::new(
            AnnotateConfig::default(),
            Box::new(RegexTransducer::new()),
            Some(Box::new(Noop)),
        )
        .unwrap();
        let enhanced = engine.enhance(&doc(vec![node(1, "T", "", vec![])])).unwrap();
        assert!(enhanced.offsets_exact);
    }

    #[test]
    fn test_rewriter_rewrite_demotes_offsets() {
        struct Upper;
        impl Rewriter for Upper {
            fn rewrite(&self, content: &str) -> RewriteOutcome {
                RewriteOutcome::Rewritten(content.to_uppercase())
            }
        }

        let engine = AnnotationEngine::new(
            AnnotateConfig::default(),
            Box::new(RegexTransducer::new()),
            Some(Box::new(Upper)),
        )
        .unwrap();
        let enhanced = engine
            .enhance(&doc(vec![node(1, "title", "", vec![])]))
            .unwrap();
        assert!(enhanced.content.starts_with("TITLE"));
        assert!(!enhanced.offsets_exact);
    }

    #[test]
    fn test_validate_flags_leftover_math() {
        let mut enhanced = engine()
            .enhance(&doc(vec![node(1, "T", "", vec![])]))
            .unwrap();
        enhanced.content.push_str("leftover $x + y$ delimiters with enough padding text");
        let (ok, issues) = validate(&enhanced);
        assert!(!ok);
        assert!(issues.iter().any(|i| i.contains("inline math")));
    }

    #[test]
    fn test_validate_flags_unbalanced_emphasis() {
        let mut enhanced = engine()
            .enhance(&doc(vec![node(1, "T", "", vec![])]))
            .unwrap();
        enhanced
            .content
            .push_str("[EMPHASIS] loud words without a closing tag and padding");
        let (ok, issues) = validate(&enhanced);
        assert!(!ok);
        assert!(issues.iter().any(|i| i.contains("emphasis")));
    }

    #[test]
    fn test_validate_flags_short_buffer() {
        let enhanced = engine()
            .enhance(&doc(vec![node(1, "T", "", vec![])]))
            .unwrap();
        let (ok, issues) = validate(&enhanced);
        assert!(!ok);
        assert!(issues.iter().any(|i| i.contains("very short")));
    }

    proptest! {
        #[test]
        fn prop_breaks_and_spans_valid(
            sections in proptest::collection::vec(
                ("[A-Za-z][A-Za-z ]{0,11}", "[a-z ]{0,40}", proptest::bool::ANY),
                1..6,
            )
        ) {
            let nodes: Vec<DocumentNode> = sections
                .iter()
                .map(|(title, body, with_child)| {
                    let children = if *with_child {
                        vec![node(2, "Sub", body, vec![])]
                    } else {
                        Vec::new()
                    };
                    node(1, title, body, children)
                })
                .collect();

            let enhanced = engine().enhance(&doc(nodes)).unwrap();

            // Breaks strictly increasing, parallel to titles
            prop_assert_eq!(enhanced.chapter_breaks.len(), enhanced.chapter_titles.len());
            for pair in enhanced.chapter_breaks.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }

            // Every span well-formed and inside the buffer
            for span in &enhanced.voice_spans {
                prop_assert!(span.start < span.end);
                prop_assert!(span.end <= enhanced.content.len());
            }

            // Every pause anchored inside the buffer
            for pause in &enhanced.pause_markers {
                prop_assert!(pause.offset <= enhanced.content.len());
            }
        }
    }
}
