//! LaTeX-to-speech transduction.
//!
//! Two backends behind one trait: a pure pattern backend, and a
//! structure-aware backend that asks an external markup parser to isolate
//! the math nodes first. Neither backend errors on unrecognized input;
//! unknown commands pass through literally as a defined last resort.

pub mod pandoc;
pub mod rules;
pub mod structures;

use log::warn;

pub use pandoc::{MarkupNode, PandocParser, StructuralParser};

/// Converts a raw LaTeX snippet into spoken English.
pub trait MathTransducer: Send + Sync {
    /// Convert a snippet. Must not fail: unrecognized input is passed
    /// through literally.
    fn spoken(&self, latex: &str, is_block: bool) -> String;

    /// Backend name for display and logging.
    fn name(&self) -> &'static str;
}

/// Select a backend from the available capabilities: structure-aware when an
/// external markup parser is present, pattern-only otherwise.
pub fn create_transducer(parser: Option<Box<dyn StructuralParser>>) -> Box<dyn MathTransducer> {
    match parser {
        Some(parser) => Box::new(StructureAwareTransducer::new(parser)),
        None => Box::new(RegexTransducer::new()),
    }
}

/// Core pattern conversion shared by both backends: the ordered rule table,
/// then the structural handlers.
fn pattern_spoken(latex: &str) -> String {
    let spoken = rules::apply_rules(latex);
    structures::handle_structures(&spoken)
}

/// Pattern-only backend.
pub struct RegexTransducer;

impl RegexTransducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegexTransducer {
    fn default() -> Self {
        Self::new()
    }
}

impl MathTransducer for RegexTransducer {
    fn spoken(&self, latex: &str, _is_block: bool) -> String {
        pattern_spoken(latex)
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Structure-aware backend: delegates the snippet to the external parser,
/// applies the rule table to each math node's literal payload, and joins the
/// results with single spaces. Any per-snippet parser failure falls back to
/// the pattern path for that snippet.
pub struct StructureAwareTransducer {
    parser: Box<dyn StructuralParser>,
}

impl StructureAwareTransducer {
    pub fn new(parser: Box<dyn StructuralParser>) -> Self {
        Self { parser }
    }
}

impl MathTransducer for StructureAwareTransducer {
    fn spoken(&self, latex: &str, is_block: bool) -> String {
        match self.parser.parse(latex, is_block) {
            Ok(nodes) => {
                let mut parts = Vec::new();
                collect_math_parts(&nodes, &mut parts);
                if parts.is_empty() {
                    warn!(
                        "structural parser found no math nodes in '{}', using pattern fallback",
                        latex
                    );
                    pattern_spoken(latex)
                } else {
                    parts.join(" ")
                }
            }
            Err(e) => {
                warn!("structural conversion failed for '{}': {}", latex, e);
                pattern_spoken(latex)
            }
        }
    }

    fn name(&self) -> &'static str {
        "structure-aware"
    }
}

fn collect_math_parts(nodes: &[MarkupNode], parts: &mut Vec<String>) {
    for node in nodes {
        match node {
            MarkupNode::Math { latex, .. } => parts.push(pattern_spoken(latex)),
            MarkupNode::Group(children) => collect_math_parts(children, parts),
            MarkupNode::Text(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;

    struct StubParser {
        nodes: Vec<MarkupNode>,
    }

    impl StructuralParser for StubParser {
        fn parse(&self, _latex: &str, _is_block: bool) -> crate::Result<Vec<MarkupNode>> {
            Ok(self.nodes.clone())
        }
    }

    struct FailingParser;

    impl StructuralParser for FailingParser {
        fn parse(&self, _latex: &str, _is_block: bool) -> crate::Result<Vec<MarkupNode>> {
            Err(EnhanceError::Parser("boom".to_string()))
        }
    }

    #[test]
    fn test_regex_backend_infinity() {
        let transducer = RegexTransducer::new();
        assert!(transducer.spoken("\\infty", false).contains("infinity"));
    }

    #[test]
    fn test_factory_picks_backend() {
        assert_eq!(create_transducer(None).name(), "regex");
        let parser = Box::new(StubParser { nodes: Vec::new() });
        assert_eq!(create_transducer(Some(parser)).name(), "structure-aware");
    }

    #[test]
    fn test_structure_aware_joins_math_nodes() {
        let parser = Box::new(StubParser {
            nodes: vec![
                MarkupNode::Math {
                    latex: "\\alpha".to_string(),
                    display: false,
                },
                MarkupNode::Text("ignored".to_string()),
                MarkupNode::Group(vec![MarkupNode::Math {
                    latex: "\\beta".to_string(),
                    display: false,
                }]),
            ],
        });
        let transducer = StructureAwareTransducer::new(parser);
        let spoken = transducer.spoken("\\alpha \\beta", false);
        assert_eq!(spoken, "alpha beta");
    }

    #[test]
    fn test_structure_aware_falls_back_on_parser_error() {
        let transducer = StructureAwareTransducer::new(Box::new(FailingParser));
        let spoken = transducer.spoken("\\infty", false);
        assert!(spoken.contains("infinity"), "got: {}", spoken);
    }

    #[test]
    fn test_structure_aware_falls_back_on_empty_tree() {
        let transducer = StructureAwareTransducer::new(Box::new(StubParser { nodes: Vec::new() }));
        let spoken = transducer.spoken("\\alpha", false);
        assert_eq!(spoken, "alpha");
    }
}
