//! Markdown front-end: heading hierarchy, math and citation extraction.
//!
//! Math expressions and citations are re-derivable on demand for any text
//! slice; the annotation engine re-runs extraction after auto-wrapping has
//! changed the text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{Citation, Document, DocumentNode, MathExpression};

/// Title used when neither frontmatter nor a top-level heading names one.
pub const UNTITLED: &str = "Untitled Document";

static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)\A---\r?\n(.*?)^---[ \t]*$\r?\n?").expect("frontmatter pattern")
});

static FRONTMATTER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^title:\s*"?([^"\r\n]+)"?\s*$"#).expect("title pattern"));

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("header pattern"));

static FIRST_H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("h1 pattern"));

static BLOCK_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("block math pattern"));

static INLINE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").expect("inline math pattern"));

// Common academic citation shapes: (Author, Year), [Author Year], (Author Year)
static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\(([A-Za-z\s]+),\s*(\d{4})\)",
        r"\[([A-Za-z\s]+)\s+(\d{4})\]",
        r"\(([A-Za-z\s]+)\s+(\d{4})\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("citation pattern"))
    .collect()
});

/// Parse a markdown document into its heading hierarchy.
pub fn parse_markdown(text: &str) -> Document {
    let (meta, content) = split_frontmatter(text);

    let title = meta
        .and_then(|m| {
            FRONTMATTER_TITLE
                .captures(m)
                .map(|c| c[1].trim().to_string())
        })
        .or_else(|| FIRST_H1.captures(content).map(|c| c[1].trim().to_string()))
        .unwrap_or_else(|| UNTITLED.to_string());

    let sections = collect_sections(content);
    let mut cursor = 0;
    let nodes = build_nodes(&sections, &mut cursor, 0);

    Document { title, nodes }
}

/// Split off a `---`-fenced frontmatter block, if present.
fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    if let Some(m) = FRONTMATTER.captures(text) {
        let meta = m.get(1).map(|g| g.as_str());
        let rest = &text[m.get(0).map(|g| g.end()).unwrap_or(0)..];
        (meta, rest)
    } else {
        (None, text)
    }
}

struct FlatSection {
    level: usize,
    title: String,
    body: String,
}

/// Collect headings in source order; each section's body runs until the next
/// heading of ANY level.
fn collect_sections(content: &str) -> Vec<FlatSection> {
    let lines: Vec<&str> = content.lines().collect();
    let mut sections = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if let Some(caps) = HEADER.captures(lines[i]) {
            let level = caps[1].len();
            let title = caps[2].trim().to_string();

            let mut body_lines = Vec::new();
            let mut j = i + 1;
            while j < lines.len() && !HEADER.is_match(lines[j]) {
                body_lines.push(lines[j]);
                j += 1;
            }

            sections.push(FlatSection {
                level,
                title,
                body: body_lines.join("\n").trim().to_string(),
            });
            i = j;
        } else {
            i += 1;
        }
    }

    sections
}

/// Build the tree from the flat section list. A section becomes a child of
/// the nearest preceding section with a strictly smaller level.
fn build_nodes(sections: &[FlatSection], cursor: &mut usize, parent_level: usize) -> Vec<DocumentNode> {
    let mut nodes = Vec::new();

    while *cursor < sections.len() {
        let level = sections[*cursor].level;
        if level <= parent_level {
            break;
        }

        let section = &sections[*cursor];
        let (title, body) = (section.title.clone(), section.body.clone());
        *cursor += 1;

        let children = build_nodes(sections, cursor, level);
        nodes.push(DocumentNode {
            depth: level,
            title,
            body,
            children,
        });
    }

    nodes
}

/// Extract LaTeX math expressions from a text slice, block expressions first.
///
/// Block spans are masked before the inline scan so a `$$` fence is never
/// mistaken for a pair of inline delimiters. Anchors are byte offsets into
/// `text`.
pub fn extract_math(text: &str) -> Vec<MathExpression> {
    let mut expressions = Vec::new();
    let mut masked = text.as_bytes().to_vec();

    for caps in BLOCK_MATH.captures_iter(text) {
        let whole = caps.get(0).expect("match group");
        expressions.push(MathExpression {
            latex: caps[1].trim().to_string(),
            is_block: true,
            anchor: whole.start(),
        });
        masked[whole.range()].fill(b' ');
    }

    let masked = String::from_utf8_lossy(&masked);
    for caps in INLINE_MATH.captures_iter(&masked) {
        let whole = caps.get(0).expect("match group");
        expressions.push(MathExpression {
            latex: caps[1].trim().to_string(),
            is_block: false,
            anchor: whole.start(),
        });
    }

    expressions
}

/// Extract academic citations from a text slice.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut citations = Vec::new();

    for pattern in CITATION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            citations.push(Citation {
                original: caps[0].to_string(),
                author: caps[1].trim().to_string(),
                year: caps[2].trim().to_string(),
            });
        }
    }

    citations
}

/// Validate a parsed document for annotation.
///
/// Never fails; returns whether the document is clean plus human-readable
/// issues.
pub fn validate_document(doc: &Document) -> (bool, Vec<String>) {
    let mut issues = Vec::new();

    if doc.title.is_empty() || doc.title == UNTITLED {
        issues.push("Document lacks a clear title".to_string());
    }

    if doc.nodes.is_empty() {
        issues.push("Document has no identifiable chapters or sections".to_string());
    }

    if doc.total_body_len() < 100 {
        issues.push("Document content is very short (< 100 characters)".to_string());
    }

    let mut dollar_count = 0;
    let mut empty_math = 0;
    let mut stack: Vec<&DocumentNode> = doc.nodes.iter().collect();
    while let Some(node) = stack.pop() {
        dollar_count += node.body.matches('$').count();
        empty_math += extract_math(&node.body)
            .iter()
            .filter(|e| e.latex.is_empty())
            .count();
        stack.extend(node.children.iter());
    }

    if empty_math > 0 {
        issues.push(format!("Found {} empty math expressions", empty_math));
    }

    if dollar_count % 2 != 0 {
        issues.push("Unbalanced math delimiters ($) detected".to_string());
    }

    (issues.is_empty(), issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ntitle: Test Doc\n---\n# Intro\nBody one.\n## Sub\nBody two.\n# Next\nMore text here.\n";

    #[test]
    fn test_frontmatter_title() {
        let doc = parse_markdown(SAMPLE);
        assert_eq!(doc.title, "Test Doc");
    }

    #[test]
    fn test_title_from_first_h1() {
        let doc = parse_markdown("# Heading Title\nSome text.");
        assert_eq!(doc.title, "Heading Title");
    }

    #[test]
    fn test_untitled_fallback() {
        let doc = parse_markdown("just prose, no headings");
        assert_eq!(doc.title, UNTITLED);
    }

    #[test]
    fn test_hierarchy() {
        let doc = parse_markdown(SAMPLE);
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].title, "Intro");
        assert_eq!(doc.nodes[0].body, "Body one.");
        assert_eq!(doc.nodes[0].children.len(), 1);
        assert_eq!(doc.nodes[0].children[0].title, "Sub");
        assert_eq!(doc.nodes[1].title, "Next");
        assert!(doc.nodes[1].children.is_empty());
    }

    #[test]
    fn test_skipped_levels() {
        let doc = parse_markdown("# Top\n### Deep\nText.\n");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].children.len(), 1);
        assert_eq!(doc.nodes[0].children[0].depth, 3);
    }

    #[test]
    fn test_body_stops_at_any_header() {
        let doc = parse_markdown("## A\nowned by A\n### B\nowned by B\n");
        assert_eq!(doc.nodes[0].body, "owned by A");
        assert_eq!(doc.nodes[0].children[0].body, "owned by B");
    }

    #[test]
    fn test_extract_inline_math() {
        let exprs = extract_math("before $x + y$ after");
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].latex, "x + y");
        assert!(!exprs[0].is_block);
        assert_eq!(exprs[0].anchor, 7);
    }

    #[test]
    fn test_extract_block_math_first() {
        let exprs = extract_math("$$\\alpha$$ and $b$");
        assert_eq!(exprs.len(), 2);
        assert!(exprs[0].is_block);
        assert_eq!(exprs[0].latex, "\\alpha");
        assert!(!exprs[1].is_block);
        assert_eq!(exprs[1].latex, "b");
    }

    #[test]
    fn test_block_fence_not_seen_as_inline() {
        let exprs = extract_math("$$a + b$$");
        assert_eq!(exprs.len(), 1);
        assert!(exprs[0].is_block);
    }

    #[test]
    fn test_extract_citations() {
        let citations = extract_citations("As shown (Smith, 1964) and [Bell 1964].");
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].original, "(Smith, 1964)");
        assert_eq!(citations[0].author, "Smith");
        assert_eq!(citations[0].year, "1964");
        assert_eq!(citations[1].original, "[Bell 1964]");
        assert_eq!(citations[1].author, "Bell");
    }

    #[test]
    fn test_validate_clean_document() {
        let doc = parse_markdown(
            "# Title\nA reasonably long body of text that easily clears the minimum \
             content threshold for a document under validation checks.",
        );
        let (ok, issues) = validate_document(&doc);
        assert!(ok, "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_validate_unbalanced_delimiters() {
        let doc = parse_markdown("# Title\nA stray $ delimiter sits in this body text which otherwise has plenty of length to pass the size check.");
        let (ok, issues) = validate_document(&doc);
        assert!(!ok);
        assert!(issues.iter().any(|i| i.contains("Unbalanced")));
    }
}
