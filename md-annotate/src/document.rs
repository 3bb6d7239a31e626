// Parsed document structure shared across the annotation pipeline

/// A heading and its immediate body text within the document hierarchy.
///
/// Children are in source order. Depth increases strictly from parent to
/// child but may skip levels (an `####` directly under an `##` is valid).
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Heading depth (1 = document title level)
    pub depth: usize,
    /// Heading text, untransformed
    pub title: String,
    /// Body text belonging to this node only (descendant content excluded)
    pub body: String,
    /// Child sections in source order
    pub children: Vec<DocumentNode>,
}

/// A parsed document ready for annotation.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document title
    pub title: String,
    /// Top-level sections in source order
    pub nodes: Vec<DocumentNode>,
}

impl Document {
    /// Total body length across all nodes (approximate content size)
    pub fn total_body_len(&self) -> usize {
        fn walk(node: &DocumentNode) -> usize {
            node.body.len() + node.children.iter().map(walk).sum::<usize>()
        }
        self.nodes.iter().map(walk).sum()
    }
}

/// A LaTeX expression located in a text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathExpression {
    /// The LaTeX content, delimiters stripped and trimmed
    pub latex: String,
    /// True for `$$...$$`, false for `$...$`
    pub is_block: bool,
    /// Byte offset of the opening delimiter in the slice it was derived from
    pub anchor: usize,
}

/// An academic citation located in a text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// The full citation text as written, e.g. `(Smith, 1964)`
    pub original: String,
    /// Author name
    pub author: String,
    /// Four-digit year as written
    pub year: String,
}
