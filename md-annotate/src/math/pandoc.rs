//! External structural-markup parser bridge.
//!
//! Pandoc parses a math snippet into a typed AST, which isolates the math
//! payload from surrounding markup far more reliably than raw pattern
//! matching. The subprocess call is blocking; availability is probed once.

use std::io::Write;
use std::process::{Command, Stdio};

use log::info;
use serde_json::Value;

use crate::error::{EnhanceError, Result};

/// A typed markup node, the minimum shape the transducer needs: literal
/// text versus math payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Math { latex: String, display: bool },
    Group(Vec<MarkupNode>),
}

/// An external parser turning a math snippet into typed markup nodes.
pub trait StructuralParser: Send + Sync {
    fn parse(&self, latex: &str, is_block: bool) -> Result<Vec<MarkupNode>>;
}

/// Pandoc-backed structural parser.
pub struct PandocParser;

impl PandocParser {
    pub fn new() -> Self {
        Self
    }

    /// Probe whether the pandoc binary is runnable.
    pub fn available() -> bool {
        let available = Command::new("pandoc")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);

        if available {
            info!("pandoc available for math processing");
        }
        available
    }
}

impl Default for PandocParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralParser for PandocParser {
    fn parse(&self, latex: &str, is_block: bool) -> Result<Vec<MarkupNode>> {
        let markdown = if is_block {
            format!("$$\n{}\n$$", latex)
        } else {
            format!("${}$", latex)
        };

        let mut child = Command::new("pandoc")
            .args(["-f", "markdown", "-t", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EnhanceError::Parser(format!("failed to spawn pandoc: {}", e)))?;

        child
            .stdin
            .take()
            .ok_or_else(|| EnhanceError::Parser("pandoc stdin unavailable".to_string()))?
            .write_all(markdown.as_bytes())
            .map_err(|e| EnhanceError::Parser(format!("failed to write to pandoc: {}", e)))?;

        let output = child
            .wait_with_output()
            .map_err(|e| EnhanceError::Parser(format!("pandoc did not finish: {}", e)))?;

        if !output.status.success() {
            return Err(EnhanceError::Parser(format!(
                "pandoc exited with {}",
                output.status
            )));
        }

        let ast: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| EnhanceError::Parser(format!("invalid pandoc AST: {}", e)))?;

        Ok(ast_to_nodes(&ast))
    }
}

/// Convert a pandoc JSON AST into typed markup nodes.
pub fn ast_to_nodes(value: &Value) -> Vec<MarkupNode> {
    match value {
        Value::Object(map) => {
            match map.get("t").and_then(Value::as_str) {
                Some("Math") => {
                    // c: [{t: InlineMath | DisplayMath}, "latex"]
                    let Some(c) = map.get("c").and_then(Value::as_array) else {
                        return Vec::new();
                    };
                    let display = c
                        .first()
                        .and_then(|v| v.get("t"))
                        .and_then(Value::as_str)
                        == Some("DisplayMath");
                    match c.get(1).and_then(Value::as_str) {
                        Some(latex) => vec![MarkupNode::Math {
                            latex: latex.to_string(),
                            display,
                        }],
                        None => Vec::new(),
                    }
                }
                Some("Str") => map
                    .get("c")
                    .and_then(Value::as_str)
                    .map(|s| vec![MarkupNode::Text(s.to_string())])
                    .unwrap_or_default(),
                Some(_) => match map.get("c") {
                    Some(c) => group(ast_to_nodes(c)),
                    None => Vec::new(),
                },
                // Document root: {pandoc-api-version, meta, blocks}
                None => match map.get("blocks") {
                    Some(blocks) => group(ast_to_nodes(blocks)),
                    None => Vec::new(),
                },
            }
        }
        Value::Array(items) => items.iter().flat_map(ast_to_nodes).collect(),
        _ => Vec::new(),
    }
}

fn group(children: Vec<MarkupNode>) -> Vec<MarkupNode> {
    if children.is_empty() {
        Vec::new()
    } else {
        vec![MarkupNode::Group(children)]
    }
}
