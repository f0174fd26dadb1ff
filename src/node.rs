//! Position-aware node model
//!
//! Wraps the raw tree produced by the scanner. `Template` owns the source
//! text and the node arena; `Node` is a cheap view over one arena entry.
//! Parent links are plain indices into the arena, used only for context
//! queries, never for mutation.

use std::path::{Path, PathBuf};

use crate::parse::{self, Ast, NodeId, ParseError, RawKind, Span};

/// A parsed template: path, source text and the raw node arena.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    source: String,
    ast: Ast,
}

impl Template {
    /// Parse `source` into a template.
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let ast = parse::parse(&source)?;
        Ok(Self {
            path: path.into(),
            source,
            ast,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The document-root node.
    pub fn root(&self) -> Node<'_> {
        Node {
            template: self,
            id: NodeId::ROOT,
        }
    }

    /// All nodes in depth-first (source) order, root included.
    pub fn nodes(&self) -> Vec<Node<'_>> {
        let mut out = Vec::with_capacity(self.ast.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            out.push(Node { template: self, id });
            for &child in self.ast.get(id).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

/// View over one node in a template.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    template: &'a Template,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> RawKind {
        self.raw().kind
    }

    pub fn span(&self) -> Span {
        self.raw().span
    }

    /// Tag name (first word of the statement), empty for text and outputs.
    pub fn name(&self) -> &'a str {
        &self.raw().name
    }

    /// Raw source slice covered by this node.
    pub fn source_text(&self) -> &'a str {
        let span = self.span();
        &self.template.source[span.start..span.end]
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.raw().parent.map(|id| Node {
            template: self.template,
            id,
        })
    }

    pub fn children(&self) -> Vec<Node<'a>> {
        self.raw()
            .children
            .iter()
            .map(|&id| Node {
                template: self.template,
                id,
            })
            .collect()
    }

    /// 1-based line of the node's first byte.
    pub fn start_line(&self) -> usize {
        crate::position::position_at(&self.template.source, self.span().start).0 as usize + 1
    }

    /// The statement text between the delimiter tokens, byte-for-byte:
    /// re-wrapping the markup with the original delimiters reconstructs
    /// the node's source slice exactly. Bare statements (inside a
    /// `{% liquid %}` container) have no delimiters and return their whole
    /// slice; so do text nodes.
    pub fn markup(&self) -> &'a str {
        let text = self.source_text();
        let after_open = strip_open_delimiter(text);
        let start = text.len() - after_open.len();
        let interior = strip_close_delimiter(after_open);
        &text[start..start + interior.len()]
    }

    /// True for statements nested in a `{% liquid %}` container, which
    /// bundles bare statements under a single pair of delimiters.
    pub fn inside_liquid_tag(&self) -> bool {
        self.raw().bare
            && self
                .parent()
                .is_some_and(|p| p.kind() == RawKind::LiquidTag)
    }

    pub fn is_comment(&self) -> bool {
        self.kind() == RawKind::Comment
    }

    /// Literal text content; empty for non-text nodes.
    pub fn text(&self) -> &'a str {
        if self.kind() == RawKind::Text {
            self.source_text()
        } else {
            ""
        }
    }

    /// Whether the delimiter preceding this statement carries the `-` trim
    /// marker. The first bare member of a liquid container inherits the
    /// container's opening delimiter; other bare members have none.
    pub fn whitespace_trimmed_start(&self) -> bool {
        if self.raw().bare {
            return match self.parent() {
                Some(parent) if self.is_first_member() => {
                    parent.source_text().starts_with("{%-")
                }
                _ => false,
            };
        }
        let text = self.source_text();
        text.starts_with("{%-") || text.starts_with("{{-")
    }

    /// Whether the delimiter following this statement carries the `-` trim
    /// marker; the last bare member inherits the container's closing
    /// delimiter.
    pub fn whitespace_trimmed_end(&self) -> bool {
        if self.raw().bare {
            return match self.parent() {
                Some(parent) if self.is_last_member() => parent.source_text().ends_with("-%}"),
                _ => false,
            };
        }
        let text = self.source_text();
        text.ends_with("-%}") || text.ends_with("-}}")
    }

    fn is_first_member(&self) -> bool {
        self.parent()
            .map(|p| p.raw().children.first() == Some(&self.id))
            .unwrap_or(false)
    }

    fn is_last_member(&self) -> bool {
        self.parent()
            .map(|p| p.raw().children.last() == Some(&self.id))
            .unwrap_or(false)
    }

    fn raw(&self) -> &'a parse::RawNode {
        self.template.ast.get(self.id)
    }
}

fn strip_open_delimiter(text: &str) -> &str {
    for open in ["{%-", "{{-", "{%", "{{"] {
        if let Some(rest) = text.strip_prefix(open) {
            return rest;
        }
    }
    text
}

fn strip_close_delimiter(text: &str) -> &str {
    for close in ["-%}", "-}}", "%}", "}}"] {
        if let Some(rest) = text.strip_suffix(close) {
            return rest;
        }
    }
    text
}
