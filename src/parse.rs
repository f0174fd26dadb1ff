//! Raw Liquid scanner
//!
//! Produces a flat, position-aware tree of raw nodes: literal text, tag
//! statements, output statements, `{% comment %}` blocks, and
//! `{% liquid ... %}` containers whose children are bare statements (one
//! per line, no individual delimiters). Block tags such as `{% if %}` and
//! `{% endif %}` are kept as separate statements; the checks that care
//! about structure query the node model instead.

use thiserror::Error;

use crate::position;

/// A byte range within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Whether two spans intersect. Empty spans are treated as points and
    /// intersect by containment, so a cursor range still hits a node.
    pub fn intersects(&self, other: &Span) -> bool {
        if self.is_empty() {
            return other.contains(self.start);
        }
        if other.is_empty() {
            return self.contains(other.start);
        }
        self.start < other.end && other.start < self.end
    }
}

/// Index of a node in the arena owned by its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Kind tag of a raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// Document root, spanning the whole source.
    Root,
    /// Literal text between statements.
    Text,
    /// A `{% ... %}` tag statement, or a bare statement line inside a
    /// `{% liquid %}` container.
    Tag,
    /// A `{{ ... }}` output statement.
    Output,
    /// A `{% liquid ... %}` multi-statement container.
    LiquidTag,
    /// A `{% comment %}...{% endcomment %}` block, or a `#` line inside a
    /// `{% liquid %}` container.
    Comment,
}

/// One raw node as produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: RawKind,
    pub span: Span,
    /// Tag name (first word of the statement); empty for text and outputs.
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// True for statements without their own delimiters (liquid members).
    pub bare: bool,
}

/// Arena of raw nodes. Child indices always point forward, so the tree is
/// acyclic by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<RawNode>,
}

impl Ast {
    pub fn get(&self, id: NodeId) -> &RawNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, mut node: RawNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        if node.parent.is_none() && id != NodeId::ROOT {
            node.parent = Some(NodeId::ROOT);
        }
        let parent = node.parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }
}

/// Scanner failure. Anything recoverable becomes a partial node instead;
/// only unterminated delimiters abort the parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unclosed tag at line {line}: expected '%}}'")]
    UnclosedTag { line: usize },

    #[error("unclosed output at line {line}: expected '}}}}'")]
    UnclosedOutput { line: usize },

    #[error("unclosed comment at line {line}: expected '{{% endcomment %}}'")]
    UnclosedComment { line: usize },
}

fn line_of(source: &str, offset: usize) -> usize {
    position::position_at(source, offset).0 as usize + 1
}

fn tag_name(interior: &str) -> &str {
    interior
        .trim_start_matches('-')
        .split_whitespace()
        .next()
        .unwrap_or("")
}

/// Scan `source` into a raw tree.
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    let mut ast = Ast {
        nodes: vec![RawNode {
            kind: RawKind::Root,
            span: Span::new(0, source.len()),
            name: String::new(),
            parent: None,
            children: Vec::new(),
            bare: false,
        }],
    };

    let mut i = 0;
    while i < source.len() {
        let tag_at = source[i..].find("{%").map(|p| p + i);
        let out_at = source[i..].find("{{").map(|p| p + i);

        let (pos, is_output) = match (tag_at, out_at) {
            (None, None) => {
                push_text(&mut ast, Span::new(i, source.len()));
                break;
            }
            (Some(t), None) => (t, false),
            (None, Some(o)) => (o, true),
            (Some(t), Some(o)) => {
                if o < t {
                    (o, true)
                } else {
                    (t, false)
                }
            }
        };

        if pos > i {
            push_text(&mut ast, Span::new(i, pos));
        }

        if is_output {
            let close = source[pos + 2..]
                .find("}}")
                .ok_or(ParseError::UnclosedOutput {
                    line: line_of(source, pos),
                })?;
            let end = pos + 2 + close + 2;
            ast.push(RawNode {
                kind: RawKind::Output,
                span: Span::new(pos, end),
                name: String::new(),
                parent: Some(NodeId::ROOT),
                children: Vec::new(),
                bare: false,
            });
            i = end;
            continue;
        }

        let close = source[pos + 2..]
            .find("%}")
            .ok_or(ParseError::UnclosedTag {
                line: line_of(source, pos),
            })?;
        let end = pos + 2 + close + 2;
        let name = tag_name(&source[pos + 2..end - 2]).to_string();

        match name.as_str() {
            "comment" => {
                let body = source[end..]
                    .find("endcomment")
                    .ok_or(ParseError::UnclosedComment {
                        line: line_of(source, pos),
                    })?;
                let close = source[end + body..]
                    .find("%}")
                    .ok_or(ParseError::UnclosedComment {
                        line: line_of(source, pos),
                    })?;
                let comment_end = end + body + close + 2;
                ast.push(RawNode {
                    kind: RawKind::Comment,
                    span: Span::new(pos, comment_end),
                    name,
                    parent: Some(NodeId::ROOT),
                    children: Vec::new(),
                    bare: false,
                });
                i = comment_end;
            }
            "liquid" => {
                let container = ast.push(RawNode {
                    kind: RawKind::LiquidTag,
                    span: Span::new(pos, end),
                    name,
                    parent: Some(NodeId::ROOT),
                    children: Vec::new(),
                    bare: false,
                });
                parse_liquid_members(&mut ast, source, container, pos, end);
                i = end;
            }
            _ => {
                ast.push(RawNode {
                    kind: RawKind::Tag,
                    span: Span::new(pos, end),
                    name,
                    parent: Some(NodeId::ROOT),
                    children: Vec::new(),
                    bare: false,
                });
                i = end;
            }
        }
    }

    Ok(ast)
}

fn push_text(ast: &mut Ast, span: Span) {
    if span.is_empty() {
        return;
    }
    ast.push(RawNode {
        kind: RawKind::Text,
        span,
        name: String::new(),
        parent: Some(NodeId::ROOT),
        children: Vec::new(),
        bare: false,
    });
}

/// Split the interior of a `{% liquid %}` container into one bare
/// statement per non-empty line, each spanning the trimmed line content.
fn parse_liquid_members(ast: &mut Ast, source: &str, container: NodeId, start: usize, end: usize) {
    let interior_start = if source[start..].starts_with("{%-") {
        start + 3
    } else {
        start + 2
    };
    let interior_end = if source[..end].ends_with("-%}") {
        end - 3
    } else {
        end - 2
    };
    if interior_start >= interior_end {
        return;
    }

    let interior = &source[interior_start..interior_end];
    let keyword = match interior.find("liquid") {
        Some(at) => interior_start + at + "liquid".len(),
        None => return,
    };

    let mut line_start = keyword;
    while line_start < interior_end {
        let line_end = source[line_start..interior_end]
            .find('\n')
            .map(|p| line_start + p)
            .unwrap_or(interior_end);

        let line = &source[line_start..line_end];
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let lead = line.len() - line.trim_start().len();
            let span = Span::new(line_start + lead, line_start + lead + trimmed.len());
            let kind = if trimmed.starts_with('#') {
                RawKind::Comment
            } else {
                RawKind::Tag
            };
            ast.push(RawNode {
                kind,
                span,
                name: tag_name(trimmed).to_string(),
                parent: Some(container),
                children: Vec::new(),
                bare: true,
            });
        }

        line_start = line_end + 1;
    }
}
