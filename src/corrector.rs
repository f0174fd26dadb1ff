//! Deferred text edits for autocorrection
//!
//! A `Corrector` accumulates primitive operations against one immutable
//! version of a document and realizes them into concrete byte-range edits
//! on demand. Edits from a single corrector must not overlap; application
//! is atomic per document and runs in descending source order so earlier
//! edits keep later offsets valid.

use thiserror::Error;

use crate::parse::Span;

/// A primitive corrector operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Replace the span with new text.
    Replace { span: Span, text: String },
    /// Remove the span entirely.
    Remove { span: Span },
    /// Insert text at a position.
    Insert { at: usize, text: String },
}

impl EditOp {
    fn to_edit(&self) -> TextEdit {
        match self {
            EditOp::Replace { span, text } => TextEdit {
                span: *span,
                new_text: text.clone(),
            },
            EditOp::Remove { span } => TextEdit {
                span: *span,
                new_text: String::new(),
            },
            EditOp::Insert { at, text } => TextEdit {
                span: Span::new(*at, *at),
                new_text: text.clone(),
            },
        }
    }
}

/// A realized byte-range edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

/// Error realizing a corrector into edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrectError {
    #[error("overlapping edits at {0}..{1} and {2}..{3}")]
    Overlap(usize, usize, usize, usize),

    #[error("edit span {0}..{1} is out of bounds (document is {2} bytes)")]
    OutOfBounds(usize, usize, usize),
}

/// Accumulates edit operations for one offense.
#[derive(Debug, Default, Clone)]
pub struct Corrector {
    ops: Vec<EditOp>,
}

impl Corrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `span` with `text`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.ops.push(EditOp::Replace {
            span,
            text: text.into(),
        });
    }

    /// Remove `span` entirely.
    pub fn remove(&mut self, span: Span) {
        self.ops.push(EditOp::Remove { span });
    }

    /// Insert `text` at byte offset `at`.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.ops.push(EditOp::Insert {
            at,
            text: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Realize the accumulated operations into edits sorted descending by
    /// position, validating bounds and rejecting overlapping pairs.
    pub fn into_edits(self, source_len: usize) -> Result<Vec<TextEdit>, CorrectError> {
        let mut edits: Vec<TextEdit> = self.ops.iter().map(EditOp::to_edit).collect();

        for edit in &edits {
            if edit.span.end < edit.span.start || edit.span.end > source_len {
                return Err(CorrectError::OutOfBounds(
                    edit.span.start,
                    edit.span.end,
                    source_len,
                ));
            }
        }

        edits.sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.span.end.cmp(&a.span.end)));

        for pair in edits.windows(2) {
            // sorted descending: pair[1] starts at or before pair[0]
            if pair[1].span.end > pair[0].span.start {
                return Err(CorrectError::Overlap(
                    pair[1].span.start,
                    pair[1].span.end,
                    pair[0].span.start,
                    pair[0].span.end,
                ));
            }
        }

        Ok(edits)
    }
}

/// Whether any edit in `a` overlaps any edit in `b`. Touching ranges do
/// not conflict; two inserts at the same offset do.
pub fn edits_conflict(a: &[TextEdit], b: &[TextEdit]) -> bool {
    a.iter().any(|x| {
        b.iter().any(|y| {
            if x.span.is_empty() && y.span.is_empty() {
                x.span.start == y.span.start
            } else {
                x.span.start < y.span.end && y.span.start < x.span.end
            }
        })
    })
}

/// Apply edits to `source`. Edits must be non-overlapping; they are
/// applied in descending source order regardless of input order.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.span.end.cmp(&a.span.end)));

    let mut out = source.to_string();
    for edit in sorted {
        out.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    out
}
