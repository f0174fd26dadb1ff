//! Check contract: the visitor interface lint rules implement
//!
//! A check subscribes to traversal events by overriding the callbacks it
//! cares about; the engine drives one depth-first traversal per document
//! and invokes every interested check at each node, in registration order.
//! Checks are stateful across one document's traversal and constructed
//! fresh per run; `after_document` is where accumulated state is flushed
//! into offenses.

use anyhow::Result;

use crate::corrector::Corrector;
use crate::node::{Node, Template};
use crate::offense::{CheckMeta, Offense};
use crate::parse::Span;

/// A lint rule. Callbacks default to no-ops; a check implements only the
/// events it subscribes to. Callback errors abort that check for the
/// current document without affecting other checks.
pub trait Check: Send {
    /// Identity fixed at registration: id, severity, category.
    fn meta(&self) -> &'static CheckMeta;

    /// Document start, before any node event.
    fn on_document(&mut self, _root: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        Ok(())
    }

    /// A tag statement: delimited `{% ... %}`, a `{% liquid %}` container,
    /// a bare statement inside one, or a comment.
    fn on_tag(&mut self, _node: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        Ok(())
    }

    /// An output statement `{{ ... }}`.
    fn on_output(&mut self, _node: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        Ok(())
    }

    /// A literal text node.
    fn on_text(&mut self, _node: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Document end, after the full tree is visited.
    fn after_document(&mut self, _ctx: &mut CheckContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Per-check reporting context for one document traversal. Offenses are
/// buffered per check so a failing check's partial findings can be
/// discarded without touching the others.
pub struct CheckContext<'t> {
    template: &'t Template,
    meta: &'static CheckMeta,
    offenses: Vec<Offense>,
}

impl<'t> CheckContext<'t> {
    pub(crate) fn new(template: &'t Template, meta: &'static CheckMeta) -> Self {
        Self {
            template,
            meta,
            offenses: Vec::new(),
        }
    }

    pub fn template(&self) -> &'t Template {
        self.template
    }

    /// Raise an offense anchored at a node.
    pub fn report(&mut self, node: &Node<'_>, message: impl Into<String>) {
        self.report_at(node.span(), message);
    }

    /// Raise an offense anchored at an explicit span.
    pub fn report_at(&mut self, span: Span, message: impl Into<String>) {
        self.offenses.push(Offense::new(self.meta, message, span));
    }

    /// Raise an autocorrectable offense; the corrector-building closure is
    /// invoked lazily, only when a caller applies the fix.
    pub fn report_correctable(
        &mut self,
        node: &Node<'_>,
        message: impl Into<String>,
        correction: impl Fn(&mut Corrector) + Send + Sync + 'static,
    ) {
        self.report_correctable_at(node.span(), message, correction);
    }

    /// Span-anchored variant of [`report_correctable`], for checks that
    /// flush accumulated state after the traversal, when node views are no
    /// longer at hand.
    ///
    /// [`report_correctable`]: Self::report_correctable
    pub fn report_correctable_at(
        &mut self,
        span: Span,
        message: impl Into<String>,
        correction: impl Fn(&mut Corrector) + Send + Sync + 'static,
    ) {
        self.offenses
            .push(Offense::new(self.meta, message, span).with_correction(correction));
    }

    pub(crate) fn take_offenses(&mut self) -> Vec<Offense> {
        std::mem::take(&mut self.offenses)
    }
}
