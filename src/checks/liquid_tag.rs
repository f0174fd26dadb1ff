//! Recommends `{% liquid ... %}` when several consecutive tag statements
//! appear in a row.

use anyhow::Result;

use crate::check::{Check, CheckContext};
use crate::node::Node;
use crate::offense::{Category, CheckMeta, Severity};
use crate::parse::Span;

const META: CheckMeta = CheckMeta {
    id: "LiquidTag",
    severity: Severity::Suggestion,
    category: Category::Liquid,
};

pub const DEFAULT_MIN_CONSECUTIVE_STATEMENTS: usize = 5;

/// One run of consecutive tag statements.
#[derive(Debug, Clone)]
struct Run {
    first_span: Span,
    /// Span and delimiter-stripped markup of every member, in order.
    members: Vec<(Span, String)>,
}

/// Watches bare `{% ... %}` statements and reports runs of
/// `min_consecutive_statements` or more as one offense anchored at the
/// run's first node. A run breaks on statements already inside a
/// `{% liquid %}` container and on non-blank literal text; comments are
/// ignored entirely and blank text between tags keeps a run alive.
/// else/elsif get no special handling.
pub struct LiquidTag {
    min_consecutive_statements: usize,
    current: Option<Run>,
    complete: Vec<Run>,
}

impl LiquidTag {
    pub fn new(min_consecutive_statements: usize) -> Self {
        Self {
            min_consecutive_statements,
            current: None,
            complete: Vec::new(),
        }
    }

    fn accumulate(&mut self, node: &Node<'_>) {
        let run = self.current.get_or_insert_with(|| Run {
            first_span: node.span(),
            members: Vec::new(),
        });
        run.members
            .push((node.span(), node.markup().trim().to_string()));
    }

    fn reset(&mut self) {
        if let Some(run) = self.current.take() {
            if run.members.len() >= self.min_consecutive_statements {
                self.complete.push(run);
            }
        }
    }
}

impl Check for LiquidTag {
    fn meta(&self) -> &'static CheckMeta {
        &META
    }

    fn on_tag(&mut self, node: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        if node.inside_liquid_tag() {
            self.reset();
        } else if !node.is_comment() {
            self.accumulate(node);
        }
        Ok(())
    }

    fn on_text(&mut self, node: &Node<'_>, _ctx: &mut CheckContext<'_>) -> Result<()> {
        // line breaks between tags do not break a run
        if !node.text().trim().is_empty() {
            self.reset();
        }
        Ok(())
    }

    fn after_document(&mut self, ctx: &mut CheckContext<'_>) -> Result<()> {
        self.reset();
        for run in self.complete.drain(..) {
            let first_span = run.first_span;
            let rest: Vec<Span> = run.members[1..].iter().map(|(span, _)| *span).collect();

            // one bundled block: opener, one interior-markup line per
            // merged statement, closer
            let mut replacement = String::from("{% liquid\n");
            for (_, markup) in &run.members {
                replacement.push(' ');
                replacement.push_str(markup);
                replacement.push('\n');
            }
            replacement.push_str("%}");

            ctx.report_correctable_at(
                first_span,
                "Use {% liquid ... %} to write multiple tags",
                move |corrector| {
                    for span in &rest {
                        corrector.remove(*span);
                    }
                    corrector.replace(first_span, replacement.clone());
                },
            );
        }
        Ok(())
    }
}
