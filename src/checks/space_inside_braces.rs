//! Enforces a single space just inside output delimiters.

use anyhow::Result;

use crate::check::{Check, CheckContext};
use crate::node::Node;
use crate::offense::{Category, CheckMeta, Severity};

const META: CheckMeta = CheckMeta {
    id: "SpaceInsideBraces",
    severity: Severity::Style,
    category: Category::Style,
};

/// Flags single-line `{{ ... }}` statements whose interior is not padded
/// with exactly one space on each side, e.g. `{{x}}` or `{{  x }}`.
/// Autocorrects by rebuilding the statement around the trimmed expression,
/// preserving whitespace-trim markers.
#[derive(Default)]
pub struct SpaceInsideBraces;

impl SpaceInsideBraces {
    pub fn new() -> Self {
        Self
    }
}

impl Check for SpaceInsideBraces {
    fn meta(&self) -> &'static CheckMeta {
        &META
    }

    fn on_output(&mut self, node: &Node<'_>, ctx: &mut CheckContext<'_>) -> Result<()> {
        let markup = node.markup();
        if markup.contains('\n') {
            return Ok(());
        }
        let expression = markup.trim();
        if expression.is_empty() || markup == format!(" {expression} ") {
            return Ok(());
        }

        let source = node.source_text();
        let open = if source.starts_with("{{-") { "{{-" } else { "{{" };
        let close = if source.ends_with("-}}") { "-}}" } else { "}}" };
        let fixed = format!("{open} {expression} {close}");
        let span = node.span();

        ctx.report_correctable(
            node,
            "Use one space inside '{{' and '}}'",
            move |corrector| corrector.replace(span, fixed.clone()),
        );
        Ok(())
    }
}
