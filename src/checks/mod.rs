//! Built-in checks and the static check registry

mod liquid_tag;
mod space_inside_braces;

pub use liquid_tag::{LiquidTag, DEFAULT_MIN_CONSECUTIVE_STATEMENTS};
pub use space_inside_braces::SpaceInsideBraces;

use crate::check::Check;
use crate::config::Config;
use crate::offense::{Category, CheckMeta, Severity};

/// Identity of the synthetic offense raised when a document cannot be
/// parsed at all. Not a visitor check; the engine emits it directly.
pub const SYNTAX_ERROR: CheckMeta = CheckMeta {
    id: "SyntaxError",
    severity: Severity::Error,
    category: Category::Syntax,
};

/// Construct a fresh instance of every enabled check, in registration
/// order. Checks are stateful and must not be reused across documents.
pub fn build_checks(config: &Config) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = Vec::new();
    if config.liquid_tag.enabled {
        checks.push(Box::new(LiquidTag::new(
            config.liquid_tag.min_consecutive_statements,
        )));
    }
    if config.space_inside_braces.enabled {
        checks.push(Box::new(SpaceInsideBraces::new()));
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_respects_config() {
        let config = Config::default();
        assert_eq!(build_checks(&config).len(), 2);

        let mut config = Config::default();
        config.space_inside_braces.enabled = false;
        let checks = build_checks(&config);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].meta().id, "LiquidTag");
    }
}
