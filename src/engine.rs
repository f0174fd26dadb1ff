//! Core analysis engine
//!
//! Drives one depth-first traversal per document over every active check
//! and aggregates their offenses. Checking a document is a pure function
//! of its content and the enabled-check configuration; batch mode fans
//! out across files with rayon while each traversal stays single-threaded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::check::{Check, CheckContext};
use crate::checks::{self, SYNTAX_ERROR};
use crate::config::Config;
use crate::node::Template;
use crate::offense::Offense;
use crate::parse::{RawKind, Span};
use crate::storage::Storage;

/// A check whose callback failed mid-traversal. Reported as an
/// engine-level event, distinct from lint offenses; the check's partial
/// offenses for that document are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub check: String,
    pub message: String,
}

/// Result of checking one document.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub offenses: Vec<Offense>,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.offenses.iter().filter(|o| o.is_error()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.offenses.is_empty() && self.failures.is_empty()
    }
}

/// Check one document with the registered, enabled checks.
pub fn check_document(path: impl AsRef<Path>, source: &str, config: &Config) -> CheckReport {
    check_document_with(path, source, checks::build_checks(config))
}

/// Check one document with an explicit check set (fresh instances).
pub fn check_document_with(
    path: impl AsRef<Path>,
    source: &str,
    checks: Vec<Box<dyn Check>>,
) -> CheckReport {
    let path = path.as_ref();

    let template = match Template::parse(path, source) {
        Ok(template) => template,
        Err(err) => {
            // all other checks are skipped for this recheck
            return CheckReport {
                offenses: vec![Offense::new(&SYNTAX_ERROR, err.to_string(), Span::new(0, 0))],
                failures: Vec::new(),
            };
        }
    };

    struct Active<'t> {
        check: Box<dyn Check>,
        ctx: CheckContext<'t>,
        failed: Option<String>,
    }

    let mut active: Vec<Active<'_>> = checks
        .into_iter()
        .map(|check| {
            let ctx = CheckContext::new(&template, check.meta());
            Active {
                check,
                ctx,
                failed: None,
            }
        })
        .collect();

    let root = template.root();
    for entry in active.iter_mut() {
        if let Err(err) = entry.check.on_document(&root, &mut entry.ctx) {
            entry.failed = Some(err.to_string());
        }
    }

    for node in template.nodes() {
        for entry in active.iter_mut() {
            if entry.failed.is_some() {
                continue;
            }
            let outcome = match node.kind() {
                RawKind::Tag | RawKind::LiquidTag | RawKind::Comment => {
                    entry.check.on_tag(&node, &mut entry.ctx)
                }
                RawKind::Output => entry.check.on_output(&node, &mut entry.ctx),
                RawKind::Text => entry.check.on_text(&node, &mut entry.ctx),
                RawKind::Root => Ok(()),
            };
            if let Err(err) = outcome {
                entry.failed = Some(err.to_string());
            }
        }
    }

    for entry in active.iter_mut() {
        if entry.failed.is_none() {
            if let Err(err) = entry.check.after_document(&mut entry.ctx) {
                entry.failed = Some(err.to_string());
            }
        }
    }

    let mut report = CheckReport::default();
    for mut entry in active {
        let offenses = entry.ctx.take_offenses();
        match entry.failed {
            Some(message) => {
                log::error!(
                    "check {} failed on {}: {}",
                    entry.check.meta().id,
                    path.display(),
                    message
                );
                report.failures.push(CheckFailure {
                    check: entry.check.meta().id.to_string(),
                    message,
                });
            }
            None => report.offenses.extend(offenses),
        }
    }
    report
}

/// Batch entry point over a storage view.
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check every path, in parallel across files. Paths absent from
    /// storage yield an empty report. Check failures are kept per path so
    /// callers can surface them instead of mistaking a crashed run for a
    /// clean one.
    pub fn check_all(
        &self,
        storage: &dyn Storage,
        paths: &[PathBuf],
    ) -> BTreeMap<PathBuf, CheckReport> {
        paths
            .par_iter()
            .map(|path| {
                let report = match storage.read(path) {
                    Some(source) => check_document(path, &source, &self.config),
                    None => CheckReport::default(),
                };
                (path.clone(), report)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offense::{Category, CheckMeta, Severity};
    use anyhow::anyhow;

    #[test]
    fn test_syntax_error_produces_single_offense() {
        let report = check_document("a.liquid", "{{x}} and {% broken", &Config::default());
        assert_eq!(report.offenses.len(), 1);
        let offense = &report.offenses[0];
        assert_eq!(offense.check, "SyntaxError");
        assert_eq!(offense.severity, Severity::Error);
        assert!(!offense.correctable());
    }

    #[test]
    fn test_clean_document() {
        let report = check_document("a.liquid", "{{ x }}\n", &Config::default());
        assert!(report.is_clean());
    }

    #[test]
    fn test_empty_document_yields_empty_set() {
        let report = check_document("a.liquid", "", &Config::default());
        assert!(report.offenses.is_empty());
    }

    const FAILING_META: CheckMeta = CheckMeta {
        id: "Failing",
        severity: Severity::Suggestion,
        category: Category::Liquid,
    };

    /// Reports an offense, then errors on the next tag.
    struct FailingCheck {
        seen: usize,
    }

    impl Check for FailingCheck {
        fn meta(&self) -> &'static CheckMeta {
            &FAILING_META
        }

        fn on_tag(
            &mut self,
            node: &crate::node::Node<'_>,
            ctx: &mut CheckContext<'_>,
        ) -> anyhow::Result<()> {
            self.seen += 1;
            if self.seen == 1 {
                ctx.report(node, "partial offense");
                Ok(())
            } else {
                Err(anyhow!("boom"))
            }
        }
    }

    const COUNTING_META: CheckMeta = CheckMeta {
        id: "Counting",
        severity: Severity::Style,
        category: Category::Style,
    };

    /// Reports one offense per tag, never fails.
    struct CountingCheck;

    impl Check for CountingCheck {
        fn meta(&self) -> &'static CheckMeta {
            &COUNTING_META
        }

        fn on_tag(
            &mut self,
            node: &crate::node::Node<'_>,
            ctx: &mut CheckContext<'_>,
        ) -> anyhow::Result<()> {
            ctx.report(node, "tag seen");
            Ok(())
        }
    }

    #[test]
    fn test_failing_check_is_isolated() {
        let source = "{% assign a = 1 %}{% assign b = 2 %}{% assign c = 3 %}";
        let report = check_document_with(
            "a.liquid",
            source,
            vec![Box::new(FailingCheck { seen: 0 }), Box::new(CountingCheck)],
        );

        // failing check's partial offenses are discarded
        assert!(report.offenses.iter().all(|o| o.check == "Counting"));
        // the other check still saw every tag
        assert_eq!(report.offenses.len(), 3);
        assert_eq!(
            report.failures,
            vec![CheckFailure {
                check: "Failing".to_string(),
                message: "boom".to_string(),
            }]
        );
    }

    #[test]
    fn test_check_all_with_missing_path() {
        use crate::storage::InMemoryStorage;
        let storage = InMemoryStorage::new();
        storage.write(Path::new("a.liquid"), "{{x}}").unwrap();

        let engine = Engine::new(Config::default());
        let results = engine.check_all(
            &storage,
            &[PathBuf::from("a.liquid"), PathBuf::from("missing.liquid")],
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[Path::new("a.liquid")].offenses.len(), 1);
        assert!(results[Path::new("missing.liquid")].is_clean());
    }

    #[test]
    fn test_check_is_pure_function_of_content() {
        let source = "{{x}}";
        let a = check_document("a.liquid", source, &Config::default());
        let b = check_document("a.liquid", source, &Config::default());
        assert_eq!(a.offenses, b.offenses);
    }
}
