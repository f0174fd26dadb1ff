//! Offense types: lint findings produced by checks

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::corrector::{CorrectError, Corrector, TextEdit};
use crate::parse::Span;

/// Severity of an offense.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Stylistic nit.
    Style,
    /// Likely improvement.
    #[default]
    Suggestion,
    /// Definite problem.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Style => write!(f, "style"),
            Severity::Suggestion => write!(f, "suggestion"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "style" => Ok(Severity::Style),
            "suggestion" | "warning" => Ok(Severity::Suggestion),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Category tag for grouping related checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Liquid,
    Syntax,
    Style,
    Performance,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Liquid => write!(f, "liquid"),
            Category::Syntax => write!(f, "syntax"),
            Category::Style => write!(f, "style"),
            Category::Performance => write!(f, "performance"),
        }
    }
}

/// Identity of a check, fixed at registration: id, severity, category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckMeta {
    pub id: &'static str,
    pub severity: Severity,
    pub category: Category,
}

type CorrectionFn = dyn Fn(&mut Corrector) + Send + Sync;

/// One lint finding against one document.
///
/// Immutable value record; a recheck replaces the whole offense set for a
/// document rather than patching it. The optional correction is a deferred
/// corrector-building closure, realized only when a caller applies it.
#[derive(Clone)]
pub struct Offense {
    pub check: String,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub span: Span,
    correction: Option<Arc<CorrectionFn>>,
}

impl Offense {
    pub fn new(meta: &CheckMeta, message: impl Into<String>, span: Span) -> Self {
        Self {
            check: meta.id.to_string(),
            severity: meta.severity,
            category: meta.category,
            message: message.into(),
            span,
            correction: None,
        }
    }

    pub fn with_correction(
        mut self,
        correction: impl Fn(&mut Corrector) + Send + Sync + 'static,
    ) -> Self {
        self.correction = Some(Arc::new(correction));
        self
    }

    pub fn correctable(&self) -> bool {
        self.correction.is_some()
    }

    /// Realize the correction into concrete edits against a document of
    /// `source_len` bytes. Returns `None` when the offense carries no
    /// correction.
    pub fn correct(&self, source_len: usize) -> Option<Result<Vec<TextEdit>, CorrectError>> {
        let correction = self.correction.as_ref()?;
        let mut corrector = Corrector::new();
        correction(&mut corrector);
        Some(corrector.into_edits(source_len))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Debug for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Offense")
            .field("check", &self.check)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .field("message", &self.message)
            .field("span", &self.span)
            .field("correctable", &self.correctable())
            .finish()
    }
}

impl PartialEq for Offense {
    fn eq(&self, other: &Self) -> bool {
        self.check == other.check
            && self.severity == other.severity
            && self.category == other.category
            && self.message == other.message
            && self.span == other.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Span;

    const TEST_META: CheckMeta = CheckMeta {
        id: "TestCheck",
        severity: Severity::Suggestion,
        category: Category::Liquid,
    };

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Suggestion);
        assert!(Severity::Suggestion > Severity::Style);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("suggestion".parse::<Severity>(), Ok(Severity::Suggestion));
        assert_eq!("style".parse::<Severity>(), Ok(Severity::Style));
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn test_offense_without_correction() {
        let offense = Offense::new(&TEST_META, "message", Span::new(0, 4));
        assert!(!offense.correctable());
        assert!(offense.correct(10).is_none());
    }

    #[test]
    fn test_offense_correction_is_deferred() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_closure = Arc::clone(&calls);

        let offense = Offense::new(&TEST_META, "message", Span::new(0, 4)).with_correction(
            move |corrector| {
                calls_in_closure.fetch_add(1, Ordering::SeqCst);
                corrector.replace(Span::new(0, 4), "new");
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let edits = offense.correct(10).unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "new");
    }

    #[test]
    fn test_offense_equality_ignores_correction() {
        let a = Offense::new(&TEST_META, "m", Span::new(0, 1));
        let b = Offense::new(&TEST_META, "m", Span::new(0, 1)).with_correction(|_| {});
        assert_eq!(a, b);
    }
}
