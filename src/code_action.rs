//! Code actions: quick-fixes computed from the current offense set
//!
//! Maps a requested text range to the offenses whose corrector applies,
//! realizing each corrector independently into a concrete edit list. Only
//! offenses intersecting the range are realized; nothing speculative.

use std::path::Path;

use crate::config::Config;
use crate::corrector::TextEdit;
use crate::diagnostics::DiagnosticsStore;
use crate::engine;
use crate::parse::Span;
use crate::position;
use crate::storage::Storage;

/// One titled edit proposal, fixing exactly one offense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    pub check: String,
    pub edits: Vec<TextEdit>,
}

/// Computes quick-fixes against current storage content and the cached
/// offense set.
pub struct CodeActionEngine<'a> {
    storage: &'a dyn Storage,
    diagnostics: &'a DiagnosticsStore,
    config: &'a Config,
}

impl<'a> CodeActionEngine<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        diagnostics: &'a DiagnosticsStore,
        config: &'a Config,
    ) -> Self {
        Self {
            storage,
            diagnostics,
            config,
        }
    }

    /// Quick-fixes for the given (line, character) range. A path absent
    /// from storage yields an empty list.
    pub fn code_actions(
        &self,
        path: &Path,
        start: (u32, u32),
        end: (u32, u32),
    ) -> Vec<CodeAction> {
        let Some(text) = self.storage.read(path) else {
            return Vec::new();
        };

        let range = Span::new(
            position::offset_at(&text, start.0, start.1),
            position::offset_at(&text, end.0, end.1),
        );

        // cached set when a recheck has published one; otherwise compute
        // fresh, which matches what a direct check would produce
        let offenses = self
            .diagnostics
            .get(path)
            .unwrap_or_else(|| engine::check_document(path, &text, self.config).offenses);

        offenses
            .iter()
            .filter(|offense| offense.correctable() && offense.span.intersects(&range))
            .filter_map(|offense| {
                let edits = offense.correct(text.len())?.ok()?;
                Some(CodeAction {
                    title: format!("Fix: {}", offense.message),
                    check: offense.check.clone(),
                    edits,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use std::path::PathBuf;

    fn setup(source: &str) -> (InMemoryStorage, DiagnosticsStore, Config, PathBuf) {
        let storage = InMemoryStorage::new();
        let path = PathBuf::from("snippets/a.liquid");
        storage.write(&path, source).unwrap();
        (storage, DiagnosticsStore::new(), Config::default(), path)
    }

    #[test]
    fn test_action_for_offense_in_range() {
        let (storage, diagnostics, config, path) = setup("{{x}}");
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);

        let actions = engine.code_actions(&path, (0, 0), (0, 5));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].check, "SpaceInsideBraces");
        assert_eq!(actions[0].edits[0].new_text, "{{ x }}");
    }

    #[test]
    fn test_partial_overlap_still_included() {
        // range covers only the first byte of the offense span
        let (storage, diagnostics, config, path) = setup("{{x}}");
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 0), (0, 1));
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_cursor_inside_offense() {
        let (storage, diagnostics, config, path) = setup("text {{x}}");
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 7), (0, 7));
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_range_outside_offense_yields_nothing() {
        let (storage, diagnostics, config, path) = setup("{{x}} trailing text");
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 10), (0, 15));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_offense_without_corrector_excluded() {
        // unparseable document: only the synthetic syntax-error offense
        let (storage, diagnostics, config, path) = setup("{% broken");
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 0), (0, 9));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_missing_path_yields_nothing() {
        let storage = InMemoryStorage::new();
        let diagnostics = DiagnosticsStore::new();
        let config = Config::default();
        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(Path::new("absent.liquid"), (0, 0), (0, 5));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_in_flight_first_recheck_computes_fresh() {
        let (storage, diagnostics, config, path) = setup("{{x}}");

        // a first recheck has begun but not yet published
        diagnostics.begin(&path);

        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 0), (0, 5));
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_uses_cached_offense_set_when_present() {
        let (storage, diagnostics, config, path) = setup("{{x}}");

        // a recheck published an empty set; the cache wins over recompute
        let version = diagnostics.begin(&path);
        diagnostics.publish(&path, version, Vec::new());

        let engine = CodeActionEngine::new(&storage, &diagnostics, &config);
        let actions = engine.code_actions(&path, (0, 0), (0, 5));
        assert!(actions.is_empty());
    }
}
