//! Per-document offense storage with a supersede contract
//!
//! Keyed by document path; each recheck replaces the previous offense set
//! wholesale. Version stamps implement the ordering contract for
//! concurrent rechecks: a recheck started for version N publishes only if
//! N is still the latest known version for that path when it completes,
//! so a stale result can never land after a newer one.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::offense::Offense;

#[derive(Debug, Default)]
struct Entry {
    latest_version: u64,
    /// None until a first recheck publishes; `begin` alone must not make
    /// an empty set observable.
    offenses: Option<Vec<Offense>>,
}

/// Process-wide store of the current offense set per document path.
/// Created at server start, passed by reference into the engine's entry
/// points.
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    entries: DashMap<PathBuf, Entry>,
}

impl DiagnosticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a recheck for `path`: bumps and returns the version stamp the
    /// eventual publish must present.
    pub fn begin(&self, path: &Path) -> u64 {
        let mut entry = self.entries.entry(path.to_path_buf()).or_default();
        entry.latest_version += 1;
        entry.latest_version
    }

    /// Store the offense set produced by the recheck stamped `version`.
    /// Returns false (and stores nothing) when a newer recheck has begun
    /// since; the stale result must not be published.
    pub fn publish(&self, path: &Path, version: u64, offenses: Vec<Offense>) -> bool {
        match self.entries.get_mut(path) {
            Some(mut entry) if entry.latest_version == version => {
                entry.offenses = Some(offenses);
                true
            }
            _ => false,
        }
    }

    /// Current offense set for `path`, if any recheck has published one.
    pub fn get(&self, path: &Path) -> Option<Vec<Offense>> {
        self.entries
            .get(path)
            .and_then(|entry| entry.offenses.clone())
    }

    /// Drop the entry for `path` (document deleted or renamed away).
    pub fn remove(&self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offense::{Category, CheckMeta, Severity};
    use crate::parse::Span;

    const META: CheckMeta = CheckMeta {
        id: "Test",
        severity: Severity::Suggestion,
        category: Category::Liquid,
    };

    fn offense(message: &str) -> Offense {
        Offense::new(&META, message, Span::new(0, 1))
    }

    #[test]
    fn test_publish_replaces_not_merges() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");

        let v1 = store.begin(path);
        assert!(store.publish(path, v1, vec![offense("one"), offense("two")]));
        assert_eq!(store.get(path).unwrap().len(), 2);

        let v2 = store.begin(path);
        assert!(store.publish(path, v2, vec![offense("three")]));
        let current = store.get(path).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].message, "three");
    }

    #[test]
    fn test_stale_publish_is_dropped() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");

        let stale = store.begin(path);
        let fresh = store.begin(path);

        assert!(store.publish(path, fresh, vec![offense("fresh")]));
        // in-flight recheck of older content completes afterwards
        assert!(!store.publish(path, stale, vec![offense("stale")]));

        let current = store.get(path).unwrap();
        assert_eq!(current[0].message, "fresh");
    }

    #[test]
    fn test_empty_set_still_published() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");
        let v = store.begin(path);
        assert!(store.publish(path, v, vec![offense("old")]));

        let v = store.begin(path);
        assert!(store.publish(path, v, Vec::new()));
        assert_eq!(store.get(path).unwrap().len(), 0);
    }

    #[test]
    fn test_get_is_none_until_first_publish() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");

        // an in-flight first recheck must not look like a cached empty set
        let v = store.begin(path);
        assert!(store.get(path).is_none());

        store.publish(path, v, vec![offense("x")]);
        assert_eq!(store.get(path).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_clears_entry() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");
        let v = store.begin(path);
        store.publish(path, v, vec![offense("x")]);

        store.remove(path);
        assert!(store.get(path).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_publish_after_remove_is_dropped() {
        let store = DiagnosticsStore::new();
        let path = Path::new("a.liquid");
        let v = store.begin(path);
        store.remove(path);
        assert!(!store.publish(path, v, vec![offense("ghost")]));
        assert!(store.get(path).is_none());
    }

    #[test]
    fn test_paths_are_independent() {
        let store = DiagnosticsStore::new();
        let a = Path::new("a.liquid");
        let b = Path::new("b.liquid");

        let va = store.begin(a);
        let vb = store.begin(b);
        assert!(store.publish(a, va, vec![offense("a")]));
        assert!(store.publish(b, vb, vec![offense("b")]));
        assert_eq!(store.len(), 2);
    }
}
