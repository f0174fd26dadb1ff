//! Batch autocorrection
//!
//! Realizes every correctable offense for a document, drops correctors
//! that would conflict, and re-serializes the text once, edits applied in
//! descending source order. Applying a document's fixes is atomic: every
//! surviving edit commits against the same immutable version of the text.

use std::path::PathBuf;

use crate::corrector::{apply_edits, edits_conflict, TextEdit};
use crate::engine::check_document;
use crate::config::Config;
use crate::offense::Offense;
use crate::storage::Storage;

/// Result of fixing one document.
#[derive(Debug)]
pub struct FixOutcome {
    /// Rewritten text (equal to the input when nothing applied).
    pub text: String,
    /// Correctors applied.
    pub applied: usize,
    /// Correctable offenses left unfixed: conflicting pairs and correctors
    /// that failed to realize.
    pub unfixed: usize,
}

impl FixOutcome {
    pub fn changed(&self, original: &str) -> bool {
        self.text != original
    }
}

/// Result of a batch fix run.
#[derive(Debug, Default)]
pub struct FixSummary {
    pub files_modified: usize,
    pub fixes_applied: usize,
    pub fixes_unfixed: usize,
    pub errors: Vec<String>,
}

/// Apply every applicable corrector among `offenses` to `source`.
///
/// Two correctors whose edits overlap are both rejected; neither side of a
/// conflicting pair is applied.
pub fn fix_document(source: &str, offenses: &[Offense]) -> FixOutcome {
    let mut candidates: Vec<(usize, Vec<TextEdit>)> = Vec::new();
    let mut unfixed = 0;

    for (index, offense) in offenses.iter().enumerate() {
        match offense.correct(source.len()) {
            None => {}
            Some(Ok(edits)) => candidates.push((index, edits)),
            Some(Err(err)) => {
                log::warn!("corrector for {} failed: {}", offense.check, err);
                unfixed += 1;
            }
        }
    }

    let mut conflicting = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if edits_conflict(&candidates[i].1, &candidates[j].1) {
                conflicting[i] = true;
                conflicting[j] = true;
            }
        }
    }

    let mut edits: Vec<TextEdit> = Vec::new();
    let mut applied = 0;
    for (slot, (_, candidate)) in candidates.into_iter().enumerate() {
        if conflicting[slot] {
            unfixed += 1;
        } else {
            edits.extend(candidate);
            applied += 1;
        }
    }

    FixOutcome {
        text: apply_edits(source, &edits),
        applied,
        unfixed,
    }
}

/// Check and fix every path, persisting rewritten text through storage.
pub fn fix_all(storage: &dyn Storage, paths: &[PathBuf], config: &Config) -> FixSummary {
    let mut summary = FixSummary::default();

    for path in paths {
        let Some(source) = storage.read(path) else {
            continue;
        };
        let report = check_document(path, &source, config);
        let outcome = fix_document(&source, &report.offenses);
        summary.fixes_applied += outcome.applied;
        summary.fixes_unfixed += outcome.unfixed;

        if outcome.changed(&source) {
            match storage.write(path, &outcome.text) {
                Ok(()) => summary.files_modified += 1,
                Err(err) => summary.errors.push(format!("{}: {}", path.display(), err)),
            }
        }
    }

    summary
}
