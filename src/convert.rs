//! Type conversions from engine types to LSP types

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{
    self, CodeAction as LspCodeAction, CodeActionKind, Diagnostic as LspDiagnostic,
    DiagnosticSeverity as LspDiagnosticSeverity, Position as LspPosition, Range as LspRange,
    TextEdit as LspTextEdit, Url, WorkspaceEdit,
};

use crate::code_action::CodeAction;
use crate::corrector::TextEdit;
use crate::offense::{Offense, Severity};
use crate::parse::Span;
use crate::position;

/// Convert a byte span to an LSP range against the document text.
pub fn to_lsp_range(text: &str, span: &Span) -> LspRange {
    let (start_line, start_character) = position::position_at(text, span.start);
    let (end_line, end_character) = position::position_at(text, span.end);
    LspRange {
        start: LspPosition {
            line: start_line,
            character: start_character,
        },
        end: LspPosition {
            line: end_line,
            character: end_character,
        },
    }
}

/// Convert an offense to an LSP diagnostic.
pub fn to_lsp_diagnostic(text: &str, offense: &Offense) -> LspDiagnostic {
    LspDiagnostic {
        range: to_lsp_range(text, &offense.span),
        severity: Some(to_lsp_severity(offense.severity)),
        code: Some(lsp_types::NumberOrString::String(offense.check.clone())),
        code_description: None,
        source: Some("sleet".to_string()),
        message: offense.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Convert an offense severity to an LSP severity.
fn to_lsp_severity(severity: Severity) -> LspDiagnosticSeverity {
    match severity {
        Severity::Error => LspDiagnosticSeverity::ERROR,
        Severity::Suggestion => LspDiagnosticSeverity::WARNING,
        Severity::Style => LspDiagnosticSeverity::INFORMATION,
    }
}

fn to_lsp_text_edit(text: &str, edit: &TextEdit) -> LspTextEdit {
    LspTextEdit {
        range: to_lsp_range(text, &edit.span),
        new_text: edit.new_text.clone(),
    }
}

/// Convert a quick-fix to an LSP code action carrying a workspace edit
/// against `uri`.
pub fn to_lsp_code_action(uri: &Url, text: &str, action: &CodeAction) -> LspCodeAction {
    let edits: Vec<LspTextEdit> = action
        .edits
        .iter()
        .map(|edit| to_lsp_text_edit(text, edit))
        .collect();

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);

    LspCodeAction {
        title: action.title.clone(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: None,
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        }),
        command: None,
        is_preferred: None,
        disabled: None,
        data: None,
    }
}

/// Resolve a document uri to a path relative to the project root.
pub fn uri_to_path(root: &Path, uri: &Url) -> Option<PathBuf> {
    let absolute = uri.to_file_path().ok()?;
    match absolute.strip_prefix(root) {
        Ok(relative) => Some(relative.to_path_buf()),
        Err(_) => Some(absolute),
    }
}

/// Build a document uri from a path relative to the project root.
pub fn path_to_uri(root: &Path, path: &Path) -> Option<Url> {
    Url::from_file_path(root.join(path)).ok()
}
