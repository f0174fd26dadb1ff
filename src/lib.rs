//! Sleet - a fast linter and language server for Liquid templates
//!
//! Scans Liquid source into a position-aware node tree, runs a set of
//! visitor-style checks over it, and reports offenses with optional
//! autocorrections. The same engine backs a batch CLI and an LSP server.
//!
//! # Architecture
//!
//! ```text
//! CLI/LSP -> Engine -> Check -> Offense -> Corrector/Diagnostics
//! ```
//!
//! The engine parses each document once, dispatches every node to every
//! enabled check, and aggregates their offenses. Corrections are deferred
//! closures, realized only when a fix or code action is requested.

pub mod check;
pub mod code_action;
pub mod config;
pub mod convert;
pub mod corrector;
pub mod diagnostics;
pub mod engine;
pub mod fixer;
pub mod node;
pub mod offense;
pub mod parse;
pub mod position;
pub mod server;
pub mod storage;

// Re-export main types
pub use check::{Check, CheckContext};
pub use code_action::{CodeAction, CodeActionEngine};
pub use config::Config;
pub use corrector::{apply_edits, Corrector, TextEdit};
pub use diagnostics::DiagnosticsStore;
pub use engine::{check_document, CheckFailure, CheckReport, Engine};
pub use fixer::{fix_all, fix_document, FixOutcome, FixSummary};
pub use node::{Node, Template};
pub use offense::{Category, CheckMeta, Offense, Severity};
pub use parse::{parse, Ast, NodeId, ParseError, RawKind, Span};
pub use storage::{FileSystemStorage, InMemoryStorage, Storage};

// Built-in checks
pub mod checks;
