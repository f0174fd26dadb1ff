//! Sleet CLI - Liquid template linter
//!
//! Batch mode checks (and optionally fixes) every template under a
//! project root; `--serve` runs the language server over stdio instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use colored::Colorize;
use sleet::checks;
use sleet::config::Config;
use sleet::engine::{CheckReport, Engine};
use sleet::fixer;
use sleet::offense::{Offense, Severity};
use sleet::position;
use sleet::server;
use sleet::storage::{FileSystemStorage, Storage};

#[derive(Parser)]
#[command(
    name = "sleet",
    version,
    about = "Liquid template linter",
    long_about = "A fast linter and language server for Liquid templates."
)]
struct Cli {
    /// Files to check, relative to the project root (default: every
    /// .liquid file under the root)
    files: Vec<PathBuf>,

    /// Project root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Configuration file path (default: <root>/.sleet.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Auto-fix offenses where possible (dry-run by default)
    #[arg(long)]
    fix: bool,

    /// Write fixes to files (requires --fix)
    #[arg(long, requires = "fix")]
    write: bool,

    /// Run as a language server over stdio
    #[arg(long)]
    serve: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List available checks and exit
    #[arg(long)]
    list_checks: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = match &cli.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Config::from_yaml(&text).unwrap_or_else(|e| {
                eprintln!("{}: Failed to parse config: {}", "error".red().bold(), e);
                std::process::exit(2);
            }),
            Err(e) => {
                eprintln!(
                    "{}: Failed to read {}: {}",
                    "error".red().bold(),
                    path.display(),
                    e
                );
                std::process::exit(2);
            }
        },
        None => Config::load(&cli.root).unwrap_or_else(|e| {
            eprintln!("{}: Failed to load config: {}", "error".red().bold(), e);
            std::process::exit(2);
        }),
    };

    if cli.list_checks {
        list_checks(&config);
        return;
    }

    if cli.serve {
        serve(config);
        return;
    }

    let storage = FileSystemStorage::new(&cli.root);
    let paths = if cli.files.is_empty() {
        storage.paths()
    } else {
        cli.files.clone()
    };

    if paths.is_empty() {
        eprintln!("{}: No templates found to check", "error".red().bold());
        std::process::exit(2);
    }

    if cli.verbose {
        eprintln!("Checking {} templates...", paths.len());
    }

    if cli.fix {
        run_fix(&storage, &paths, &config, cli.write, cli.verbose);
    }

    let engine = Engine::new(config);
    let results = engine.check_all(&storage, &paths);

    match cli.format {
        Format::Text => print_text(&storage, &results),
        Format::Json => print_json(&storage, &results),
    }
    print_failures(&results);

    std::process::exit(exit_code(&results));
}

/// Run the language server until the client disconnects.
fn serve(config: Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}: Failed to start runtime: {}", "error".red().bold(), e);
            std::process::exit(2);
        }
    };
    runtime.block_on(server::serve(config));
}

fn list_checks(config: &Config) {
    println!("{}", "Available checks:".bold());
    println!();
    for check in checks::build_checks(config) {
        let meta = check.meta();
        let severity = match meta.severity {
            Severity::Error => "error".red(),
            Severity::Suggestion => "suggestion".yellow(),
            Severity::Style => "style".blue(),
        };
        println!("  {} [{}] ({})", meta.id.cyan(), severity, meta.category);
    }
}

fn run_fix(
    storage: &FileSystemStorage,
    paths: &[PathBuf],
    config: &Config,
    write: bool,
    verbose: bool,
) {
    if write {
        let summary = fixer::fix_all(storage, paths, config);
        eprintln!(
            "Applied {} fixes to {} files",
            summary.fixes_applied, summary.files_modified
        );
        if summary.fixes_unfixed > 0 {
            eprintln!(
                "{}: {} fixes could not be applied",
                "warning".yellow(),
                summary.fixes_unfixed
            );
        }
        for error in &summary.errors {
            eprintln!("{}: {}", "error".red().bold(), error);
        }
        return;
    }

    // dry run: count what --write would do without touching disk
    let mut available = 0;
    for path in paths {
        let Some(source) = storage.read(path) else {
            continue;
        };
        let report = sleet::check_document(path, &source, config);
        available += fixer::fix_document(&source, &report.offenses).applied;
    }
    eprintln!("{}: {} fixes available", "dry-run".cyan(), available);
    if available > 0 {
        eprintln!("Use --write to apply fixes");
    }
    if verbose && available == 0 {
        eprintln!("No auto-fixes available");
    }
}

fn line_and_column(storage: &dyn Storage, path: &Path, offense: &Offense) -> (u32, u32) {
    let (line, column) = match storage.read(path) {
        Some(source) => position::position_at(&source, offense.span.start),
        None => (0, 0),
    };
    (line + 1, column + 1)
}

fn print_text(storage: &dyn Storage, results: &BTreeMap<PathBuf, CheckReport>) {
    let mut total = 0;
    for (path, report) in results {
        if report.offenses.is_empty() {
            continue;
        }
        total += report.offenses.len();
        println!("{}", path.display().to_string().bold());
        for offense in &report.offenses {
            let (line, column) = line_and_column(storage, path, offense);
            let severity = match offense.severity {
                Severity::Error => "error".red(),
                Severity::Suggestion => "suggestion".yellow(),
                Severity::Style => "style".blue(),
            };
            println!(
                "  {}:{} {} [{}] {}",
                line,
                column,
                severity,
                offense.check.cyan(),
                offense.message
            );
        }
        println!();
    }

    if total == 0 {
        println!("{}", "No offenses found".green());
    } else {
        println!("{} offense(s) found", total);
    }
}

fn print_json(storage: &dyn Storage, results: &BTreeMap<PathBuf, CheckReport>) {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .flat_map(|(path, report)| {
            report.offenses.iter().map(move |offense| {
                let (line, column) = line_and_column(storage, path, offense);
                serde_json::json!({
                    "path": path,
                    "line": line,
                    "column": column,
                    "check": offense.check,
                    "severity": offense.severity,
                    "category": offense.category,
                    "message": offense.message,
                })
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    );
}

fn print_failures(results: &BTreeMap<PathBuf, CheckReport>) {
    for (path, report) in results {
        for failure in &report.failures {
            eprintln!(
                "{}: check {} failed on {}: {}",
                "warning".yellow().bold(),
                failure.check.cyan(),
                path.display(),
                failure.message
            );
        }
    }
}

/// 0 clean, 1 offenses below error, 2 any error or crashed check.
fn exit_code(results: &BTreeMap<PathBuf, CheckReport>) -> i32 {
    let offenses: Vec<&Offense> = results.values().flat_map(|r| &r.offenses).collect();
    let failed = results.values().any(|r| !r.failures.is_empty());
    if failed || offenses.iter().any(|o| o.is_error()) {
        2
    } else if !offenses.is_empty() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleet::engine::CheckFailure;
    use sleet::offense::{Category, CheckMeta};
    use sleet::parse::Span;

    const META: CheckMeta = CheckMeta {
        id: "Demo",
        severity: Severity::Suggestion,
        category: Category::Liquid,
    };

    fn report(offenses: Vec<Offense>, failures: Vec<CheckFailure>) -> CheckReport {
        CheckReport { offenses, failures }
    }

    #[test]
    fn test_exit_code_clean() {
        let mut results = BTreeMap::new();
        results.insert(PathBuf::from("a.liquid"), report(vec![], vec![]));
        assert_eq!(exit_code(&results), 0);
    }

    #[test]
    fn test_exit_code_suggestions() {
        let mut results = BTreeMap::new();
        results.insert(
            PathBuf::from("a.liquid"),
            report(vec![Offense::new(&META, "m", Span::new(0, 1))], vec![]),
        );
        assert_eq!(exit_code(&results), 1);
    }

    #[test]
    fn test_exit_code_crashed_check_is_not_clean() {
        let mut results = BTreeMap::new();
        results.insert(
            PathBuf::from("a.liquid"),
            report(
                vec![],
                vec![CheckFailure {
                    check: "Demo".to_string(),
                    message: "boom".to_string(),
                }],
            ),
        );
        assert_eq!(exit_code(&results), 2);
    }
}
