//! Output formatting for run results.

use anyhow::Result;
use ktfix::{FormatReport, LintReport, RuleCrash, RuleId, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Output format for run results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReporterKind {
    /// One line per violation, corrected ones included.
    #[default]
    Plain,
    /// One line per violation left in the file.
    Compact,
    /// JSON array of per-file results.
    Json,
    /// Violation counts per rule.
    Summary,
}

/// Outcome of one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileResult {
    /// Path as discovered.
    pub path: PathBuf,
    /// Violations, corrected ones included when formatting.
    pub violations: Vec<Violation>,
    /// Rules that failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crashes: Vec<RuleCrash>,
    /// Why the file could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether formatting changed the file.
    pub changed: bool,
}

impl FileResult {
    /// Result of a lint run.
    #[must_use]
    pub fn linted(path: &Path, report: LintReport) -> Self {
        Self {
            path: path.to_path_buf(),
            violations: report.violations,
            crashes: report.crashes,
            error: None,
            changed: false,
        }
    }

    /// Result of a format run.
    #[must_use]
    pub fn formatted(path: &Path, report: FormatReport) -> Self {
        Self {
            path: path.to_path_buf(),
            violations: report.violations,
            crashes: report.crashes,
            error: None,
            changed: report.changed,
        }
    }

    /// A file that could not be processed.
    #[must_use]
    pub fn failed(path: &Path, error: &anyhow::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            error: Some(format!("{error:#}")),
            ..Self::default()
        }
    }

    /// Violations not fixed.
    pub fn remaining(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_corrected())
    }

    /// Returns true if nothing is left to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.crashes.is_empty() && self.remaining().next().is_none()
    }
}

/// Renders results in the given format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(results: &[FileResult], kind: ReporterKind) -> Result<String> {
    let out = match kind {
        ReporterKind::Plain => render_plain(results),
        ReporterKind::Compact => render_compact(results),
        ReporterKind::Json => {
            let mut json = serde_json::to_string_pretty(results)?;
            json.push('\n');
            json
        }
        ReporterKind::Summary => render_summary(results),
    };
    Ok(out)
}

fn render_problems(out: &mut String, result: &FileResult) {
    let path = result.path.display();
    if let Some(error) = &result.error {
        let _ = writeln!(out, "{path}: error: {error}");
    }
    for crash in &result.crashes {
        let _ = writeln!(out, "{path}:{crash}");
    }
}

fn render_plain(results: &[FileResult]) -> String {
    let mut out = String::new();
    for result in results {
        render_problems(&mut out, result);
        for violation in &result.violations {
            let _ = writeln!(out, "{}:{violation}", result.path.display());
        }
    }

    let remaining: usize = results.iter().map(|r| r.remaining().count()).sum();
    let corrected: usize = results
        .iter()
        .map(|r| r.violations.len() - r.remaining().count())
        .sum();
    let failed = results
        .iter()
        .filter(|r| r.error.is_some() || !r.crashes.is_empty())
        .count();

    let _ = write!(
        out,
        "Found {remaining} violation(s) in {} file(s)",
        results.len()
    );
    if corrected > 0 {
        let _ = write!(out, ", corrected {corrected}");
    }
    if failed > 0 {
        let _ = write!(out, ", {failed} file(s) failed");
    }
    out.push('\n');
    out
}

fn render_compact(results: &[FileResult]) -> String {
    let mut out = String::new();
    for result in results {
        render_problems(&mut out, result);
        for violation in result.remaining() {
            let _ = writeln!(
                out,
                "{}:{}:{}: [{}] {}",
                result.path.display(),
                violation.line,
                violation.column,
                violation.rule,
                violation.message,
            );
        }
    }
    out
}

fn render_summary(results: &[FileResult]) -> String {
    let mut counts: BTreeMap<&RuleId, (usize, usize)> = BTreeMap::new();
    for violation in results.iter().flat_map(|r| &r.violations) {
        let entry = counts.entry(&violation.rule).or_default();
        if violation.is_corrected() {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }

    let mut out = String::new();
    for result in results {
        render_problems(&mut out, result);
    }
    for (rule, (remaining, corrected)) in &counts {
        let _ = write!(out, "{rule}: {remaining}");
        if *corrected > 0 {
            let _ = write!(out, " (corrected {corrected})");
        }
        out.push('\n');
    }
    let total: usize = counts.values().map(|(remaining, _)| remaining).sum();
    let _ = writeln!(out, "Total: {total}");
    out
}
