//! Source file discovery.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// Collects the Kotlin files under `roots`.
///
/// Directories are walked honoring `.gitignore`; files named explicitly are
/// taken as they are. Paths matching an `exclude` pattern, either relative to
/// their root or as given, are dropped.
///
/// # Errors
///
/// Returns an error for an invalid pattern or a path that cannot be walked.
pub fn discover_files(roots: &[PathBuf], exclude: &[String]) -> Result<Vec<PathBuf>> {
    let patterns = exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern '{p}'")))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            if !is_excluded(root, root, &patterns) {
                files.push(clean(root));
            }
            continue;
        }

        let mut builder = ignore::WalkBuilder::new(root);
        builder.hidden(false).git_ignore(true);

        for entry in builder.build() {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            let path = entry.path();

            if !path.is_file() || !is_kotlin(path) {
                continue;
            }
            if !is_excluded(path, root, &patterns) {
                files.push(clean(path));
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "discovered Kotlin files");
    Ok(files)
}

fn is_kotlin(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ktfix_kotlin::EXTENSIONS.contains(&e))
}

fn is_excluded(path: &Path, root: &Path, patterns: &[Pattern]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    patterns
        .iter()
        .any(|p| p.matches_path(relative) || p.matches_path(&clean(path)))
}

/// Strips a leading `./`.
fn clean(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}
