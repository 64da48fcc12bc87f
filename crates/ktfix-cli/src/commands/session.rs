//! Shared setup of `lint` and `format` runs.

use anyhow::{Context, Result};
use ktfix::config::loader::ConfigLoader;
use ktfix::{Code, Engine, FormatReport, KtFix, LintReport, UserOverrides};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::discover::discover_files;
use super::reporter::FileResult;
use crate::{config_resolver, RunArgs};

/// An engine plus the configuration of one command invocation.
pub struct Session {
    engine: Engine,
    loader: ConfigLoader,
}

impl Session {
    /// Builds the engine and config loader from command line arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed `--property` values or unreadable
    /// config files.
    pub fn new(args: &RunArgs, config: Option<&Path>) -> Result<Self> {
        let overrides = user_overrides(args)?;
        let loader = config_resolver::loader(config, overrides)?;
        let engine = KtFix::with_preset(args.preset.into())
            .max_passes(args.max_passes)
            .build();
        tracing::debug!(rules = engine.registry().len(), "engine ready");
        Ok(Self { engine, loader })
    }

    /// Discovers the files named by the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    pub fn files(args: &RunArgs) -> Result<Vec<PathBuf>> {
        discover_files(&args.paths, &args.exclude)
    }

    /// Lints every file in parallel.
    #[must_use]
    pub fn lint(&self, files: &[PathBuf]) -> Vec<FileResult> {
        files
            .par_iter()
            .map(|path| match self.lint_file(path) {
                Ok(report) => FileResult::linted(path, report),
                Err(e) => FileResult::failed(path, &e),
            })
            .collect()
    }

    /// Formats every file in parallel, writing changes back unless
    /// `dry_run` is set.
    #[must_use]
    pub fn format(&self, files: &[PathBuf], dry_run: bool) -> Vec<FileResult> {
        files
            .par_iter()
            .map(|path| match self.format_file(path, dry_run) {
                Ok(report) => FileResult::formatted(path, report),
                Err(e) => FileResult::failed(path, &e),
            })
            .collect()
    }

    fn lint_file(&self, path: &Path) -> Result<LintReport> {
        let (code, overrides) = self.load(path)?;
        Ok(self.engine.lint_with(&code, &overrides)?)
    }

    fn format_file(&self, path: &Path, dry_run: bool) -> Result<FormatReport> {
        let (code, overrides) = self.load(path)?;
        let report = self.engine.format_with(&code, &overrides)?;
        if report.changed && !dry_run {
            std::fs::write(path, &report.output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Formatted {}", path.display());
        }
        Ok(report)
    }

    fn load(&self, path: &Path) -> Result<(Code, UserOverrides)> {
        let overrides = self.loader.overrides_for(path)?;
        let code = Code::from_file(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok((code, overrides))
    }
}

fn user_overrides(args: &RunArgs) -> Result<UserOverrides> {
    let mut overrides = UserOverrides::new();
    for pair in &args.properties {
        overrides.set_pair(pair)?;
    }
    if let Some(style) = &args.code_style {
        overrides.set("code_style", style.as_str());
    }
    Ok(overrides)
}
