//! Format command implementation.

use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;

use super::reporter::{render, FileResult};
use super::session::Session;
use crate::RunArgs;

/// Runs the format command.
///
/// Exits with failure when violations remain that no rule could fix.
pub fn run(args: &RunArgs, dry_run: bool, config: Option<&Path>) -> Result<ExitCode> {
    let session = Session::new(args, config)?;
    let files = Session::files(args)?;
    let results = session.format(&files, dry_run);

    print!("{}", render(&results, args.reporter)?);

    let changed = results.iter().filter(|r| r.changed).count();
    if dry_run && changed > 0 {
        tracing::info!("{changed} file(s) would be changed");
    }

    if results.iter().all(FileResult::is_clean) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
