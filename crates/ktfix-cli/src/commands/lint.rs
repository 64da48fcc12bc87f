//! Lint command implementation.

use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;

use super::reporter::{render, FileResult};
use super::session::Session;
use crate::RunArgs;

/// Runs the lint command.
pub fn run(args: &RunArgs, config: Option<&Path>) -> Result<ExitCode> {
    let session = Session::new(args, config)?;
    let files = Session::files(args)?;
    let results = session.lint(&files);

    print!("{}", render(&results, args.reporter)?);

    if results.iter().all(FileResult::is_clean) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
