//! Configuration resolution with global fallback.
//!
//! Property values for a source file are merged from, lowest priority first:
//!
//! 1. `~/.ktfix/config.toml` (global fallback)
//! 2. `.ktfix.toml` files from the file's directory upwards
//! 3. `--config` file
//! 4. `--property` and `--code-style` flags

use anyhow::{Context, Result};
use ktfix::config::loader::{ConfigLoader, PropertyFile};
use ktfix::UserOverrides;
use std::path::{Path, PathBuf};

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Builds the loader for a run.
///
/// # Errors
///
/// Returns an error if the global or explicit file cannot be read or parsed.
pub fn loader(explicit: Option<&Path>, overrides: UserOverrides) -> Result<ConfigLoader> {
    loader_inner(explicit, overrides, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn loader_inner(
    explicit: Option<&Path>,
    overrides: UserOverrides,
    global_dir: Option<PathBuf>,
) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().with_overrides(overrides);

    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!("Found global config: {}", candidate.display());
            let file = PropertyFile::from_file(&candidate)
                .with_context(|| format!("failed to load global config {}", candidate.display()))?;
            loader = loader.with_global(file);
        }
    }

    if let Some(path) = explicit {
        let file = PropertyFile::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        loader = loader.with_explicit(file);
    }

    Ok(loader)
}

/// Returns the global config directory path.
///
/// Resolution: `$KTFIX_CONFIG_DIR` > `~/.ktfix/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("KTFIX_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".ktfix"))
}
