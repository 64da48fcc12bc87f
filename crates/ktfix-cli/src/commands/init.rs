//! Init command implementation.

use anyhow::{bail, Result};
use ktfix::config::loader::PROPERTY_FILE_NAME;
use std::path::{Path, PathBuf};

/// Content of a new `.ktfix.toml`.
pub const DEFAULT_CONFIG: &str = r#"# ktfix configuration
#
# A property file applies to the sources in its directory and below. Nearer
# files win per key; `root = true` stops the search for more files upwards.
root = true

# Code style providing property defaults:
# ktfix_official, intellij_idea or android_studio
code_style = "ktfix_official"

# Maximum line length, "off" to disable
# max_line_length = 140

# Line separator of formatted files: lf, crlf or auto (keep the file's)
end_of_line = "auto"

insert_final_newline = true

# Rules are enabled or disabled with ktfix_<rule set>_<rule>
# ktfix_standard_max-line-length = "disabled"
# ktfix_experimental = "enabled"
"#;

/// Writes [`DEFAULT_CONFIG`] into `dir` and returns the created path.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or writing
/// fails.
pub fn run(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(PROPERTY_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktfix::config::loader::PropertyFile;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_a_valid_property_file() {
        let file = PropertyFile::parse(DEFAULT_CONFIG).unwrap();
        assert!(file.root);
        assert_eq!(file.values.get("code_style"), Some("ktfix_official"));
        assert_eq!(file.values.get("insert_final_newline"), Some("true"));
        assert_eq!(file.values.get("max_line_length"), None);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = run(tmp.path(), false).unwrap();
        assert_eq!(path, tmp.path().join(".ktfix.toml"));

        std::fs::write(&path, "root = false\n").unwrap();
        assert!(run(tmp.path(), false).is_err());

        run(tmp.path(), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
