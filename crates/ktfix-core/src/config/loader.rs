//! Cascading `.ktfix.toml` property files.
//!
//! Files are flat TOML tables of property names to values:
//!
//! ```toml
//! root = true
//! code_style = "android_studio"
//! max_line_length = 120
//! ktfix_standard_max-line-length = "disabled"
//! ```
//!
//! For a source file, every `.ktfix.toml` from its directory upwards applies,
//! nearer files winning per key. A file with `root = true` ends the search.
//! The merged result sits between a global fallback file (lowest priority)
//! and an explicit file plus caller overrides (highest priority).

use super::{ConfigError, UserOverrides};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// File name of per-directory property files.
pub const PROPERTY_FILE_NAME: &str = ".ktfix.toml";

/// Key that stops the upward search.
pub const ROOT_KEY: &str = "root";

/// One parsed property file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFile {
    /// Whether the file has `root = true`.
    pub root: bool,
    /// Property values.
    pub values: UserOverrides,
}

impl PropertyFile {
    /// Loads a property file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { message } => ConfigError::Parse {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Parses a property file.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML and for nested tables or arrays.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let mut file = Self::default();
        for (key, value) in table {
            let raw = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                other => {
                    return Err(ConfigError::Parse {
                        message: format!("'{key}' must be a string, number or boolean, found {}", other.type_str()),
                    })
                }
            };
            if key.eq_ignore_ascii_case(ROOT_KEY) {
                file.root = raw.eq_ignore_ascii_case("true");
            } else {
                file.values.set(&key, raw);
            }
        }
        Ok(file)
    }
}

/// Resolves the user overrides that apply to a source file.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    global: Option<PropertyFile>,
    explicit: Option<PropertyFile>,
    overrides: UserOverrides,
    cache: Mutex<HashMap<PathBuf, Option<Arc<PropertyFile>>>>,
}

impl ConfigLoader {
    /// Creates a loader without global or explicit files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lowest-priority fallback file.
    #[must_use]
    pub fn with_global(mut self, file: PropertyFile) -> Self {
        self.global = Some(file);
        self
    }

    /// Sets a file that overrides every directory file.
    #[must_use]
    pub fn with_explicit(mut self, file: PropertyFile) -> Self {
        self.explicit = Some(file);
        self
    }

    /// Sets caller-supplied values with the highest priority.
    #[must_use]
    pub fn with_overrides(mut self, overrides: UserOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Returns the merged overrides for a source file.
    ///
    /// # Errors
    ///
    /// Returns an error if a property file on the way cannot be read or
    /// parsed, or the current directory is unavailable for relative paths.
    pub fn overrides_for(&self, source: &Path) -> Result<UserOverrides, ConfigError> {
        let source = if source.is_absolute() {
            source.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;
            cwd.join(source)
        };

        let mut cascade = Vec::new();
        for dir in source.ancestors().skip(1) {
            if let Some(file) = self.directory_file(dir)? {
                let root = file.root;
                cascade.push(file);
                if root {
                    break;
                }
            }
        }

        let mut merged = self
            .global
            .as_ref()
            .map(|f| f.values.clone())
            .unwrap_or_default();
        for file in cascade.iter().rev() {
            merged.merge(&file.values);
        }
        if let Some(explicit) = &self.explicit {
            merged.merge(&explicit.values);
        }
        merged.merge(&self.overrides);
        Ok(merged)
    }

    fn directory_file(&self, dir: &Path) -> Result<Option<Arc<PropertyFile>>, ConfigError> {
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
        {
            return Ok(cached.clone());
        }

        let candidate = dir.join(PROPERTY_FILE_NAME);
        let file = if candidate.is_file() {
            debug!("Found property file: {}", candidate.display());
            Some(Arc::new(PropertyFile::from_file(&candidate)?))
        } else {
            None
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dir.to_path_buf(), file.clone());
        Ok(file)
    }
}
