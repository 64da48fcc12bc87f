//! Source input and the parser seam.

use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Produces a [`Tree`] from normalized source text.
///
/// The text handed to the parser never contains `\r` or a byte order mark.
pub trait SourceParser: Send + Sync {
    /// Parses source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not syntactically valid.
    fn parse(&self, source: &str) -> Result<Tree, ParseError>;
}

/// Syntax error reported by a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Description of the problem.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error.
    #[must_use]
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Source text to lint or format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    content: String,
    path: Option<PathBuf>,
}

impl Code {
    /// Wraps a snippet that has no file on disk.
    #[must_use]
    pub fn from_snippet(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            path: None,
        }
    }

    /// Reads a source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        Ok(Self {
            content,
            path: Some(path),
        })
    }

    /// Attaches a path used in diagnostics.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the original text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true for Kotlin script files (`.kts`).
    #[must_use]
    pub fn is_script(&self) -> bool {
        self.path
            .as_deref()
            .and_then(Path::extension)
            .is_some_and(|e| e == "kts")
    }
}

/// Line separator of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineSeparator {
    /// Returns the separator text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Detects the separator of the first line break, `Lf` if there is none.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Self::Crlf,
            _ => Self::Lf,
        }
    }
}

const BOM: char = '\u{feff}';

/// Text prepared for parsing plus what is needed to restore its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedSource {
    pub(crate) text: String,
    pub(crate) bom: bool,
    pub(crate) separator: LineSeparator,
}

impl NormalizedSource {
    /// Strips the byte order mark and converts every line break to `\n`.
    pub(crate) fn new(content: &str) -> Self {
        let (bom, content) = match content.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, content),
        };
        let separator = LineSeparator::detect(content);
        let text = if content.contains('\r') {
            content.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            content.to_string()
        };
        Self {
            text,
            bom,
            separator,
        }
    }

    /// Applies the byte order mark and `separator` to formatted text.
    pub(crate) fn restore(&self, formatted: &str, separator: LineSeparator) -> String {
        let mut out = String::with_capacity(formatted.len() + 4);
        if self.bom {
            out.push(BOM);
        }
        match separator {
            LineSeparator::Lf => out.push_str(formatted),
            LineSeparator::Crlf => out.push_str(&formatted.replace('\n', "\r\n")),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_line_breaks_and_bom() {
        let source = NormalizedSource::new("\u{feff}a\r\nb\rc\n");
        assert_eq!(source.text, "a\nb\nc\n");
        assert!(source.bom);
        assert_eq!(source.separator, LineSeparator::Crlf);
    }

    #[test]
    fn restore_round_trips() {
        let input = "\u{feff}val a = 1\r\nval b = 2\r\n";
        let source = NormalizedSource::new(input);
        assert_eq!(source.restore(&source.text, source.separator), input);
        assert_eq!(
            source.restore(&source.text, LineSeparator::Lf),
            "\u{feff}val a = 1\nval b = 2\n"
        );
    }

    #[test]
    fn lf_input_is_untouched() {
        let source = NormalizedSource::new("a\nb");
        assert_eq!(source.text, "a\nb");
        assert!(!source.bom);
        assert_eq!(source.separator, LineSeparator::Lf);
    }

    #[test]
    fn script_detection() {
        assert!(Code::from_snippet("").with_path("build.gradle.kts").is_script());
        assert!(!Code::from_snippet("").with_path("Main.kt").is_script());
        assert!(!Code::from_snippet("").is_script());
    }
}
