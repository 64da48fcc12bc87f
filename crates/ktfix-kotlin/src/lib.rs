//! # ktfix-kotlin
//!
//! Kotlin front end of ktfix: parses `.kt` and `.kts` sources with the
//! Tree-sitter Kotlin grammar and converts the result into a
//! [`ktfix_core::Tree`].
//!
//! ```ignore
//! use ktfix_core::SourceParser;
//! use ktfix_kotlin::KotlinParser;
//!
//! let tree = KotlinParser::new().parse("class A {}\n")?;
//! assert_eq!(tree.text(), "class A {}\n");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod kinds;
mod parser;

pub use parser::KotlinParser;

/// File extensions handled by the parser.
pub const EXTENSIONS: &[&str] = &["kt", "kts"];
