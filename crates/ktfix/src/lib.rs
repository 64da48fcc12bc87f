//! # ktfix
//!
//! Kotlin linter and formatter.
//!
//! This is the facade crate: it wires the Kotlin parser and the standard
//! rule set into the rule engine of `ktfix-core` and re-exports the pieces.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ktfix::{Code, KtFix};
//!
//! let engine = KtFix::standard().build();
//!
//! let report = engine.lint(&Code::from_snippet("class A { }\n"))?;
//! for violation in &report.violations {
//!     println!("{violation}");
//! }
//!
//! let formatted = engine.format(&Code::from_snippet("class A { }\n"))?;
//! assert_eq!(formatted.output, "class A {}\n");
//! ```
//!
//! ## Configuration
//!
//! Properties are passed per run as [`UserOverrides`], usually resolved from
//! `.ktfix.toml` files with [`config::loader::ConfigLoader`]:
//!
//! ```rust,ignore
//! let loader = ConfigLoader::new().with_overrides(UserOverrides::new().with("max_line_length", "100"));
//! let overrides = loader.overrides_for(path)?;
//! let report = engine.lint_with(&Code::from_file(path)?, &overrides)?;
//! ```
//!
//! ## Suppression
//!
//! ```kotlin
//! @Suppress("ktfix:standard:max-line-length")
//! val url = "https://example.com/a/very/long/path"
//!
//! /* ktfix-disable standard:no-empty-block-whitespace */
//! class Placeholder { }
//! /* ktfix-enable standard:no-empty-block-whitespace */
//!
//! val x = 1  // ktfix-disable standard:no-trailing-spaces
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use ktfix_core::*;

pub use ktfix_kotlin::KotlinParser;

/// Built-in rules and presets.
pub mod rules {
    pub use ktfix_rules::*;
}

use ktfix_rules::Preset;

/// Entry points for engines with the Kotlin parser.
#[derive(Debug, Clone, Copy)]
pub struct KtFix;

impl KtFix {
    /// Returns an engine builder with the Kotlin parser and every standard
    /// rule.
    #[must_use]
    pub fn standard() -> EngineBuilder {
        Self::with_preset(Preset::All)
    }

    /// Returns an engine builder with the Kotlin parser and a preset of the
    /// standard rules.
    #[must_use]
    pub fn with_preset(preset: Preset) -> EngineBuilder {
        Engine::builder(KotlinParser::new()).rule_set(preset.rule_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_engine_registers_every_rule() {
        let engine = KtFix::standard().build();
        let ids: Vec<String> = engine
            .registry()
            .rule_ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(ids.contains(&"standard:annotation".to_string()));
        assert!(ids.contains(&"standard:ktfix-suppression".to_string()));
        assert_eq!(ids.len(), rules::all_rules().len() + 1);
    }

    #[test]
    fn presets_narrow_the_rules() {
        let engine = KtFix::with_preset(Preset::Recommended).build();
        let ids = engine.registry().rule_ids();
        assert!(!ids.contains(&rules::max_line_length::rule_id()));
    }
}
