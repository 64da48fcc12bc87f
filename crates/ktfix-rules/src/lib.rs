//! # ktfix-rules
//!
//! The `standard` rule set of ktfix.
//!
//! ## Available Rules
//!
//! | Id | Fixes | Description |
//! |----|-------|-------------|
//! | `standard:annotation` | yes | Multiple annotations, or annotations with arguments, go on separate lines |
//! | `standard:backing-property-naming` | no | `_name` properties are private and back a public property or getter |
//! | `standard:final-newline` | yes | Files end with exactly the configured final line break |
//! | `standard:max-line-length` | no | Lines stay within `max_line_length` |
//! | `standard:no-consecutive-blank-lines` | yes | At most one blank line in a row |
//! | `standard:no-empty-block-whitespace` | yes | Empty blocks are written `{}` |
//! | `standard:no-trailing-spaces` | yes | No whitespace at the end of a line |
//!
//! The suppression directive rule `standard:ktfix-suppression` ships with
//! `ktfix-core` and is registered by every engine.
//!
//! ## Usage
//!
//! ```ignore
//! use ktfix_core::Engine;
//! use ktfix_rules::standard_rule_set;
//!
//! let engine = Engine::builder(parser)
//!     .rule_set(standard_rule_set())
//!     .build();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod annotation;
pub mod backing_property_naming;
pub mod final_newline;
pub mod max_line_length;
pub mod no_consecutive_blank_lines;
pub mod no_empty_block_whitespace;
pub mod no_trailing_spaces;
mod presets;
#[cfg(test)]
mod test_support;
mod util;

pub use annotation::AnnotationRule;
pub use backing_property_naming::BackingPropertyNaming;
pub use final_newline::FinalNewline;
pub use max_line_length::MaxLineLength;
pub use no_consecutive_blank_lines::NoConsecutiveBlankLines;
pub use no_empty_block_whitespace::NoEmptyBlockWhitespace;
pub use no_trailing_spaces::NoTrailingSpaces;
pub use presets::{all_rules, recommended_rules, standard_rule_set, Preset};

/// Re-export core types for convenience.
pub use ktfix_core::{Rule, RuleProvider, RuleSet, Violation};
