//! # ktfix-core
//!
//! Rule execution engine for Kotlin linting and formatting.
//!
//! This crate parses nothing itself: a [`SourceParser`] turns source text
//! into a mutable [`Tree`], and the [`Engine`] runs rules over it. It
//! includes:
//!
//! - [`Rule`] trait and [`RuleDescriptor`] for rule plug-ins
//! - [`Engine`] for lint runs and fixed-point format runs
//! - [`config`] for cascading configuration with code style presets
//! - [`suppression`] for `@Suppress` annotations and marker comments
//! - [`Violation`] and the [`LintReport`] / [`FormatReport`] results
//!
//! ## Example
//!
//! ```ignore
//! use ktfix_core::{Code, Engine};
//!
//! let engine = Engine::builder(MyParser)
//!     .rule_set(my_rules())
//!     .property("max_line_length", "120")
//!     .build();
//!
//! let report = engine.format(&Code::from_snippet("val x = 1 \n"))?;
//! print!("{}", report.output);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod directive_rule;
mod engine;
mod error;
mod parser;
mod registry;
mod rule;
mod types;

pub mod config;
pub mod filter;
pub mod sorter;
pub mod suppression;
pub mod tree;

pub use config::{CodeStyle, ConfigError, PropertyDef, PropertyValue, UserOverrides};
pub use context::{Mode, RuleConfig, RuleContext};
pub use directive_rule::directive_rule_id;
pub use engine::{
    Engine, EngineBuilder, EngineOptions, EngineState, DEFAULT_MAX_PASSES, MAX_REVISITS,
};
pub use error::EngineError;
pub use parser::{Code, LineSeparator, ParseError, SourceParser};
pub use registry::RuleRegistry;
pub use rule::{
    Enablement, Rule, RuleBox, RuleDescriptor, RuleError, RuleId, RuleIdError, RuleProvider,
    RuleSet, RuleSetId, RunAfter, RunAfterMode, STANDARD_RULE_SET,
};
pub use tree::{NodeId, NodeKind, Position, Tree, TreeBuilder, TreeError};
pub use types::{FormatReport, LintReport, RuleCrash, Violation, ViolationStatus};
