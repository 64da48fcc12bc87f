//! Command implementations.

pub mod discover;
pub mod format;
pub mod init;
pub mod lint;
pub mod list_rules;
pub mod reporter;
pub mod session;
