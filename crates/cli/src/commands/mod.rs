//! Subcommand implementations.

pub mod check;
pub mod quote;
