//! Subcommands of the cycle CLI.

pub mod config;
pub mod run;
