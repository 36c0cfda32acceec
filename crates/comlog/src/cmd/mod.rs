//! Subcommands

pub mod capture;
pub mod config;
