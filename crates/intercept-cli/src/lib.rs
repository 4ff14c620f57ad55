//! The `intercept` command-line tool
//!
//! Loads a JSON dataset into the in-memory engine, chains the rewrite rules
//! from the config file, and runs or explains a query composed from flags.

pub mod cli;
pub mod commands;
pub mod logging;
