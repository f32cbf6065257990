//! querytree command line front end
//!
//! Loads a builder configuration, imports rule trees from JSON or YAML
//! files, then validates or normalizes them.

pub mod commands;
pub mod config;

pub use commands::{RunOptions, ValidationReport};
pub use config::{CliConfig, OutputFormat};
