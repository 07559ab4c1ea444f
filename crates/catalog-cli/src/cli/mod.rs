//! CLI module for the catalog validator.
//!
//! Command-line argument parsing using Clap, with environment variable
//! fallbacks for every option that CI jobs usually set.

pub mod config;
pub mod output;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Catalog manifest validator.
///
/// Checks a catalog manifest for duplicate keys, duplicate configuration
/// keys and input mappings, deprecated flag combinations and, when a schema
/// is given, JSON Schema violations.
#[derive(Parser, Debug)]
#[command(name = "catalog-validator")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the catalog manifest to validate.
    #[arg(env = "CATALOG_FILE")]
    pub file: PathBuf,

    /// JSON Schema to validate the manifest against.
    #[arg(long, env = "CATALOG_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// JSON file of rule configuration: {"rule-id": {"enabled": bool, "params": {...}}}.
    #[arg(long, env = "CATALOG_RULES")]
    pub rules: Option<PathBuf>,

    /// JSON file with an array of ignore patterns
    /// ({"messagePattern", "pathPattern", "description"}).
    #[arg(long, env = "CATALOG_IGNORE")]
    pub ignore: Option<PathBuf>,

    /// Comma-separated list of rule ids to disable.
    #[arg(long, env = "CATALOG_DISABLE_RULES", value_delimiter = ',')]
    pub disable: Option<Vec<String>>,

    /// Failure level for validation issues.
    /// 'warning' treats both errors and warnings as failures.
    /// 'error' only treats errors as failures.
    #[arg(long, env = "CHECK_FAILURE_LEVEL", default_value = "warning")]
    pub failure_level: FailureLevel,

    /// Abort validation after this many seconds.
    #[arg(long, env = "VALIDATION_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Maximum nesting depth accepted by the parser.
    #[arg(long, env = "CATALOG_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Group the reported issues and print suggested ignore patterns.
    #[arg(long)]
    pub summary: bool,

    /// Output validation results as JSON instead of human-readable format.
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Increase verbosity level (-v for info, -vv for debug, -vvv for trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Failure level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FailureLevel {
    /// Treat both warnings and errors as failures (exit code 3).
    #[default]
    Warning,
    /// Only treat errors as failures.
    Error,
}

impl Args {
    /// Returns the rule ids to disable.
    pub fn disabled_rules(&self) -> Vec<String> {
        self.disable
            .iter()
            .flatten()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    }
}
