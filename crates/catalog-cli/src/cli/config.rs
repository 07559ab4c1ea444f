//! Configuration handling for the CLI.
//!
//! This module converts CLI arguments into the library's configuration types:
//! it loads the schema, the rule overrides and the ignore patterns, and
//! builds the validation engine from them.

use crate::cli::{Args, FailureLevel};
use catalog_validator_core::engine::{EngineConfig, ValidationEngine};
use catalog_validator_core::parse::ParserConfig;
use catalog_validator_core::validate::rules::builtin_rules;
use catalog_validator_core::validate::{
    IgnoreFilter, IgnorePatternError, PersistedRuleConfig, RegistryError, RuleRegistry,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A file could not be read.
    #[error("failed to read {what} '{}': {source}", .path.display())]
    Read {
        /// What the file is for.
        what: &'static str,
        /// The file path.
        path: PathBuf,
        /// The IO error.
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid JSON of the expected shape.
    #[error("failed to parse {what} '{}': {source}", .path.display())]
    Parse {
        /// What the file is for.
        what: &'static str,
        /// The file path.
        path: PathBuf,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An ignore pattern is invalid.
    #[error("invalid ignore pattern: {0}")]
    Ignore(#[from] IgnorePatternError),

    /// Applying rule configuration failed.
    #[error("rule configuration error: {0}")]
    Registry(#[from] RegistryError),
}

/// Application exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Validation passed successfully.
    Success = 0,
    /// Application startup failed (wrong configuration or internal error).
    StartupFailure = 1,
    /// Application terminated by signal (SIGINT/SIGTERM).
    Terminated = 2,
    /// Validation failed (issues at or above the failure level).
    ValidationFailed = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Validated and processed configuration for running the validator.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Path to the catalog manifest.
    pub input_path: PathBuf,
    /// Schema document, if one was given.
    pub schema: Option<Value>,
    /// Persisted rule overrides, keyed by rule id.
    pub rule_overrides: HashMap<String, PersistedRuleConfig>,
    /// Rules disabled on the command line.
    pub disabled_rules: Vec<String>,
    /// Configuration handed to the engine.
    pub engine_config: EngineConfig,
    /// Failure level for determining exit code.
    pub failure_level: FailureLevel,
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to include an error summary.
    pub summary: bool,
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if !args.file.is_file() {
            return Err(ConfigError::Invalid(format!(
                "catalog file '{}' does not exist",
                args.file.display()
            )));
        }

        let known: Vec<&'static str> = builtin_rules().iter().map(|rule| rule.id()).collect();

        let schema = args
            .schema
            .as_deref()
            .map(|path| load_json::<Value>("schema", path))
            .transpose()?;

        let rule_overrides = match args.rules.as_deref() {
            Some(path) => load_json::<HashMap<String, PersistedRuleConfig>>("rule configuration", path)?,
            None => HashMap::new(),
        };

        let disabled_rules = args.disabled_rules();
        for id in rule_overrides.keys().chain(disabled_rules.iter()) {
            if !known.contains(&id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown rule '{}'; known rules: {}",
                    id,
                    known.join(", ")
                )));
            }
        }

        let ignore = match args.ignore.as_deref() {
            Some(path) => IgnoreFilter::from_json(&read_file("ignore patterns", path)?)?,
            None => IgnoreFilter::new(),
        };

        let mut engine_config = EngineConfig::new().with_ignore_filter(ignore);
        if let Some(seconds) = args.timeout {
            if seconds == 0 {
                return Err(ConfigError::Invalid("timeout must be at least 1 second".to_string()));
            }
            engine_config = engine_config.with_timeout(Duration::from_secs(seconds));
        }
        if let Some(depth) = args.max_depth {
            engine_config = engine_config.with_parser_config(ParserConfig::new().with_max_depth(depth));
        }

        Ok(Self {
            input_path: args.file.clone(),
            schema,
            rule_overrides,
            disabled_rules,
            engine_config,
            failure_level: args.failure_level,
            json_output: args.json,
            summary: args.summary,
        })
    }

    /// Builds the validation engine.
    ///
    /// Persisted overrides are applied first; rules disabled on the command
    /// line are switched off afterwards.
    pub async fn build_engine(&self) -> Result<ValidationEngine, ConfigError> {
        let registry =
            RuleRegistry::with_builtin_rules_and_provider(Arc::new(self.rule_overrides.clone())).await;

        for id in &self.disabled_rules {
            debug!("Disabling rule '{}'", id);
            registry.set_enabled(id, false).await?;
        }

        let mut engine = ValidationEngine::new(Arc::new(registry)).with_config(self.engine_config.clone());
        if let Some(schema) = &self.schema {
            engine = engine.with_schema(schema.clone());
        }
        Ok(engine)
    }

    /// Determines the exit code based on validation results.
    pub fn exit_code_for_results(&self, has_errors: bool, has_warnings: bool) -> ExitCode {
        if has_errors {
            return ExitCode::ValidationFailed;
        }

        match self.failure_level {
            FailureLevel::Warning if has_warnings => ExitCode::ValidationFailed,
            _ => ExitCode::Success,
        }
    }
}

fn read_file(what: &'static str, path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        what,
        path: path.to_path_buf(),
        source,
    })
}

fn load_json<T: DeserializeOwned>(what: &'static str, path: &Path) -> Result<T, ConfigError> {
    let content = read_file(what, path)?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        what,
        path: path.to_path_buf(),
        source,
    })
}
