//! Rule trait and configuration for catalog validation.
//!
//! A rule is a self-contained validator with a stable id and its own
//! configuration. Rules are registered with a
//! [`RuleRegistry`](crate::validate::RuleRegistry), which resolves their
//! configuration and runs them in registration order.

mod catalog;
mod deprecated_combinations;
mod duplicate_config_keys;
mod duplicate_input_mappings;
mod duplicate_object_keys;

pub use deprecated_combinations::DeprecatedCombinationsRule;
pub use duplicate_config_keys::DuplicateConfigKeysRule;
pub use duplicate_input_mappings::DuplicateInputMappingsRule;
pub use duplicate_object_keys::DuplicateObjectKeysRule;

use crate::document::CatalogDocument;
use crate::path::JsonPath;
use crate::position::Range;
use crate::validate::ValidationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The resolved configuration of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether the rule runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Rule specific parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            params: Map::new(),
        }
    }
}

impl RuleConfig {
    /// Creates an enabled configuration with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disabled configuration.
    pub fn disabled() -> Self {
        Self::default().with_enabled(false)
    }

    /// Sets whether the rule is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Reads a string parameter, falling back to `default` when it is not
    /// set. A parameter of the wrong type is an error.
    pub fn str_param<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, RuleError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(Value::String(value)) => Ok(value.as_str()),
            Some(other) => Err(RuleError::invalid_param(
                name,
                format!("expected a string, found {}", other),
            )),
        }
    }
}

/// A configuration override as stored by an external settings provider.
///
/// Absent fields leave the default untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedRuleConfig {
    /// Overrides `enabled` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Parameters merged over the defaults, key by key.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl PersistedRuleConfig {
    /// Merges this override over a default configuration.
    ///
    /// A persisted `enabled` wins when present; parameters are merged
    /// shallowly with persisted keys taking precedence.
    pub fn merge_over(&self, default: &RuleConfig) -> RuleConfig {
        let mut merged = default.clone();
        if let Some(enabled) = self.enabled {
            merged.enabled = enabled;
        }
        for (name, value) in &self.params {
            merged.params.insert(name.clone(), value.clone());
        }
        merged
    }
}

impl From<RuleConfig> for PersistedRuleConfig {
    fn from(config: RuleConfig) -> Self {
        Self {
            enabled: Some(config.enabled),
            params: config.params,
        }
    }
}

/// An error returned by a rule that could not complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    /// A parameter has an unusable value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam {
        /// The parameter name.
        name: String,
        /// Why the value is unusable.
        reason: String,
    },

    /// The rule failed for another reason.
    #[error("{0}")]
    Failed(String),
}

impl RuleError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Context provided to rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The parsed document.
    pub document: &'a CatalogDocument,
    /// The rule's resolved configuration.
    pub config: &'a RuleConfig,
}

impl<'a> RuleContext<'a> {
    /// Creates a new rule context.
    pub fn new(document: &'a CatalogDocument, config: &'a RuleConfig) -> Self {
        Self { document, config }
    }

    /// Returns the decoded document value.
    pub fn value(&self) -> &'a Value {
        self.document.value()
    }

    /// Returns the raw document text.
    pub fn text(&self) -> &'a str {
        self.document.text()
    }

    /// Returns the range of the node at `path`, or of its closest ancestor.
    pub fn range_at(&self, path: &JsonPath) -> Range {
        self.document.locate(path).range
    }
}

/// A validation rule.
///
/// Rules must check `ctx.config.enabled` themselves and return an empty
/// list without doing any work when disabled.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Returns the stable id of this rule.
    fn id(&self) -> &'static str;

    /// Returns a one-line description of what this rule checks.
    fn description(&self) -> &'static str;

    /// Returns the configuration used when nothing is persisted.
    fn default_config(&self) -> RuleConfig {
        RuleConfig::default()
    }

    /// Runs the rule against a document.
    async fn validate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError>;
}

/// Returns every built-in rule in its canonical order.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DuplicateObjectKeysRule::new()),
        Box::new(DuplicateConfigKeysRule::new()),
        Box::new(DuplicateInputMappingsRule::new()),
        Box::new(DeprecatedCombinationsRule::new()),
    ]
}
