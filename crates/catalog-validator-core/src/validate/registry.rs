//! Rule registry: registered rules, their resolved configuration, and the
//! orchestration of one pass over all enabled rules.
//!
//! Configuration lives behind a read-mostly lock. A pass works on a
//! snapshot taken when it starts, so changing a rule's configuration never
//! affects a pass that is already running.

use super::rules::{PersistedRuleConfig, Rule, RuleConfig, RuleContext, builtin_rules};
use crate::document::CatalogDocument;
use crate::validate::{ValidationError, ValidationResult};
use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, info, warn};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Supplies persisted rule configuration, e.g. from user settings.
#[async_trait]
pub trait RuleConfigProvider: Send + Sync {
    /// Returns the persisted override for a rule, if any.
    async fn rule_config(&self, rule_id: &str) -> Option<PersistedRuleConfig>;
}

#[async_trait]
impl RuleConfigProvider for HashMap<String, PersistedRuleConfig> {
    async fn rule_config(&self, rule_id: &str) -> Option<PersistedRuleConfig> {
        self.get(rule_id).cloned()
    }
}

/// Errors from registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A rule with this id is already registered.
    #[error("rule '{0}' is already registered")]
    DuplicateRule(String),

    /// No rule with this id is registered.
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
}

/// A registered rule and its configuration.
#[derive(Clone)]
struct Entry {
    rule: Arc<dyn Rule>,
    default_config: RuleConfig,
    config: RuleConfig,
}

/// Summary of a registered rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleInfo {
    /// The rule id.
    pub id: &'static str,
    /// What the rule checks.
    pub description: &'static str,
    /// Whether the rule currently runs.
    pub enabled: bool,
}

/// Holds the registered rules and runs them.
pub struct RuleRegistry {
    entries: RwLock<Vec<Entry>>,
    provider: Option<Arc<dyn RuleConfigProvider>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("entries", &"<rules>")
            .field("provider", &self.provider.as_ref().map(|_| "<dyn RuleConfigProvider>"))
            .finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            provider: None,
        }
    }

    /// Creates a registry with all built-in rules at their default
    /// configuration.
    pub fn with_builtin_rules() -> Self {
        let entries = builtin_rules()
            .into_iter()
            .map(|rule| {
                let default_config = rule.default_config();
                Entry {
                    rule: Arc::from(rule),
                    config: default_config.clone(),
                    default_config,
                }
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
            provider: None,
        }
    }

    /// Creates a registry with all built-in rules, configured from
    /// `provider`.
    pub async fn with_builtin_rules_and_provider(provider: Arc<dyn RuleConfigProvider>) -> Self {
        let registry = Self::with_builtin_rules().with_provider(provider);
        registry.refresh().await;
        registry
    }

    /// Sets the provider consulted by [`register`](Self::register) and
    /// [`refresh`](Self::refresh).
    ///
    /// Rules already in the registry keep their current configuration until
    /// the next `refresh`.
    pub fn with_provider(mut self, provider: Arc<dyn RuleConfigProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    async fn resolve(&self, rule_id: &str, default_config: &RuleConfig) -> RuleConfig {
        match &self.provider {
            Some(provider) => match provider.rule_config(rule_id).await {
                Some(persisted) => persisted.merge_over(default_config),
                None => default_config.clone(),
            },
            None => default_config.clone(),
        }
    }

    /// Registers a rule, merging any persisted override over
    /// `default_config`.
    pub async fn register<R: Rule + 'static>(
        &self,
        rule: R,
        default_config: RuleConfig,
    ) -> Result<(), RegistryError> {
        let config = self.resolve(rule.id(), &default_config).await;
        let mut entries = self.entries.write().await;
        if entries.iter().any(|entry| entry.rule.id() == rule.id()) {
            return Err(RegistryError::DuplicateRule(rule.id().to_string()));
        }
        debug!("Registered rule '{}' (enabled: {})", rule.id(), config.enabled);
        entries.push(Entry {
            rule: Arc::new(rule),
            default_config,
            config,
        });
        Ok(())
    }

    /// Re-reads every rule's persisted configuration from the provider.
    ///
    /// Without a provider every rule returns to its default.
    pub async fn refresh(&self) {
        let defaults: Vec<(&'static str, RuleConfig)> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .map(|entry| (entry.rule.id(), entry.default_config.clone()))
                .collect()
        };

        let mut resolved = HashMap::new();
        for (id, default_config) in defaults {
            resolved.insert(id, self.resolve(id, &default_config).await);
        }

        let mut entries = self.entries.write().await;
        for entry in entries.iter_mut() {
            if let Some(config) = resolved.remove(entry.rule.id()) {
                entry.config = config;
            }
        }
        debug!("Refreshed configuration of {} rules", entries.len());
    }

    /// Replaces a rule's configuration.
    pub async fn set_config(&self, rule_id: &str, config: RuleConfig) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.rule.id() == rule_id)
            .ok_or_else(|| RegistryError::UnknownRule(rule_id.to_string()))?;
        entry.config = config;
        Ok(())
    }

    /// Enables or disables a rule, keeping its parameters.
    pub async fn set_enabled(&self, rule_id: &str, enabled: bool) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.rule.id() == rule_id)
            .ok_or_else(|| RegistryError::UnknownRule(rule_id.to_string()))?;
        entry.config.enabled = enabled;
        Ok(())
    }

    /// Returns a rule's current configuration.
    pub async fn config(&self, rule_id: &str) -> Option<RuleConfig> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|entry| entry.rule.id() == rule_id)
            .map(|entry| entry.config.clone())
    }

    /// Restores every rule to its default configuration.
    pub async fn reset(&self) {
        let mut entries = self.entries.write().await;
        for entry in entries.iter_mut() {
            entry.config = entry.default_config.clone();
        }
    }

    /// Returns the ids of all registered rules in registration order.
    pub async fn rule_ids(&self) -> Vec<&'static str> {
        let entries = self.entries.read().await;
        entries.iter().map(|entry| entry.rule.id()).collect()
    }

    /// Describes all registered rules in registration order.
    pub async fn describe(&self) -> Vec<RuleInfo> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|entry| RuleInfo {
                id: entry.rule.id(),
                description: entry.rule.description(),
                enabled: entry.config.enabled,
            })
            .collect()
    }

    /// Runs every enabled rule in registration order and concatenates their
    /// errors.
    ///
    /// A rule that returns an error or panics contributes a single
    /// `RULE_EXECUTION_FAULT` error and the remaining rules still run.
    ///
    /// The task yields to the runtime after each rule, so a surrounding
    /// timeout can fire between rules. It cannot interrupt a rule that
    /// blocks without awaiting.
    pub async fn validate_all(&self, document: &CatalogDocument) -> ValidationResult {
        let snapshot: Vec<Entry> = self.entries.read().await.clone();
        info!("Running {} rules", snapshot.len());
        let mut result = ValidationResult::new();

        for entry in &snapshot {
            let id = entry.rule.id();
            if !entry.config.enabled {
                debug!("Skipping disabled rule: {}", id);
                continue;
            }

            debug!("Running rule: {}", id);
            let ctx = RuleContext::new(document, &entry.config);
            let outcome = AssertUnwindSafe(entry.rule.validate(&ctx)).catch_unwind().await;
            match outcome {
                Ok(Ok(errors)) => {
                    debug!("Rule '{}' found {} issues", id, errors.len());
                    result.merge(errors.into());
                }
                Ok(Err(e)) => {
                    warn!("Rule '{}' failed: {}", id, e);
                    result.add_error(ValidationError::rule_execution_fault(id, e));
                }
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    warn!("Rule '{}' panicked: {}", id, reason);
                    result.add_error(ValidationError::rule_execution_fault(
                        id,
                        format!("panicked: {}", reason),
                    ));
                }
            }
            tokio::task::yield_now().await;
        }

        info!("All rules complete: {} total issues", result.errors.len());
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
