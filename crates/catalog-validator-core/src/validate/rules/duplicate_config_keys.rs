//! Duplicate configuration key detection.
//!
//! Each flavor's `configuration` array is its own scope: the same key in
//! two different flavors is fine.

use super::catalog::{duplicate_items, flavors};
use super::{Rule, RuleConfig, RuleContext, RuleError};
use crate::validate::ValidationError;
use async_trait::async_trait;
use log::trace;
use serde_json::Value;

/// Field compared when the `field` parameter is not set.
pub const DEFAULT_FIELD: &str = "key";

/// A rule that reports configuration entries of one flavor that share a key.
#[derive(Debug, Clone, Default)]
pub struct DuplicateConfigKeysRule;

impl DuplicateConfigKeysRule {
    /// Creates a new duplicate configuration keys rule.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for DuplicateConfigKeysRule {
    fn id(&self) -> &'static str {
        "duplicate-config-keys"
    }

    fn description(&self) -> &'static str {
        "Reports configuration entries within one flavor that share the same key"
    }

    fn default_config(&self) -> RuleConfig {
        RuleConfig::new().with_param("field", DEFAULT_FIELD)
    }

    async fn validate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError> {
        if !ctx.config.enabled {
            return Ok(Vec::new());
        }
        let field = ctx.config.str_param("field", DEFAULT_FIELD)?;
        let mut errors = Vec::new();

        for (flavor_path, flavor) in flavors(ctx.value()) {
            let Some(items) = flavor.get("configuration").and_then(Value::as_array) else {
                continue;
            };
            let configuration_path = flavor_path.key("configuration");
            for duplicate in duplicate_items(items, field) {
                let path = configuration_path.index(duplicate.index).key(field);
                trace!("Duplicate configuration key at {}", path);
                let range = ctx.range_at(&path);
                errors.push(ValidationError::duplicate_config_key(
                    path,
                    duplicate.value,
                    duplicate.index,
                    &duplicate.others,
                    range,
                ));
            }
        }
        Ok(errors)
    }
}
