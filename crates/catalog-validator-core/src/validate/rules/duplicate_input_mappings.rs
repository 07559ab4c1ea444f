//! Duplicate input mapping detection.
//!
//! Every dependency owns an `input_mapping` array. Duplicates are looked for
//! within one dependency's mapping only, never across sibling dependencies.

use super::catalog::{dependencies, duplicate_items, flavors};
use super::{Rule, RuleConfig, RuleContext, RuleError};
use crate::validate::ValidationError;
use async_trait::async_trait;
use log::trace;
use serde_json::Value;

/// Field compared when the `field` parameter is not set.
pub const DEFAULT_FIELD: &str = "version_input";

/// A rule that reports input mappings of one dependency that target the
/// same input.
#[derive(Debug, Clone, Default)]
pub struct DuplicateInputMappingsRule;

impl DuplicateInputMappingsRule {
    /// Creates a new duplicate input mappings rule.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for DuplicateInputMappingsRule {
    fn id(&self) -> &'static str {
        "duplicate-input-mappings"
    }

    fn description(&self) -> &'static str {
        "Reports input mappings within one dependency that map the same input"
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
            for (dependency_path, dependency) in dependencies(&flavor_path, flavor) {
                let Some(items) = dependency.get("input_mapping").and_then(Value::as_array) else {
                    continue;
                };
                let mapping_path = dependency_path.key("input_mapping");
                for duplicate in duplicate_items(items, field) {
                    let path = mapping_path.index(duplicate.index).key(field);
                    trace!("Duplicate input mapping at {}", path);
                    let range = ctx.range_at(&path);
                    errors.push(ValidationError::duplicate_input_mapping(
                        path,
                        field,
                        duplicate.value,
                        duplicate.index,
                        &duplicate.others,
                        range,
                    ));
                }
            }
        }
        Ok(errors)
    }
}
