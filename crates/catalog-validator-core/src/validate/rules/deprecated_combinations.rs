//! Deprecated flag combination check.

use super::catalog::flavors;
use super::{Rule, RuleContext, RuleError};
use crate::validate::ValidationError;
use async_trait::async_trait;
use serde_json::Value;

/// A rule that warns about flavors combining `install_type: "extension"`
/// with `dependency_version_2: true`.
#[derive(Debug, Clone, Default)]
pub struct DeprecatedCombinationsRule;

impl DeprecatedCombinationsRule {
    /// Creates a new deprecated combinations rule.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for DeprecatedCombinationsRule {
    fn id(&self) -> &'static str {
        "deprecated-combinations"
    }

    fn description(&self) -> &'static str {
        "Warns about deprecated flag combinations in flavors"
    }

    async fn validate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError> {
        if !ctx.config.enabled {
            return Ok(Vec::new());
        }

        let errors = flavors(ctx.value())
            .into_iter()
            .filter(|(_, flavor)| {
                flavor.get("install_type").and_then(Value::as_str) == Some("extension")
                    && flavor.get("dependency_version_2") == Some(&Value::Bool(true))
            })
            .map(|(flavor_path, _)| {
                let path = flavor_path.key("dependency_version_2");
                let range = ctx.range_at(&path);
                ValidationError::deprecated_dependency_version_2(path, range)
            })
            .collect();
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CatalogDocument;
    use crate::position::Position;
    use crate::validate::Severity;
    use crate::validate::rules::RuleConfig;

    async fn run_rule(input: &str) -> Vec<ValidationError> {
        let document = CatalogDocument::parse(input).unwrap();
        let config = RuleConfig::new();
        let ctx = RuleContext::new(&document, &config);
        DeprecatedCombinationsRule::new().validate(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn extension_with_dependency_version_2() {
        let input = "{\"products\":[{\"flavors\":[\n{\"install_type\":\"extension\",\"dependency_version_2\":true}]}]}";
        let errors = run_rule(input).await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Some(Severity::Warning));
        assert_eq!(
            errors[0].path.to_string(),
            "$.products[0].flavors[0].dependency_version_2"
        );
        let range = errors[0].range.unwrap();
        assert_eq!(range.start, Position::new(1, 51));
        assert_eq!(range.end, Position::new(1, 55));
    }

    #[tokio::test]
    async fn other_combinations_are_fine() {
        for flavor in [
            r#"{"install_type":"extension","dependency_version_2":false}"#,
            r#"{"install_type":"fullstack","dependency_version_2":true}"#,
            r#"{"install_type":"extension","dependency_version_2":"true"}"#,
            r#"{"install_type":"extension"}"#,
            r#"{"dependency_version_2":true}"#,
        ] {
            let input = format!(r#"{{"products":[{{"flavors":[{}]}}]}}"#, flavor);
            assert!(run_rule(&input).await.is_empty(), "{}", flavor);
        }
    }

    #[tokio::test]
    async fn one_warning_per_flavor() {
        let flavor = r#"{"install_type":"extension","dependency_version_2":true}"#;
        let input = format!(
            r#"{{"products":[{{"flavors":[{0},{0}]}},{{"flavors":[{0}]}}]}}"#,
            flavor
        );
        let errors = run_rule(&input).await;
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "$.products[0].flavors[0].dependency_version_2",
                "$.products[0].flavors[1].dependency_version_2",
                "$.products[1].flavors[0].dependency_version_2",
            ]
        );
    }
}
