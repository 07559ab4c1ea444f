//! The validation engine: one pass from text to a final error list.
//!
//! A pass parses the text, runs every enabled rule, runs the schema (when
//! one is available) and aggregates the combined output. Text that does not
//! parse yields a single syntax error and nothing else runs.

use crate::document::CatalogDocument;
use crate::parse::ParserConfig;
use crate::position::{LineIndex, Range};
use crate::validate::schema::{SchemaSource, SchemaValidator, StaticSchemaSource};
use crate::validate::{
    IgnoreFilter, RuleRegistry, ValidationError, ValidationResult, filter_and_deduplicate,
};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The pass did not finish within the configured timeout.
    #[error("validation timed out after {0:?}")]
    Timeout(Duration),
}

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Patterns for errors to drop from the final list.
    pub ignore: IgnoreFilter,
    /// Overall limit for one pass.
    pub timeout: Option<Duration>,
    /// Parser limits.
    pub parser: ParserConfig,
}

impl EngineConfig {
    /// Creates a configuration with no ignore patterns and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ignore patterns.
    pub fn with_ignore_filter(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = ignore;
        self
    }

    /// Sets the overall timeout for one pass.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the parser configuration.
    pub fn with_parser_config(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// Runs validation passes over catalog manifest text.
///
/// # Example
///
/// ```rust
/// use catalog_validator_core::engine::ValidationEngine;
///
/// # tokio_test::block_on(async {
/// let engine = ValidationEngine::with_builtin_rules();
/// let result = engine
///     .validate(r#"{"products":[{"flavors":[{"configuration":[{"key":"a"},{"key":"a"}]}]}]}"#)
///     .await;
/// assert!(result.has_errors());
/// # });
/// ```
pub struct ValidationEngine {
    registry: Arc<RuleRegistry>,
    schema: Arc<dyn SchemaSource>,
    config: EngineConfig,
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ValidationEngine {
    /// Creates an engine over `registry` with no schema.
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            schema: Arc::new(StaticSchemaSource::none()),
            config: EngineConfig::default(),
        }
    }

    /// Creates an engine with a fresh registry of the built-in rules.
    pub fn with_builtin_rules() -> Self {
        Self::new(Arc::new(RuleRegistry::with_builtin_rules()))
    }

    /// Sets the schema source.
    pub fn with_schema_source(mut self, schema: Arc<dyn SchemaSource>) -> Self {
        self.schema = schema;
        self
    }

    /// Uses a fixed schema document.
    pub fn with_schema(self, schema: Value) -> Self {
        self.with_schema_source(Arc::new(StaticSchemaSource::new(schema)))
    }

    /// Sets the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the rule registry.
    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one pass over `text`.
    pub async fn validate(&self, text: &str) -> ValidationResult {
        match CatalogDocument::parse_with_config(text, &self.config.parser) {
            Ok(document) => self.validate_document(&document).await,
            Err(e) => {
                let index = LineIndex::new(text);
                let position = index.position_at(e.offset());
                warn!("Document does not parse at {}: {}", position, e.description());
                ValidationResult::with_errors(vec![ValidationError::syntax_error(
                    e.description(),
                    Range::point(position),
                )])
            }
        }
    }

    /// Runs one pass under the configured timeout.
    ///
    /// Without a configured timeout this is the same as
    /// [`validate`](Self::validate). The deadline is checked between rules
    /// and before the schema pass; a single rule that blocks without
    /// awaiting runs to completion before the timeout can fire.
    pub async fn validate_with_timeout(&self, text: &str) -> Result<ValidationResult, EngineError> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.validate(text))
                .await
                .map_err(|_| {
                    warn!("Validation pass exceeded {:?}", limit);
                    EngineError::Timeout(limit)
                }),
            None => Ok(self.validate(text).await),
        }
    }

    /// Runs rules, schema and aggregation over an already parsed document.
    pub async fn validate_document(&self, document: &CatalogDocument) -> ValidationResult {
        let mut errors = self.registry.validate_all(document).await.errors;
        tokio::task::yield_now().await;
        errors.extend(self.validate_schema(document).await);

        let errors = filter_and_deduplicate(errors, &self.config.ignore);
        info!("Validation complete: {} issues", errors.len());
        ValidationResult::with_errors(errors)
    }

    async fn validate_schema(&self, document: &CatalogDocument) -> Vec<ValidationError> {
        let schema = match self.schema.schema().await {
            Ok(Some(schema)) => schema,
            Ok(None) => {
                debug!("No schema configured");
                return vec![ValidationError::schema_unavailable("no schema configured")];
            }
            Err(e) => {
                warn!("{}", e);
                return vec![ValidationError::schema_unavailable(e)];
            }
        };

        match SchemaValidator::compile(&schema) {
            Ok(validator) => validator.validate(document),
            Err(e) => {
                warn!("{}", e);
                vec![ValidationError::schema_unavailable(e)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::validate::rules::{Rule, RuleConfig, RuleContext, RuleError};
    use crate::validate::schema::SchemaError;
    use crate::validate::{ErrorCode, IgnorePattern, Severity};
    use async_trait::async_trait;
    use serde_json::json;

    const SCENARIO_A: &str =
        r#"{"products":[{"flavors":[{"configuration":[{"key":"a"},{"key":"a"}]}]}]}"#;

    fn with_code<'a>(result: &'a ValidationResult, code: &ErrorCode) -> Vec<&'a ValidationError> {
        result.errors.iter().filter(|e| &e.code == code).collect()
    }

    fn install_type_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "products": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["install_type"],
                        "properties": {
                            "flavors": {
                                "type": "array",
                                "items": {"type": "object", "required": ["install_type"]}
                            }
                        }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn scenario_a_duplicate_configuration_keys() {
        let result = ValidationEngine::with_builtin_rules().validate(SCENARIO_A).await;
        let errors = with_code(&result, &ErrorCode::DUPLICATE_CONFIG_KEY);

        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("at index 0"));
        assert!(errors[0].message.contains("index 1"));
        assert!(errors[1].message.contains("at index 1"));
        assert!(errors[1].message.contains("index 0"));
        assert!(errors.iter().all(|e| e.severity == Some(Severity::Error)));
    }

    #[tokio::test]
    async fn scenario_b_duplicate_object_keys() {
        let result = ValidationEngine::with_builtin_rules().validate(r#"{"x":1,"x":2}"#).await;
        let errors = with_code(&result, &ErrorCode::DUPLICATE_OBJECT_KEY);

        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("1st occurrence"));
        assert!(errors[1].message.contains("2nd occurrence"));
    }

    #[tokio::test]
    async fn ranges_under_a_repeated_key_point_at_the_decoded_subtree() {
        let text = concat!(
            r#"{"products":[{"flavors":[{"configuration":[{"key":"a"},{"key":"a"}]}]}],"#,
            r#""products":[{"flavors":[{"configuration":[{"key":"b"},{"key":"b"}]}]}]}"#,
        );
        let second_products = text.rfind(r#""products""#).unwrap();
        let index = LineIndex::new(text);

        let result = ValidationEngine::with_builtin_rules()
            .with_schema(install_type_schema())
            .validate(text)
            .await;

        let config_errors = with_code(&result, &ErrorCode::DUPLICATE_CONFIG_KEY);
        assert_eq!(config_errors.len(), 2);
        let schema_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.code == ErrorCode::schema("required"))
            .collect();
        assert!(!schema_errors.is_empty());

        for error in config_errors.iter().chain(schema_errors.iter()) {
            let start = index.offset_at(error.range.unwrap().start);
            assert!(
                start > second_products,
                "{} at offset {} is inside the shadowed subtree",
                error.message,
                start
            );
        }
        assert!(config_errors.iter().all(|e| e.message.contains("\"b\"")));
    }

    #[tokio::test]
    async fn syntax_error_short_circuits() {
        let result = ValidationEngine::with_builtin_rules()
            .with_schema(install_type_schema())
            .validate("{\"x\":1,\n\"x\":2,}")
            .await;

        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.code, ErrorCode::SYNTAX_ERROR);
        assert_eq!(error.severity, Some(Severity::Error));
        let range = error.range.unwrap();
        assert!(range.is_empty());
        assert_eq!(range.start.line, 1);
    }

    #[tokio::test]
    async fn empty_text_is_a_syntax_error() {
        let result = ValidationEngine::with_builtin_rules().validate("").await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::SYNTAX_ERROR);
        assert_eq!(result.errors[0].range, Some(Range::point(Position::new(0, 0))));
    }

    #[tokio::test]
    async fn missing_schema_adds_one_advisory() {
        let result = ValidationEngine::with_builtin_rules().validate(SCENARIO_A).await;

        let advisories = with_code(&result, &ErrorCode::SCHEMA_UNAVAILABLE);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].severity, Some(Severity::Information));
        assert!(advisories[0].range.is_none());
        assert_eq!(with_code(&result, &ErrorCode::DUPLICATE_CONFIG_KEY).len(), 2);
    }

    struct FailingSource;

    #[async_trait]
    impl SchemaSource for FailingSource {
        async fn schema(&self) -> Result<Option<Value>, SchemaError> {
            Err(SchemaError::Unavailable("catalog schema not found".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_or_invalid_schema_degrades() {
        let engine = ValidationEngine::with_builtin_rules().with_schema_source(Arc::new(FailingSource));
        let result = engine.validate(SCENARIO_A).await;
        let advisories = with_code(&result, &ErrorCode::SCHEMA_UNAVAILABLE);
        assert_eq!(advisories.len(), 1);
        assert!(advisories[0].message.contains("catalog schema not found"));

        let engine = ValidationEngine::with_builtin_rules().with_schema(json!({"type": 12}));
        let result = engine.validate(SCENARIO_A).await;
        assert_eq!(with_code(&result, &ErrorCode::SCHEMA_UNAVAILABLE).len(), 1);
        assert_eq!(with_code(&result, &ErrorCode::DUPLICATE_CONFIG_KEY).len(), 2);
    }

    #[tokio::test]
    async fn rule_errors_come_before_schema_errors() {
        let text = r#"{"x":1,"x":2,"products":[{"flavors":[{}]}]}"#;
        let result = ValidationEngine::with_builtin_rules()
            .with_schema(install_type_schema())
            .validate(text)
            .await;

        let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(
            codes,
            vec![
                "DUPLICATE_OBJECT_KEY",
                "DUPLICATE_OBJECT_KEY",
                "SCHEMA_REQUIRED",
                "SCHEMA_REQUIRED",
            ]
        );
        assert!(result.errors.iter().all(|e| e.severity.is_some()));
    }

    #[tokio::test]
    async fn ignore_patterns_apply_to_rendered_paths() {
        let mut ignore = IgnoreFilter::new();
        ignore.add(IgnorePattern::new("install_type", Some(r"flavors\[\d+\]"), "legacy flavors").unwrap());

        let engine = ValidationEngine::with_builtin_rules()
            .with_schema(install_type_schema())
            .with_config(EngineConfig::new().with_ignore_filter(ignore));
        let result = engine.validate(r#"{"products":[{"flavors":[{}]}]}"#).await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path.to_string(), "$.products[0].install_type");
    }

    #[tokio::test]
    async fn repeated_passes_are_identical() {
        let text = r#"{"x":1,"x":2,"products":[{"flavors":[{"install_type":"extension","dependency_version_2":true,"configuration":[{"key":"a"},{"key":"a"}]}]}]}"#;
        let engine = ValidationEngine::with_builtin_rules().with_schema(install_type_schema());

        let first = engine.validate(text).await;
        let second = engine.validate(text).await;
        assert!(!first.errors.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn disabling_a_rule_drops_only_its_errors() {
        let text = r#"{"x":1,"x":2,"products":[{"flavors":[{"configuration":[{"key":"a"},{"key":"a"}]}]}]}"#;
        let engine = ValidationEngine::with_builtin_rules();

        let before = engine.validate(text).await;
        engine
            .registry()
            .set_enabled("duplicate-object-keys", false)
            .await
            .unwrap();
        let after = engine.validate(text).await;

        let expected: Vec<ValidationError> = before
            .errors
            .into_iter()
            .filter(|e| e.code != ErrorCode::DUPLICATE_OBJECT_KEY)
            .collect();
        assert_eq!(after.errors, expected);
    }

    struct SlowRule;

    #[async_trait]
    impl Rule for SlowRule {
        fn id(&self) -> &'static str {
            "slow"
        }

        fn description(&self) -> &'static str {
            "Takes far too long"
        }

        async fn validate(&self, _ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn timeout_aborts_the_pass() {
        let registry = RuleRegistry::new();
        registry.register(SlowRule, RuleConfig::new()).await.unwrap();
        let engine = ValidationEngine::new(Arc::new(registry))
            .with_config(EngineConfig::new().with_timeout(Duration::from_millis(20)));

        let result = engine.validate_with_timeout("{}").await;
        assert_eq!(result, Err(EngineError::Timeout(Duration::from_millis(20))));
    }

    struct BlockingRule(&'static str);

    #[async_trait]
    impl Rule for BlockingRule {
        fn id(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "Blocks the thread without awaiting"
        }

        async fn validate(&self, _ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError> {
            std::thread::sleep(Duration::from_millis(100));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn timeout_fires_between_blocking_rules() {
        let registry = RuleRegistry::new();
        for id in ["b0", "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9"] {
            registry.register(BlockingRule(id), RuleConfig::new()).await.unwrap();
        }
        let engine = ValidationEngine::new(Arc::new(registry))
            .with_config(EngineConfig::new().with_timeout(Duration::from_millis(50)));

        let started = std::time::Instant::now();
        let result = engine.validate_with_timeout("{}").await;
        assert_eq!(result, Err(EngineError::Timeout(Duration::from_millis(50))));
        assert!(started.elapsed() < Duration::from_millis(600), "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn no_timeout_runs_normally() {
        let engine = ValidationEngine::with_builtin_rules();
        let result = engine.validate_with_timeout(SCENARIO_A).await.unwrap();
        assert_eq!(result, engine.validate(SCENARIO_A).await);
    }

    #[tokio::test]
    async fn depth_limit_comes_from_config() {
        let engine = ValidationEngine::with_builtin_rules()
            .with_config(EngineConfig::new().with_parser_config(ParserConfig::new().with_max_depth(2)));
        let result = engine.validate("[[[1]]]").await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::SYNTAX_ERROR);
    }
}
