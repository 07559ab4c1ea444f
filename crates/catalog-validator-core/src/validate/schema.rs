//! Schema validation adapter.
//!
//! Runs the decoded document against a JSON Schema and translates each
//! violation into a [`ValidationError`] positioned in the source text.
//!
//! The schema itself comes from an external [`SchemaSource`]. This crate
//! never fetches schemas over the network.

use crate::document::CatalogDocument;
use crate::path::JsonPath;
use crate::validate::ValidationError;
use async_trait::async_trait;
use jsonschema::error::ValidationErrorKind;
use log::{debug, trace};
use serde_json::Value;
use thiserror::Error;

/// Errors from obtaining or compiling a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema could not be obtained.
    #[error("schema unavailable: {0}")]
    Unavailable(String),

    /// The schema document is not a valid JSON Schema.
    #[error("schema failed to compile: {0}")]
    Compile(String),
}

/// Supplies the schema document for a validation pass.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Returns the schema, or `None` when no schema is configured.
    async fn schema(&self) -> Result<Option<Value>, SchemaError>;
}

/// A schema source holding a fixed schema document, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    schema: Option<Value>,
}

impl StaticSchemaSource {
    /// Creates a source that always returns `schema`.
    pub fn new(schema: Value) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    /// Creates a source that has no schema.
    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn schema(&self) -> Result<Option<Value>, SchemaError> {
        Ok(self.schema.clone())
    }
}

/// Returns the keyword that failed, taken from the last non-numeric segment
/// of the schema location, e.g. `/properties/a/type` gives `type`.
fn keyword_of(schema_path: &str) -> &str {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or("schema")
}

/// A compiled schema.
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compiles a schema document.
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .build(schema)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Validates a document and returns its schema violations.
    ///
    /// A missing required property is reported at the path of the missing
    /// property with the range of the object that lacks it. Other violations
    /// use the range of the offending node, or of its closest ancestor.
    pub fn validate(&self, document: &CatalogDocument) -> Vec<ValidationError> {
        let errors: Vec<ValidationError> = self
            .validator
            .iter_errors(document.value())
            .map(|e| {
                let path = JsonPath::from_pointer(&e.instance_path.to_string());
                let schema_path = e.schema_path.to_string();
                let keyword = keyword_of(&schema_path);
                trace!("Schema violation '{}' at {}", keyword, path);

                // For `required` this is the object lacking the property.
                let range = document.locate(&path).range;
                match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        let name = match property {
                            Value::String(name) => name.clone(),
                            other => other.to_string(),
                        };
                        ValidationError::schema_violation(
                            "required",
                            format!("must have required property '{}'", name),
                            path.key(name),
                            range,
                        )
                    }
                    _ => ValidationError::schema_violation(keyword, e.to_string(), path, range),
                }
            })
            .collect();
        debug!("Schema validation found {} issues", errors.len());
        errors
    }
}
