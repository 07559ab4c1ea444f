//! Validation of catalog manifest documents.
//!
//! Validation is split into structural rules run through a
//! [`RuleRegistry`], an optional JSON Schema pass, and an aggregation step
//! that deduplicates and filters the combined output.
//!
//! # Example
//!
//! ```rust
//! use catalog_validator_core::document::CatalogDocument;
//! use catalog_validator_core::validate::{ErrorCode, RuleRegistry};
//!
//! # tokio_test::block_on(async {
//! let document = CatalogDocument::parse(r#"{"x": 1, "x": 2}"#).unwrap();
//! let registry = RuleRegistry::with_builtin_rules();
//!
//! let result = registry.validate_all(&document).await;
//! assert_eq!(result.errors.len(), 2);
//! assert!(result.contains_code(&ErrorCode::DUPLICATE_OBJECT_KEY));
//! # });
//! ```

pub mod aggregate;
mod error;
pub mod ignore;
mod registry;
pub mod rules;
pub mod schema;
pub mod summary;

// Re-export public types
pub use aggregate::filter_and_deduplicate;
pub use error::{ErrorCategory, ErrorCode, Severity, ValidationError, ValidationResult, ordinal};
pub use ignore::{IgnoreFilter, IgnorePattern, IgnorePatternError, IgnorePatternSpec};
pub use registry::{RegistryError, RuleConfigProvider, RuleInfo, RuleRegistry};
pub use rules::{PersistedRuleConfig, Rule, RuleConfig, RuleContext, RuleError};
pub use schema::{SchemaError, SchemaSource, SchemaValidator, StaticSchemaSource};
pub use summary::{ErrorSummary, generate_error_summary};
