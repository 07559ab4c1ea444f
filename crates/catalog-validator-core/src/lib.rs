//! Catalog Validator Core
//!
//! A library for parsing and validating catalog manifest JSON documents.
//!
//! # Features
//!
//! - **Parser**: Strict JSON parser that keeps byte offsets for every node
//!   and preserves duplicate keys
//! - **Positions**: Offsets to line/character positions, paths to nodes and
//!   nodes back to paths
//! - **Rules**: Structural checks for duplicate keys, duplicate
//!   configuration keys, duplicate input mappings and deprecated flags
//! - **Schema**: JSON Schema violations positioned in the source text
//! - **Ignore patterns**: Suppress known errors by message and path regex
//!
//! # Quick Start
//!
//! ```rust
//! use catalog_validator_core::engine::ValidationEngine;
//!
//! let input = r#"{
//!   "products": [{
//!     "flavors": [{
//!       "configuration": [{"key": "region"}, {"key": "region"}]
//!     }]
//!   }]
//! }"#;
//!
//! # tokio_test::block_on(async {
//! let engine = ValidationEngine::with_builtin_rules();
//! let result = engine.validate(input).await;
//!
//! for error in result.errors_only() {
//!     if let Some(range) = error.range {
//!         eprintln!("{}: {} ({})", range.start, error.message, error.path);
//!     }
//! }
//! assert!(result.has_errors());
//! # });
//! ```
//!
//! # Modules
//!
//! - [`parse`]: Parser for JSON text into a positioned tree
//! - [`position`]: Line index and editor positions
//! - [`path`]: Logical paths and node lookup
//! - [`document`]: A parsed document handed to rules
//! - [`validate`]: Rules, schema validation and error aggregation
//! - [`engine`]: One validation pass end to end

pub mod document;
pub mod engine;
#[cfg(feature = "generate")]
pub mod generate;
pub mod parse;
pub mod path;
pub mod position;
pub mod validate;

// Re-export commonly used types at the crate root
pub use document::CatalogDocument;
pub use engine::{EngineConfig, EngineError, ValidationEngine};
pub use parse::{Node, NodeKind, ParseError, parse_json};
pub use path::JsonPath;
pub use position::{Position, Range};
pub use validate::{
    ErrorCode, IgnoreFilter, RuleConfig, RuleRegistry, Severity, ValidationError,
    ValidationResult,
};
