//! Parser module for catalog manifest documents.
//!
//! This module parses JSON text into a parse tree that keeps the byte span
//! of every node, including duplicate object keys that a plain decoder
//! would silently drop.
//!
//! # Example
//!
//! ```rust
//! use catalog_validator_core::parse::{parse_json, NodeKind};
//!
//! let input = r#"{"name": "demo", "name": "again"}"#;
//!
//! let root = parse_json(input).unwrap();
//! assert_eq!(root.kind, NodeKind::Object);
//! assert_eq!(root.properties().count(), 2);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
pub mod span;

// Re-export public types
pub use ast::{Node, NodeKind};
pub use error::ParseError;
pub use parser::{DEFAULT_MAX_DEPTH, ParserConfig, parse_json, parse_json_with_config};
pub use span::Span;

pub(crate) use lexer::string_literal;
