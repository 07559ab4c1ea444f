//! The parsed form of a catalog manifest handed to validation rules.

use crate::parse::{Node, ParseError, ParserConfig, parse_json_with_config};
use crate::path::{JsonPath, Location, find_node, path_at_offset, resolve};
use crate::position::{LineIndex, Position, Range};
use serde_json::Value;
use std::sync::Arc;

/// A parsed document: source text, line index, parse tree and decoded value.
///
/// The decoded value follows ordinary JSON semantics (the last duplicate key
/// wins), so anything that cares about duplicates must look at the tree.
#[derive(Debug, Clone)]
pub struct CatalogDocument {
    index: LineIndex,
    root: Node,
    value: Value,
}

impl CatalogDocument {
    /// Parses a document with the default parser configuration.
    pub fn parse(text: impl Into<Arc<str>>) -> Result<Self, ParseError> {
        Self::parse_with_config(text, &ParserConfig::default())
    }

    /// Parses a document with the given parser configuration.
    pub fn parse_with_config(
        text: impl Into<Arc<str>>,
        config: &ParserConfig,
    ) -> Result<Self, ParseError> {
        let text: Arc<str> = text.into();
        let root = parse_json_with_config(&text, config)?;
        let value = root.to_value();
        Ok(Self {
            index: LineIndex::new(text),
            root,
            value,
        })
    }

    /// Returns the source text.
    pub fn text(&self) -> &str {
        self.index.text()
    }

    /// Returns the line index of the source text.
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Returns the root node of the parse tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the decoded value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Finds the node at `path`.
    pub fn find(&self, path: &JsonPath) -> Option<&Node> {
        find_node(&self.root, path)
    }

    /// Returns the range covered by a node.
    pub fn range_of(&self, node: &Node) -> Range {
        self.index.range_of(node.span())
    }

    /// Converts a byte offset to a position.
    pub fn position_at(&self, offset: usize) -> Position {
        self.index.position_at(offset)
    }

    /// Returns the path of the innermost node at `offset`.
    pub fn path_at(&self, offset: usize) -> JsonPath {
        path_at_offset(&self.root, offset)
    }

    /// Locates `path` in the tree, falling back to the closest ancestor.
    pub fn locate(&self, path: &JsonPath) -> Location {
        let (node, resolution) = resolve(&self.root, path);
        Location {
            span: node.span(),
            range: self.range_of(node),
            resolution,
        }
    }
}
