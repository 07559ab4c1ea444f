//! Duplicate object key detection.
//!
//! Works on the parse tree rather than the decoded value: a decoded object
//! has already collapsed its duplicate keys.

use super::{Rule, RuleContext, RuleError};
use crate::document::CatalogDocument;
use crate::parse::{Node, NodeKind};
use crate::path::JsonPath;
use crate::position::Position;
use crate::validate::ValidationError;
use async_trait::async_trait;
use std::collections::HashMap;

/// A rule that reports every occurrence of a key repeated within one object,
/// at any nesting depth.
#[derive(Debug, Clone, Default)]
pub struct DuplicateObjectKeysRule;

impl DuplicateObjectKeysRule {
    /// Creates a new duplicate object keys rule.
    pub fn new() -> Self {
        Self
    }
}

fn check_object(
    document: &CatalogDocument,
    object: &Node,
    path: &JsonPath,
    errors: &mut Vec<ValidationError>,
) {
    let mut groups: HashMap<&str, Vec<&Node>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (key, property) in object.properties() {
        let Some(key_node) = property.key_node() else {
            continue;
        };
        let nodes = groups.entry(key).or_default();
        if nodes.is_empty() {
            order.push(key);
        }
        nodes.push(key_node);
    }

    for key in order {
        let nodes = &groups[key];
        if nodes.len() < 2 {
            continue;
        }
        let positions: Vec<Position> = nodes
            .iter()
            .map(|node| document.position_at(node.offset))
            .collect();
        for (i, node) in nodes.iter().enumerate() {
            let others: Vec<(usize, Position)> = positions
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, position)| (j + 1, *position))
                .collect();
            errors.push(ValidationError::duplicate_object_key(
                path.key(key),
                key,
                i + 1,
                &others,
                document.range_of(node),
            ));
        }
    }
}

fn walk(document: &CatalogDocument, node: &Node, path: &JsonPath, errors: &mut Vec<ValidationError>) {
    match node.kind {
        NodeKind::Object => {
            check_object(document, node, path, errors);
            for (key, property) in node.properties() {
                if let Some(value) = property.value_node() {
                    walk(document, value, &path.key(key), errors);
                }
            }
        }
        NodeKind::Array => {
            for (index, element) in node.children.iter().enumerate() {
                walk(document, element, &path.index(index), errors);
            }
        }
        _ => {}
    }
}

#[async_trait]
impl Rule for DuplicateObjectKeysRule {
    fn id(&self) -> &'static str {
        "duplicate-object-keys"
    }

    fn description(&self) -> &'static str {
        "Reports keys that appear more than once in the same object"
    }

    async fn validate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationError>, RuleError> {
        if !ctx.config.enabled {
            return Ok(Vec::new());
        }
        let mut errors = Vec::new();
        walk(ctx.document, ctx.document.root(), &JsonPath::root(), &mut errors);
        Ok(errors)
    }
}
