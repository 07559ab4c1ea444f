//! Parse tree data structures for JSON documents.
//!
//! The tree keeps every node's byte span so that validation errors can be
//! anchored to the exact source text. Objects hold `Property` children in
//! source order (duplicates included), properties hold exactly two
//! children (key, then value) and arrays hold their elements directly.

use super::span::Span;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{self, Display};

/// The kind of a parse tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A `{ ... }` object. Children are `Property` nodes.
    Object,
    /// A `[ ... ]` array. Children are the element values.
    Array,
    /// A `"key": value` member of an object. Children are `[key, value]`.
    Property,
    /// A string literal.
    String,
    /// A number literal.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
}

impl NodeKind {
    /// Returns true for kinds that carry a decoded scalar value.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            NodeKind::String | NodeKind::Number | NodeKind::Boolean | NodeKind::Null
        )
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Property => "property",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// A single node of the parse tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// What kind of node this is.
    pub kind: NodeKind,
    /// Absolute byte offset of the first character of the node.
    pub offset: usize,
    /// Length of the node's source text in bytes.
    pub length: usize,
    /// Child nodes, in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// The decoded value, present only for scalar kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Node {
    fn scalar(kind: NodeKind, span: Span, value: Value) -> Self {
        Self {
            kind,
            offset: span.offset,
            length: span.length,
            children: Vec::new(),
            value: Some(value),
        }
    }

    /// Creates a string node.
    pub fn string(text: impl Into<String>, span: Span) -> Self {
        Self::scalar(NodeKind::String, span, Value::String(text.into()))
    }

    /// Creates a number node. A literal that does not fit a JSON number
    /// (e.g. `1e400`) decodes to `null`.
    pub fn number(value: Option<serde_json::Number>, span: Span) -> Self {
        let value = value.map(Value::Number).unwrap_or(Value::Null);
        Self::scalar(NodeKind::Number, span, value)
    }

    /// Creates a boolean node.
    pub fn boolean(value: bool, span: Span) -> Self {
        Self::scalar(NodeKind::Boolean, span, Value::Bool(value))
    }

    /// Creates a null node.
    pub fn null(span: Span) -> Self {
        Self::scalar(NodeKind::Null, span, Value::Null)
    }

    /// Creates an object node from its property children.
    pub fn object(properties: Vec<Node>, span: Span) -> Self {
        debug_assert!(properties.iter().all(|p| p.kind == NodeKind::Property));
        Self {
            kind: NodeKind::Object,
            offset: span.offset,
            length: span.length,
            children: properties,
            value: None,
        }
    }

    /// Creates an array node from its elements.
    pub fn array(elements: Vec<Node>, span: Span) -> Self {
        Self {
            kind: NodeKind::Array,
            offset: span.offset,
            length: span.length,
            children: elements,
            value: None,
        }
    }

    /// Creates a property node. Its span runs from the key's first byte to
    /// the value's last byte.
    pub fn property(key: Node, value: Node) -> Self {
        debug_assert_eq!(key.kind, NodeKind::String);
        let span = key.span().extend(&value.span());
        Self {
            kind: NodeKind::Property,
            offset: span.offset,
            length: span.length,
            children: vec![key, value],
            value: None,
        }
    }

    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.length)
    }

    /// Returns the end offset of this node (exclusive).
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Returns true if this is an object node.
    pub fn is_object(&self) -> bool {
        self.kind == NodeKind::Object
    }

    /// Returns true if this is an array node.
    pub fn is_array(&self) -> bool {
        self.kind == NodeKind::Array
    }

    /// For a property node, returns its key node.
    pub fn key_node(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::Property => self.children.first(),
            _ => None,
        }
    }

    /// For a property node, returns its value node.
    pub fn value_node(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::Property => self.children.get(1),
            _ => None,
        }
    }

    /// For a property node, returns the decoded key.
    pub fn key(&self) -> Option<&str> {
        self.key_node()
            .and_then(|key| key.value.as_ref())
            .and_then(Value::as_str)
    }

    /// For a string node, returns the decoded text.
    pub fn as_str(&self) -> Option<&str> {
        match self.kind {
            NodeKind::String => self.value.as_ref().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Iterates over `(key, property)` pairs of an object node in source
    /// order. Yields nothing for other kinds.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Node)> {
        let children: &[Node] = if self.is_object() { &self.children } else { &[] };
        children
            .iter()
            .filter_map(|property| property.key().map(|key| (key, property)))
    }

    /// Returns the value node of the last property named `key`, the one
    /// [`Node::to_value`] keeps.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.properties()
            .filter(|(name, _)| *name == key)
            .last()
            .and_then(|(_, property)| property.value_node())
    }

    /// Returns the element at `index` of an array node.
    pub fn element(&self, index: usize) -> Option<&Node> {
        if self.is_array() {
            self.children.get(index)
        } else {
            None
        }
    }

    /// Decodes this subtree into a JSON value.
    ///
    /// Duplicate object keys follow the usual JSON decoding rule: the last
    /// occurrence wins.
    pub fn to_value(&self) -> Value {
        match self.kind {
            NodeKind::Object => {
                let mut map = Map::new();
                for (key, property) in self.properties() {
                    let value = property.value_node().map(Node::to_value).unwrap_or(Value::Null);
                    map.insert(key.to_string(), value);
                }
                Value::Object(map)
            }
            NodeKind::Array => Value::Array(self.children.iter().map(Node::to_value).collect()),
            NodeKind::Property => self.value_node().map(Node::to_value).unwrap_or(Value::Null),
            _ => self.value.clone().unwrap_or(Value::Null),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}+{}", self.kind, self.offset, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_object() -> Node {
        // {"a":1,"a":2}
        let first = Node::property(
            Node::string("a", Span::new(1, 3)),
            Node::number(Some(1.into()), Span::new(5, 1)),
        );
        let second = Node::property(
            Node::string("a", Span::new(7, 3)),
            Node::number(Some(2.into()), Span::new(11, 1)),
        );
        Node::object(vec![first, second], Span::new(0, 13))
    }

    #[test]
    fn property_span_covers_key_and_value() {
        let object = sample_object();
        let property = &object.children[0];
        assert_eq!(property.kind, NodeKind::Property);
        assert_eq!(property.offset, 1);
        assert_eq!(property.length, 5);
        assert_eq!(property.key(), Some("a"));
    }

    #[test]
    fn properties_keep_source_order_and_duplicates() {
        let object = sample_object();
        let keys: Vec<_> = object.properties().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "a"]);
    }

    #[test]
    fn get_agrees_with_decoded_value_on_duplicates() {
        let object = sample_object();
        let value = object.get("a").unwrap();
        assert_eq!(value.value, Some(json!(2)));
        assert_eq!(value.offset, 11);
        assert_eq!(Some(value.to_value()), object.to_value().get("a").cloned());
    }

    #[test]
    fn to_value_last_duplicate_wins() {
        assert_eq!(sample_object().to_value(), json!({"a": 2}));
    }

    #[test]
    fn element_only_on_arrays() {
        let array = Node::array(
            vec![Node::null(Span::new(1, 4)), Node::boolean(true, Span::new(7, 4))],
            Span::new(0, 12),
        );
        assert_eq!(array.element(1).map(|n| n.kind), Some(NodeKind::Boolean));
        assert!(array.element(2).is_none());
        assert!(sample_object().element(0).is_none());
        assert_eq!(array.to_value(), json!([null, true]));
    }

    #[test]
    fn number_out_of_range_decodes_to_null() {
        let node = Node::number(None, Span::new(0, 5));
        assert_eq!(node.kind, NodeKind::Number);
        assert_eq!(node.value, Some(Value::Null));
    }

    #[test]
    fn scalar_kinds() {
        assert!(NodeKind::String.is_scalar());
        assert!(NodeKind::Null.is_scalar());
        assert!(!NodeKind::Object.is_scalar());
        assert!(!NodeKind::Property.is_scalar());
    }

    #[test]
    fn node_display() {
        let node = Node::string("x", Span::new(4, 3));
        assert_eq!(node.to_string(), "string@4+3");
    }
}
