//! Logical paths into a JSON document and their resolution against the
//! parse tree.
//!
//! A path can be written in dot/bracket notation (`$.products[0].key`,
//! `products[0].key`, `$["odd key"]`) or as a JSON Pointer
//! (`/products/0/key`). Both forms parse into the same [`JsonPath`].
//!
//! # Example
//!
//! ```rust
//! use catalog_validator_core::parse::parse_json;
//! use catalog_validator_core::path::{find_closest_node, find_node, JsonPath};
//!
//! let root = parse_json(r#"{"products": [{"flavors": [{}]}]}"#).unwrap();
//! let path: JsonPath = "products[0].flavors[0].name".parse().unwrap();
//!
//! assert!(find_node(&root, &path).is_none());
//! let (ancestor, depth) = find_closest_node(&root, &path);
//! assert_eq!(depth, 4);
//! assert!(ancestor.is_object());
//! ```

use crate::parse::{Node, NodeKind, Span, parse_json, string_literal};
use crate::position::{LineIndex, Range};
use log::trace;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::map_res,
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{delimited, preceded},
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object property name.
    Key(String),
    /// An array index.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// An error produced when a path string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path text is not valid dot/bracket notation.
    #[error("invalid path '{path}': unexpected input at offset {offset}")]
    Syntax {
        /// The path text.
        path: String,
        /// Byte offset where parsing stopped.
        offset: usize,
    },
}

/// A logical address into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// The path of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from its segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with a key segment appended.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Returns a new path with an index segment appended.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Returns a new path with a segment appended.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    /// Returns the path without its last segment, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self::from_segments(rest.to_vec()))
    }

    /// Returns the first `depth` segments as a path.
    pub fn truncated(&self, depth: usize) -> Self {
        let depth = depth.min(self.segments.len());
        Self::from_segments(self.segments[..depth].to_vec())
    }

    /// Returns the last key segment, skipping trailing indices.
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Parses a JSON Pointer (RFC 6901). The empty pointer is the root.
    ///
    /// All-digit tokens become index segments; whether they address an
    /// array element or an object key is decided when resolving.
    pub fn from_pointer(pointer: &str) -> Self {
        let pointer = pointer.strip_prefix('#').unwrap_or(pointer);
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|token| {
                let token = token.replace("~1", "/").replace("~0", "~");
                match token.parse::<usize>() {
                    Ok(index) if is_canonical_index(&token) => PathSegment::Index(index),
                    _ => PathSegment::Key(token),
                }
            })
            .collect();
        Self { segments }
    }

    /// Renders this path as a JSON Pointer.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.segments {
            pointer.push('/');
            match segment {
                PathSegment::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }
}

fn is_canonical_index(token: &str) -> bool {
    token == "0" || (!token.starts_with('0') && token.bytes().all(|b| b.is_ascii_digit()))
}

/// Keys that render as `.key` rather than `["key"]`.
fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => write!(f, ".{}", key)?,
                PathSegment::Key(key) => {
                    let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                    write!(f, "[{}]", quoted)?
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

fn dot_key(input: &str) -> IResult<&str, PathSegment> {
    preceded(char('.'), take_while1(|c: char| c != '.' && c != '['))
        .map(PathSegment::from)
        .parse(input)
}

fn bare_key(input: &str) -> IResult<&str, PathSegment> {
    take_while1(|c: char| c != '.' && c != '[')
        .map(PathSegment::from)
        .parse(input)
}

fn index_segment(input: &str) -> IResult<&str, PathSegment> {
    delimited(char('['), map_res(digit1, str::parse::<usize>), char(']'))
        .map(PathSegment::Index)
        .parse(input)
}

fn quoted_key(input: &str) -> IResult<&str, PathSegment> {
    let (rest, _) = char('[').parse(input)?;
    let (rest, key) =
        string_literal(rest).map_err(|_| nom::Err::Error(NomError::new(rest, ErrorKind::Escaped)))?;
    let (rest, _) = char(']').parse(rest)?;
    Ok((rest, PathSegment::Key(key)))
}

fn dotted_path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    let input = input.strip_prefix('$').unwrap_or(input);
    let (rest, first) = if input.starts_with(['.', '[']) || input.is_empty() {
        (input, None)
    } else {
        let (rest, key) = bare_key(input)?;
        (rest, Some(key))
    };
    let (rest, tail) = many0(alt((dot_key, index_segment, quoted_key))).parse(rest)?;
    Ok((rest, first.into_iter().chain(tail).collect()))
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('/') {
            return Ok(Self::from_pointer(s));
        }
        let syntax_error = |rest: &str| PathError::Syntax {
            path: s.to_string(),
            offset: s.len() - rest.len(),
        };
        match dotted_path(s) {
            Ok(("", segments)) => Ok(Self::from_segments(segments)),
            Ok((rest, _)) => Err(syntax_error(rest)),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(e.input)),
            Err(nom::Err::Incomplete(_)) => Err(syntax_error("")),
        }
    }
}

impl From<Vec<PathSegment>> for JsonPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self::from_segments(segments)
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Resolves one segment against a node.
///
/// An index segment against an object falls back to a key lookup so that
/// keys like `"0"` stay reachable. A key segment never indexes an array.
fn child<'a>(node: &'a Node, segment: &PathSegment) -> Option<&'a Node> {
    match (node.kind, segment) {
        (NodeKind::Object, PathSegment::Key(key)) => node.get(key),
        (NodeKind::Object, PathSegment::Index(index)) => node.get(&index.to_string()),
        (NodeKind::Array, PathSegment::Index(index)) => node.element(*index),
        _ => None,
    }
}

/// Walks `path` from `root`, returning `None` as soon as a segment cannot
/// be resolved. The empty path resolves to the root itself.
pub fn find_node<'a>(root: &'a Node, path: &JsonPath) -> Option<&'a Node> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child(node, segment))
}

/// Resolves the longest prefix of `path` that exists in the tree.
///
/// Returns the node and the number of segments that resolved. The root
/// always resolves, so this never fails.
pub fn find_closest_node<'a>(root: &'a Node, path: &JsonPath) -> (&'a Node, usize) {
    let mut node = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        match child(node, segment) {
            Some(next) => node = next,
            None => return (node, depth),
        }
    }
    (node, path.len())
}

/// Returns the path of the innermost node containing `offset`.
///
/// An offset on a property key yields the path of that property. An offset
/// outside the root yields the root path.
pub fn path_at_offset(root: &Node, offset: usize) -> JsonPath {
    let mut path = JsonPath::root();
    let mut node = root;

    loop {
        match node.kind {
            NodeKind::Object => {
                let Some((key, property)) = node
                    .properties()
                    .find(|(_, property)| property.span().contains(offset))
                else {
                    break;
                };
                path.push(key);
                match property.value_node() {
                    Some(value) if value.span().contains(offset) => node = value,
                    _ => break,
                }
            }
            NodeKind::Array => {
                let Some((index, element)) = node
                    .children
                    .iter()
                    .enumerate()
                    .find(|(_, element)| element.span().contains(offset))
                else {
                    break;
                };
                path.push(index);
                node = element;
            }
            _ => break,
        }
    }
    path
}

/// How [`locate`] found a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The full path resolved in the parse tree.
    Exact,
    /// Only the first `depth` segments resolved; the location is that
    /// ancestor's span.
    Ancestor {
        /// Number of segments that resolved.
        depth: usize,
    },
    /// The text did not parse; the location came from scanning the raw
    /// text for the path's keys.
    TextScan,
    /// Nothing matched; the location is the start of the document.
    DocumentStart,
}

/// A resolved location for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte span of the location.
    pub span: Span,
    /// Line/character range of the location.
    pub range: Range,
    /// Which strategy produced the location.
    pub resolution: Resolution,
}

/// Resolves `path` in a parse tree, falling back to the closest ancestor.
pub fn resolve<'a>(root: &'a Node, path: &JsonPath) -> (&'a Node, Resolution) {
    let (node, depth) = find_closest_node(root, path);
    if depth == path.len() {
        (node, Resolution::Exact)
    } else {
        trace!("Path {} resolved to ancestor at depth {}", path, depth);
        (node, Resolution::Ancestor { depth })
    }
}

/// Scans raw text for the key segments of `path` in order, each search
/// starting after the previous match. Returns the span of the last quoted
/// key found.
fn scan_for_keys(text: &str, path: &JsonPath) -> Option<Span> {
    let mut found = None;
    let mut from = 0;
    for segment in path.segments() {
        let PathSegment::Key(key) = segment else {
            continue;
        };
        let Ok(quoted) = serde_json::to_string(key) else {
            break;
        };
        let Ok(pattern) = Regex::new(&format!(r"{}\s*:", regex::escape(&quoted))) else {
            break;
        };
        match pattern.find_at(text, from) {
            Some(m) => {
                found = Some(Span::new(m.start(), quoted.len()));
                from = m.end();
            }
            None => break,
        }
    }
    found
}

/// Locates `path` in raw text.
///
/// Precedence: exact tree lookup, then the closest tree ancestor, and only
/// when the text does not parse, a scan of the raw text for the path's keys,
/// then the document start.
pub fn locate(text: &str, path: &JsonPath) -> Location {
    let index = LineIndex::new(text);
    let (span, resolution) = match parse_json(text) {
        Ok(root) => {
            let (node, resolution) = resolve(&root, path);
            (node.span(), resolution)
        }
        Err(e) => {
            trace!("Text does not parse ({}), scanning for {}", e, path);
            match scan_for_keys(text, path) {
                Some(span) => (span, Resolution::TextScan),
                None => (Span::point(0), Resolution::DocumentStart),
            }
        }
    };
    Location {
        span,
        range: index.range_of(span),
        resolution,
    }
}
