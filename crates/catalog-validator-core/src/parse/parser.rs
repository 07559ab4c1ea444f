//! Tree builder for JSON documents.
//!
//! This module drives the lexer token parsers over the input and assembles
//! the parse tree, tracking absolute byte offsets for every node.

use super::ast::Node;
use super::error::ParseError;
use super::lexer::{Keyword, keyword, number_literal, string_literal, whitespace};
use super::span::{Span, SpanTracker};
use log::{debug, trace};

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration options for the parser.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum nesting of objects and arrays before parsing fails.
    pub max_depth: usize,
    /// If true, a leading UTF-8 byte order mark is skipped.
    pub allow_bom: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_bom: true,
        }
    }
}

impl ParserConfig {
    /// Creates a new parser config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether a leading byte order mark is accepted.
    pub fn with_allow_bom(mut self, value: bool) -> Self {
        self.allow_bom = value;
        self
    }
}

struct TreeBuilder<'a> {
    tracker: SpanTracker<'a>,
    depth: usize,
    config: &'a ParserConfig,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str, config: &'a ParserConfig) -> Self {
        Self {
            tracker: SpanTracker::new(input),
            depth: 0,
            config,
        }
    }

    fn skip_whitespace(&mut self) {
        if let Ok((rest, _)) = whitespace(self.tracker.as_str()) {
            self.tracker.advance_to(rest);
        }
    }

    fn error_here(&self, expected: &'static str) -> ParseError {
        match self.tracker.peek_char() {
            Some(found) => ParseError::unexpected_char(self.tracker.offset(), found, expected),
            None => ParseError::unexpected_end(self.tracker.offset(), expected),
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<Span, ParseError> {
        if self.tracker.peek_char() == Some(ch) {
            let span = self.tracker.span_of(ch.len_utf8());
            self.tracker.advance(ch.len_utf8());
            Ok(span)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn value(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        match self.tracker.peek_char() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some('"') => self.string(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some('t' | 'f' | 'n') => self.keyword(),
            _ => Err(self.error_here("a value")),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(ParseError::DepthExceeded {
                offset: self.tracker.offset(),
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn object(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let start = self.tracker.offset();
        self.expect('{', "'{'")?;
        let mut properties = Vec::new();

        self.skip_whitespace();
        if self.tracker.peek_char() == Some('}') {
            self.tracker.advance(1);
        } else {
            loop {
                self.skip_whitespace();
                if self.tracker.peek_char() != Some('"') {
                    return Err(self.error_here("a property name"));
                }
                let key = self.string()?;
                self.skip_whitespace();
                self.expect(':', "':'")?;
                let value = self.value()?;
                trace!("Property '{}' at offset {}", key.as_str().unwrap_or_default(), key.offset);
                properties.push(Node::property(key, value));

                self.skip_whitespace();
                match self.tracker.peek_char() {
                    Some(',') => {
                        let comma = self.tracker.offset();
                        self.tracker.advance(1);
                        self.skip_whitespace();
                        if self.tracker.peek_char() == Some('}') {
                            return Err(ParseError::TrailingComma { offset: comma });
                        }
                    }
                    Some('}') => {
                        self.tracker.advance(1);
                        break;
                    }
                    _ => return Err(self.error_here("',' or '}'")),
                }
            }
        }

        self.depth -= 1;
        let span = Span::new(start, self.tracker.offset() - start);
        Ok(Node::object(properties, span))
    }

    fn array(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let start = self.tracker.offset();
        self.expect('[', "'['")?;
        let mut elements = Vec::new();

        self.skip_whitespace();
        if self.tracker.peek_char() == Some(']') {
            self.tracker.advance(1);
        } else {
            loop {
                elements.push(self.value()?);
                self.skip_whitespace();
                match self.tracker.peek_char() {
                    Some(',') => {
                        let comma = self.tracker.offset();
                        self.tracker.advance(1);
                        self.skip_whitespace();
                        if self.tracker.peek_char() == Some(']') {
                            return Err(ParseError::TrailingComma { offset: comma });
                        }
                    }
                    Some(']') => {
                        self.tracker.advance(1);
                        break;
                    }
                    _ => return Err(self.error_here("',' or ']'")),
                }
            }
        }

        self.depth -= 1;
        let span = Span::new(start, self.tracker.offset() - start);
        Ok(Node::array(elements, span))
    }

    fn string(&mut self) -> Result<Node, ParseError> {
        let start = self.tracker.offset();
        match string_literal(self.tracker.as_str()) {
            Ok((rest, decoded)) => {
                let raw = self.tracker.advance_to(rest);
                Ok(Node::string(decoded, Span::new(start, raw.len())))
            }
            Err(e) => Err(ParseError::invalid_string(start + e.position, e.message)),
        }
    }

    fn number(&mut self) -> Result<Node, ParseError> {
        let start = self.tracker.offset();
        let (rest, text) = number_literal(self.tracker.as_str())
            .map_err(|_| ParseError::invalid_number(start, "expected digits"))?;

        if text.trim_start_matches('-') == "0" && rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseError::invalid_number(start, "leading zeros are not allowed"));
        }

        self.tracker.advance_to(rest);
        let number = serde_json::from_str::<serde_json::Number>(text).ok();
        if number.is_none() {
            debug!("Number literal '{}' at offset {} is out of range", text, start);
        }
        Ok(Node::number(number, Span::new(start, text.len())))
    }

    fn keyword(&mut self) -> Result<Node, ParseError> {
        let start = self.tracker.offset();
        let (rest, kw) = keyword(self.tracker.as_str()).map_err(|_| self.error_here("a value"))?;
        let raw = self.tracker.advance_to(rest);
        let span = Span::new(start, raw.len());
        Ok(match kw {
            Keyword::True => Node::boolean(true, span),
            Keyword::False => Node::boolean(false, span),
            Keyword::Null => Node::null(span),
        })
    }
}

/// Parses a JSON document into a parse tree with the given configuration.
pub fn parse_json_with_config(input: &str, config: &ParserConfig) -> Result<Node, ParseError> {
    debug!("Parsing JSON document ({} bytes)", input.len());
    let mut builder = TreeBuilder::new(input, config);

    if config.allow_bom && builder.tracker.peek_char() == Some('\u{feff}') {
        builder.tracker.advance('\u{feff}'.len_utf8());
    }

    let root = builder.value()?;
    builder.skip_whitespace();
    if !builder.tracker.is_empty() {
        return Err(ParseError::TrailingContent {
            offset: builder.tracker.offset(),
        });
    }

    debug!("Parsing complete: root {}", root);
    Ok(root)
}

/// Parses a JSON document using the default configuration.
pub fn parse_json(input: &str) -> Result<Node, ParseError> {
    parse_json_with_config(input, &ParserConfig::default())
}
