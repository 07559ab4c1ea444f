//! Span tracking for source location information.
//!
//! Provides a `Span` struct holding a byte offset and length, plus a
//! `SpanTracker` cursor used by the parser to know where it is in the input.
//! Line and column information is derived later from a
//! [`LineIndex`](crate::position::LineIndex), so spans stay cheap to copy.

use serde::Serialize;

/// Represents a byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Byte offset from the start of the input (0-based).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Span {
    /// Creates a new span with the given offset and length.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Creates a zero-length span at the given offset.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, 0)
    }

    /// Returns the end offset of this span (exclusive).
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Returns true if `offset` falls inside this span.
    ///
    /// The end offset is included so that a cursor placed right after a
    /// token still counts as being "on" it.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset <= self.end_offset()
    }

    /// Returns true if `other` lies entirely inside this span.
    pub fn encloses(&self, other: &Span) -> bool {
        other.offset >= self.offset && other.end_offset() <= self.end_offset()
    }

    /// Extends this span to include another span.
    pub fn extend(&self, other: &Span) -> Span {
        let end = other.end_offset().max(self.end_offset());
        Span {
            offset: self.offset,
            length: end.saturating_sub(self.offset),
        }
    }
}

/// Tracks position while iterating through input.
///
/// Wraps a string slice and maintains the absolute byte offset of the
/// remaining input so nom token parsers can run on `as_str()` while the
/// caller keeps exact source offsets.
#[derive(Debug, Clone, Copy)]
pub struct SpanTracker<'a> {
    /// The remaining input to parse.
    input: &'a str,
    /// Current byte offset from the original input start.
    offset: usize,
}

impl<'a> SpanTracker<'a> {
    /// Creates a new span tracker for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    /// Returns the remaining input.
    pub fn as_str(&self) -> &'a str {
        self.input
    }

    /// Returns true if there's no more input.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Creates a span from the current position with the given length.
    pub fn span_of(&self, length: usize) -> Span {
        Span::new(self.offset, length)
    }

    /// Advances the tracker by the given number of bytes.
    pub fn advance(&mut self, bytes: usize) -> &'a str {
        let consumed = &self.input[..bytes];
        self.offset += bytes;
        self.input = &self.input[bytes..];
        consumed
    }

    /// Moves the tracker so that `rest` becomes the remaining input.
    ///
    /// `rest` must be a suffix of the current input, as returned by a nom
    /// parser run on [`as_str`](Self::as_str).
    pub fn advance_to(&mut self, rest: &'a str) -> &'a str {
        let consumed = self.input.len() - rest.len();
        self.advance(consumed)
    }

    /// Returns the current byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Peeks at the next character without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.input.chars().next()
    }
}
