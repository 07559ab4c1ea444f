//! Conversion between byte offsets and line/character positions.
//!
//! Positions follow the editor convention: `line` and `character` are both
//! zero-based and `character` counts UTF-16 code units from the start of the
//! line. For ASCII text this is the same as the byte column.
//!
//! # Example
//!
//! ```rust
//! use catalog_validator_core::position::{LineIndex, Position};
//!
//! let index = LineIndex::new("{\n  \"a\": 1\n}");
//! assert_eq!(index.position_at(4), Position::new(1, 2));
//! assert_eq!(index.offset_at(Position::new(1, 2)), 4);
//! ```

use crate::parse::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-based).
    pub line: usize,
    /// UTF-16 code unit offset from the line start (0-based).
    pub character: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    /// Formats as 1-based `line:column`, the way people read locations.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates an empty range at a position.
    pub fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Returns true if start and end are the same position.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Precomputed line start offsets for a text.
///
/// Building the index is O(n); each lookup is a binary search over the
/// line starts plus a scan of a single line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Builds a line index for the given text.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// Returns the indexed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of lines. An empty text has one line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the byte offset at which `line` starts, if it exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte offset just past the content of `line`, excluding its `\n`.
    fn line_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        }
    }

    /// Converts a byte offset into a position.
    ///
    /// Offsets past the end of the text clamp to the end. An offset inside
    /// a multi-byte character is moved back to that character's start.
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let character = self.text[start..offset].encode_utf16().count();
        Position::new(line, character)
    }

    /// Converts a position back into a byte offset.
    ///
    /// Lines past the end clamp to the end of the text; characters past the
    /// end of a line clamp to the end of that line.
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(start) = self.line_start(position.line) else {
            return self.text.len();
        };
        let end = self.line_end(position.line);

        let mut units = 0;
        for (i, ch) in self.text[start..end].char_indices() {
            if units >= position.character {
                return start + i;
            }
            units += ch.len_utf16();
        }
        end
    }

    /// Converts a byte span into a range.
    pub fn range_of(&self, span: Span) -> Range {
        Range::new(self.position_at(span.offset), self.position_at(span.end_offset()))
    }
}
