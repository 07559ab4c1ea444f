//! Error types for JSON document parsing.
//!
//! A parse failure is fatal for a validation pass: there is no tree to
//! validate against. Every error carries the byte offset of the failure so
//! callers can still point at it.

use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input ended while a value or delimiter was still expected.
    #[error("offset {offset}: unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// Byte offset where input ran out.
        offset: usize,
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// A character that cannot start the expected token.
    #[error("offset {offset}: unexpected character '{found}', expected {expected}")]
    UnexpectedChar {
        /// Byte offset of the offending character.
        offset: usize,
        /// The character found.
        found: char,
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// A malformed string literal.
    #[error("offset {offset}: invalid string - {message}")]
    InvalidString {
        /// Byte offset of the problem inside the literal.
        offset: usize,
        /// Description of the problem.
        message: &'static str,
    },

    /// A malformed number literal.
    #[error("offset {offset}: invalid number - {message}")]
    InvalidNumber {
        /// Byte offset of the number.
        offset: usize,
        /// Description of the problem.
        message: &'static str,
    },

    /// A comma directly followed by a closing bracket or brace.
    #[error("offset {offset}: trailing comma is not allowed")]
    TrailingComma {
        /// Byte offset of the comma.
        offset: usize,
    },

    /// Non-whitespace content after the root value.
    #[error("offset {offset}: unexpected content after the document root")]
    TrailingContent {
        /// Byte offset of the first extra character.
        offset: usize,
    },

    /// Nesting deeper than the parser's limit.
    #[error("offset {offset}: nesting exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// Byte offset of the container that crossed the limit.
        offset: usize,
        /// The configured maximum depth.
        limit: usize,
    },
}

impl ParseError {
    /// Creates an unexpected end of input error.
    pub fn unexpected_end(offset: usize, expected: &'static str) -> Self {
        Self::UnexpectedEnd { offset, expected }
    }

    /// Creates an unexpected character error.
    pub fn unexpected_char(offset: usize, found: char, expected: &'static str) -> Self {
        Self::UnexpectedChar {
            offset,
            found,
            expected,
        }
    }

    /// Creates an invalid string error.
    pub fn invalid_string(offset: usize, message: &'static str) -> Self {
        Self::InvalidString { offset, message }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(offset: usize, message: &'static str) -> Self {
        Self::InvalidNumber { offset, message }
    }

    /// Returns the byte offset where this error occurred.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedEnd { offset, .. } => *offset,
            ParseError::UnexpectedChar { offset, .. } => *offset,
            ParseError::InvalidString { offset, .. } => *offset,
            ParseError::InvalidNumber { offset, .. } => *offset,
            ParseError::TrailingComma { offset } => *offset,
            ParseError::TrailingContent { offset } => *offset,
            ParseError::DepthExceeded { offset, .. } => *offset,
        }
    }

    /// Returns the message without the offset prefix.
    pub fn description(&self) -> String {
        let full = self.to_string();
        match full.split_once(": ") {
            Some((_, rest)) => rest.to_string(),
            None => full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_unexpected_char() {
        let error = ParseError::unexpected_char(7, '}', "a value");
        assert_eq!(error.offset(), 7);
        assert!(error.to_string().contains("unexpected character '}'"));
        assert!(error.to_string().contains("a value"));
    }

    #[test]
    fn parse_error_unexpected_end() {
        let error = ParseError::unexpected_end(3, "',' or '}'");
        assert_eq!(error.offset(), 3);
        assert!(error.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn parse_error_description_strips_offset() {
        let error = ParseError::TrailingComma { offset: 12 };
        assert_eq!(error.description(), "trailing comma is not allowed");
        assert_eq!(error.offset(), 12);
    }

    #[test]
    fn parse_error_depth_exceeded() {
        let error = ParseError::DepthExceeded {
            offset: 99,
            limit: 256,
        };
        assert!(error.to_string().contains("256"));
    }
}
