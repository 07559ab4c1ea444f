//! Lexer and token parsers for JSON documents.
//!
//! This module contains nom-based parsers for individual tokens like
//! whitespace, numbers, keywords and string literals. The tree builder in
//! `parser` drives them and attaches absolute offsets.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{opt, recognize, value},
};

/// A literal keyword token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

/// A lexing failure inside a string literal.
///
/// `position` is relative to the start of the input handed to the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    /// Byte position of the failure, relative to the token start.
    pub position: usize,
    /// Description of what went wrong.
    pub message: &'static str,
}

impl LexError {
    fn new(position: usize, message: &'static str) -> Self {
        Self { position, message }
    }
}

/// Skips JSON insignificant whitespace (space, tab, line feed, carriage return).
pub fn whitespace(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Recognizes a JSON number literal and returns its raw text.
///
/// Follows the RFC 8259 grammar: optional minus, `0` or a non-zero digit
/// run, optional fraction, optional exponent.
pub fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(char('-')),
        alt((tag("0"), digit1)),
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// Parses one of the literal keywords `true`, `false` or `null`.
pub fn keyword(input: &str) -> IResult<&str, Keyword> {
    alt((
        value(Keyword::True, tag("true")),
        value(Keyword::False, tag("false")),
        value(Keyword::Null, tag("null")),
    ))
    .parse(input)
}

/// Characters that can appear in a string literal without escaping.
fn is_plain_string_char(c: char) -> bool {
    c != '"' && c != '\\' && c >= '\u{20}'
}

/// Parses a quoted string literal and returns the remaining input and the
/// decoded contents.
pub fn string_literal(input: &str) -> Result<(&str, String), LexError> {
    let opening: IResult<&str, char> = char('"').parse(input);
    let mut rest = match opening {
        Ok((rest, _)) => rest,
        Err(_) => return Err(LexError::new(0, "expected '\"'")),
    };

    let mut decoded = String::new();
    loop {
        let run: IResult<&str, &str> = take_while(is_plain_string_char).parse(rest);
        let (after_run, text) = run.unwrap_or((rest, ""));
        decoded.push_str(text);
        rest = after_run;

        let position = input.len() - rest.len();
        match rest.chars().next() {
            Some('"') => return Ok((&rest[1..], decoded)),
            Some('\\') => {
                let (after_escape, ch) =
                    escape_sequence(rest).map_err(|message| LexError::new(position, message))?;
                decoded.push(ch);
                rest = after_escape;
            }
            Some(_) => return Err(LexError::new(position, "control character in string")),
            None => return Err(LexError::new(position, "unterminated string")),
        }
    }
}

/// Decodes one escape sequence. `input` starts at the backslash.
fn escape_sequence(input: &str) -> Result<(&str, char), &'static str> {
    let body = &input[1..];
    let Some(kind) = body.chars().next() else {
        return Err("unterminated escape sequence");
    };
    let rest = &body[kind.len_utf8()..];
    let decoded = match kind {
        '"' => '"',
        '\\' => '\\',
        '/' => '/',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'u' => return unicode_escape(rest),
        _ => return Err("invalid escape sequence"),
    };
    Ok((rest, decoded))
}

fn hex4(input: &str) -> Result<(&str, u16), &'static str> {
    let parsed: IResult<&str, &str> =
        take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()).parse(input);
    let (rest, digits) = parsed.map_err(|_| "invalid unicode escape")?;
    let code = u16::from_str_radix(digits, 16).map_err(|_| "invalid unicode escape")?;
    Ok((rest, code))
}

/// Decodes the `XXXX` part of a `\uXXXX` escape, combining surrogate pairs.
///
/// Unpaired surrogates decode to U+FFFD.
fn unicode_escape(input: &str) -> Result<(&str, char), &'static str> {
    let (rest, high) = hex4(input)?;
    if (0xD800..0xDC00).contains(&high) {
        if let Some(after) = rest.strip_prefix("\\u") {
            if let Ok((after_low, low)) = hex4(after) {
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Ok((after_low, ch));
                }
            }
        }
        return Ok((rest, char::REPLACEMENT_CHARACTER));
    }
    let ch = char::from_u32(u32::from(high)).unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok((rest, ch))
}
