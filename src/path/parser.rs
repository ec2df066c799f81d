//! Path Parser
//!
//! Parses the string form of a structural address.
//!
//! Grammar:
//! ```text
//! path    = "" | segment ("/" segment)*
//! segment = name "[" digits "]"
//! name    = "text" | (ALPHA | DIGIT | "-")+
//! ```
//!
//! Any segment that does not match rejects the whole string; there are no
//! partially parsed paths.

use super::types::*;
use thiserror::Error;

/// Path parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("Empty segment at position {0}")]
    EmptySegment(usize),

    #[error("Expected name at position {0}")]
    ExpectedName(usize),

    #[error("Expected '[' at position {0}")]
    ExpectedBracket(usize),

    #[error("Expected number at position {0}")]
    ExpectedNumber(usize),

    #[error("Unclosed bracket at position {0}")]
    UnclosedBracket(usize),

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// Parser state
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Parse a tag name (ASCII letters, digits, hyphens)
    fn parse_name(&mut self) -> Result<&'a str, PathParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                None | Some('/') => PathParseError::EmptySegment(start),
                Some(_) => PathParseError::ExpectedName(start),
            });
        }

        Ok(&self.input[start..self.pos])
    }

    /// Parse a sequence of digits as a nonnegative index
    fn parse_number(&mut self) -> Result<usize, PathParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(PathParseError::ExpectedNumber(start));
        }

        self.input[start..self.pos]
            .parse()
            .map_err(|_| PathParseError::ExpectedNumber(start))
    }

    /// Parse a single `name[index]` segment
    fn parse_segment(&mut self) -> Result<PathStep, PathParseError> {
        let name = self.parse_name()?;

        let bracket = self.pos;
        if !self.skip_if('[') {
            return Err(PathParseError::ExpectedBracket(bracket));
        }
        let index = self.parse_number()?;
        if !self.skip_if(']') {
            return match self.peek() {
                None => Err(PathParseError::UnclosedBracket(bracket)),
                Some(ch) => Err(PathParseError::UnexpectedChar(ch, self.pos)),
            };
        }

        if name.eq_ignore_ascii_case("text") {
            Ok(PathStep::Text { index })
        } else {
            Ok(PathStep::Element {
                tag: name.to_ascii_lowercase(),
                index,
            })
        }
    }

    /// Parse a complete path
    fn parse_path(&mut self) -> Result<NodePath, PathParseError> {
        let mut path = NodePath::new();
        if self.at_end() {
            return Ok(path);
        }

        loop {
            path.push(self.parse_segment()?);
            if self.at_end() {
                return Ok(path);
            }
            if !self.skip_if('/') {
                let ch = self.peek().unwrap_or('\0');
                return Err(PathParseError::UnexpectedChar(ch, self.pos));
            }
        }
    }
}

/// Parse a path string into a `NodePath`
pub fn parse(input: &str) -> Result<NodePath, PathParseError> {
    Parser::new(input).parse_path()
}

/// Parse a path string, discarding the error
pub fn try_parse(input: &str) -> Option<NodePath> {
    parse(input).ok()
}
