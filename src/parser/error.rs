//! Syntax errors for the embedded path languages.

use std::fmt;

use thiserror::Error;

/// What went wrong at a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A character that does not fit the grammar at this point.
    UnexpectedChar(char),
    /// The input ended where more was required.
    UnexpectedEnd,
    /// An absolute schema-nodeid where a descendant one is required, or vice versa.
    MixedNodeId,
    /// A positional predicate with a leading zero.
    LeadingZero,
    /// A quoted predicate value without its closing quote.
    UnterminatedQuote,
    /// A `[` without its matching `]`.
    UnterminatedPredicate,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar(c) => write!(f, "unexpected character '{}'", c),
            Self::UnexpectedEnd => f.write_str("unexpected end of input"),
            Self::MixedNodeId => f.write_str("mixed absolute and descendant schema-nodeid"),
            Self::LeadingZero => f.write_str("position with a leading zero"),
            Self::UnterminatedQuote => f.write_str("missing closing quote"),
            Self::UnterminatedPredicate => f.write_str("missing closing ']'"),
        }
    }
}

/// A syntax error in one of the embedded languages.
///
/// `offset` is a byte offset into the string handed to the parser that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct SyntaxError {
    pub offset: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(offset: usize, kind: SyntaxErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Error for whatever sits at `offset` in `input` (a character, or the end).
    pub fn at(input: &str, offset: usize) -> Self {
        match input.get(offset..).and_then(|rest| rest.chars().next()) {
            Some(c) => Self::new(offset, SyntaxErrorKind::UnexpectedChar(c)),
            None => Self::new(offset, SyntaxErrorKind::UnexpectedEnd),
        }
    }

    /// The same error relative to an enclosing string that starts `by` bytes earlier.
    pub fn shifted(self, by: usize) -> Self {
        Self {
            offset: self.offset + by,
            kind: self.kind,
        }
    }

    /// The offending tail of `input`, for messages.
    pub fn offending<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.offset..).unwrap_or("")
    }
}
