//! `identifier` and `node-identifier`.
//!
//! ```text
//! identifier      = (ALPHA / "_") *(ALPHA / DIGIT / "_" / "-" / ".")
//! node-identifier = [module ":"] identifier
//! ```

use std::fmt;

use super::error::SyntaxError;

/// A `[module:]name` pair borrowed from the parsed input.
///
/// `module` is a prefix in YANG-text paths and a module name in
/// JSON-normalized instance-identifiers; callers decide which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentifier<'a> {
    pub module: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> NodeIdentifier<'a> {
    pub fn new(module: Option<&'a str>, name: &'a str) -> Self {
        Self { module, name }
    }
}

impl fmt::Display for NodeIdentifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.module {
            Some(module) => write!(f, "{}:{}", module, self.name),
            None => f.write_str(self.name),
        }
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// Parse an identifier at the start of `input`, returning its length.
pub fn parse_identifier(input: &str) -> Result<usize, SyntaxError> {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(&b) if is_identifier_start(b) => {}
        _ => return Err(SyntaxError::at(input, 0)),
    }
    let len = 1 + bytes[1..].iter().take_while(|&&b| is_identifier_char(b)).count();
    Ok(len)
}

/// Check that the whole of `input` is one identifier.
pub fn is_identifier(input: &str) -> bool {
    matches!(parse_identifier(input), Ok(len) if len == input.len())
}

/// Parse a node-identifier at the start of `input`.
///
/// Returns the identifier and the number of bytes consumed.
pub fn parse_node_identifier(input: &str) -> Result<(NodeIdentifier<'_>, usize), SyntaxError> {
    let first = parse_identifier(input)?;
    if input.as_bytes().get(first) != Some(&b':') {
        return Ok((NodeIdentifier::new(None, &input[..first]), first));
    }

    let rest = &input[first + 1..];
    let second = parse_identifier(rest).map_err(|e| e.shifted(first + 1))?;
    let consumed = first + 1 + second;
    Ok((
        NodeIdentifier::new(Some(&input[..first]), &rest[..second]),
        consumed,
    ))
}

/// Number of leading whitespace bytes in `input`.
pub(crate) fn whitespace_len(input: &str) -> usize {
    input
        .as_bytes()
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count()
}

/// Split a `[prefix:]name` reference (typedef, grouping, identity, feature).
pub fn split_qualified(text: &str) -> Result<NodeIdentifier<'_>, SyntaxError> {
    let (id, consumed) = parse_node_identifier(text)?;
    if consumed != text.len() {
        return Err(SyntaxError::at(text, consumed));
    }
    Ok(id)
}
