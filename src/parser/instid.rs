//! `instance-identifier` and its predicates, JSON-normalized (module names
//! instead of prefixes).
//!
//! ```text
//! instance-identifier = 1*("/" (node-identifier *predicate))
//! predicate           = "[" *WSP (predicate-expr / pos) *WSP "]"
//! predicate-expr      = (node-identifier / ".") *WSP "=" *WSP
//!                       ((DQUOTE string DQUOTE) / (SQUOTE string SQUOTE))
//! pos                 = non-negative-integer-value
//! ```

use text_size::TextRange;

use super::error::{SyntaxError, SyntaxErrorKind};
use super::identifier::{NodeIdentifier, parse_node_identifier, whitespace_len};
use super::nodeid::{ParsedNodeId, text_range};

/// Which predicate forms are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredicateMode {
    /// Data instance predicates: every key predicate carries a value.
    #[default]
    Data,
    /// Schema predicates: `[key]` without a value is allowed as well.
    Schema,
}

/// The content of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind<'a> {
    /// `[3]` - a positional index.
    Position(u64),
    /// `[.='v']` - a leaf-list value.
    Value(&'a str),
    /// `[key='v']`, or `[key]` in schema mode.
    Key {
        key: NodeIdentifier<'a>,
        value: Option<&'a str>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate<'a> {
    pub kind: PredicateKind<'a>,
    pub range: TextRange,
}

fn parse_quoted(input: &str, pos: usize) -> Result<(&str, usize), SyntaxError> {
    let bytes = input.as_bytes();
    let quote = match bytes.get(pos) {
        Some(&q @ (b'\'' | b'"')) => q as char,
        _ => return Err(SyntaxError::at(input, pos)),
    };
    let body = pos + 1;
    match input[body..].find(quote) {
        Some(len) => Ok((&input[body..body + len], body + len + 1)),
        None => Err(SyntaxError::new(pos, SyntaxErrorKind::UnterminatedQuote)),
    }
}

/// Parse one predicate at the start of `input`.
pub fn parse_predicate(
    input: &str,
    mode: PredicateMode,
) -> Result<(Predicate<'_>, usize), SyntaxError> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'[') {
        return Err(SyntaxError::at(input, 0));
    }
    let mut pos = 1;
    pos += whitespace_len(&input[pos..]);

    let kind = match bytes.get(pos) {
        Some(b) if b.is_ascii_digit() => {
            let start = pos;
            let digits = bytes[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
            if bytes[start] == b'0' && digits > 1 {
                return Err(SyntaxError::new(start, SyntaxErrorKind::LeadingZero));
            }
            pos += digits;
            let value = input[start..pos]
                .parse::<u64>()
                .map_err(|_| SyntaxError::at(input, start))?;
            PredicateKind::Position(value)
        }
        Some(b'.') => {
            pos += 1;
            pos += whitespace_len(&input[pos..]);
            if bytes.get(pos) != Some(&b'=') {
                return Err(SyntaxError::at(input, pos));
            }
            pos += 1;
            pos += whitespace_len(&input[pos..]);
            let (value, end) = parse_quoted(input, pos)?;
            pos = end;
            PredicateKind::Value(value)
        }
        _ => {
            let (key, consumed) =
                parse_node_identifier(&input[pos..]).map_err(|e| e.shifted(pos))?;
            pos += consumed;
            pos += whitespace_len(&input[pos..]);
            if bytes.get(pos) == Some(&b'=') {
                pos += 1;
                pos += whitespace_len(&input[pos..]);
                let (value, end) = parse_quoted(input, pos)?;
                pos = end;
                PredicateKind::Key {
                    key,
                    value: Some(value),
                }
            } else if mode == PredicateMode::Schema {
                PredicateKind::Key { key, value: None }
            } else {
                return Err(SyntaxError::at(input, pos));
            }
        }
    };

    pos += whitespace_len(&input[pos..]);
    match bytes.get(pos) {
        Some(b']') => pos += 1,
        None => {
            return Err(SyntaxError::new(
                pos,
                SyntaxErrorKind::UnterminatedPredicate,
            ));
        }
        Some(_) => return Err(SyntaxError::at(input, pos)),
    }

    Ok((
        Predicate {
            kind,
            range: text_range(0, pos),
        },
        pos,
    ))
}

/// Pausable instance-identifier parser.
#[derive(Debug, Clone)]
pub struct InstanceIdCursor<'a> {
    input: &'a str,
    pos: usize,
    mode: PredicateMode,
    failed: bool,
}

impl<'a> InstanceIdCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_mode(input, PredicateMode::Data)
    }

    pub fn with_mode(input: &'a str, mode: PredicateMode) -> Self {
        Self {
            input,
            pos: 0,
            mode,
            failed: false,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn fail<T>(&mut self, err: SyntaxError) -> Result<T, SyntaxError> {
        self.failed = true;
        Err(err)
    }

    /// Parse the next `/node-identifier`; `Ok(None)` at the end.
    pub fn next_segment(&mut self) -> Result<Option<ParsedNodeId<'a>>, SyntaxError> {
        if self.failed {
            return Ok(None);
        }
        let bytes = self.input.as_bytes();
        if self.pos > 0 && self.is_done() {
            return Ok(None);
        }
        if bytes.get(self.pos) != Some(&b'/') {
            return self.fail(SyntaxError::at(self.input, self.pos));
        }
        self.pos += 1;

        let start = self.pos;
        let (id, consumed) = match parse_node_identifier(&self.input[start..]) {
            Ok(parsed) => parsed,
            Err(e) => return self.fail(e.shifted(start)),
        };
        self.pos += consumed;

        let has_predicate = match bytes.get(self.pos) {
            None | Some(b'/') => false,
            Some(b'[') => true,
            Some(_) => return self.fail(SyntaxError::at(self.input, self.pos)),
        };
        Ok(Some(ParsedNodeId {
            id,
            range: text_range(start, self.pos),
            has_predicate,
        }))
    }

    /// Parse one predicate if one follows the current position.
    pub fn next_predicate(&mut self) -> Result<Option<Predicate<'a>>, SyntaxError> {
        if self.failed || self.input.as_bytes().get(self.pos) != Some(&b'[') {
            return Ok(None);
        }
        let start = self.pos;
        match parse_predicate(&self.input[start..], self.mode) {
            Ok((mut predicate, consumed)) => {
                let by = text_size::TextSize::from(start as u32);
                predicate.range =
                    TextRange::new(predicate.range.start() + by, predicate.range.end() + by);
                self.pos += consumed;
                match self.input.as_bytes().get(self.pos) {
                    None | Some(b'/') | Some(b'[') => Ok(Some(predicate)),
                    Some(_) => self.fail(SyntaxError::at(self.input, self.pos)),
                }
            }
            Err(e) => self.fail(e.shifted(start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[1]", PredicateKind::Position(1))]
    #[case("[ 12 ]", PredicateKind::Position(12))]
    #[case("[.='eth0']", PredicateKind::Value("eth0"))]
    #[case("[. = \"a b\"]", PredicateKind::Value("a b"))]
    fn test_simple_predicates(#[case] input: &str, #[case] expected: PredicateKind<'_>) {
        let (predicate, consumed) = parse_predicate(input, PredicateMode::Data).unwrap();
        assert_eq!(predicate.kind, expected);
        assert_eq!(consumed, input.len());
    }

    #[test]
    fn test_key_predicate() {
        let (predicate, _) = parse_predicate("[m:name='x']", PredicateMode::Data).unwrap();
        match predicate.kind {
            PredicateKind::Key { key, value } => {
                assert_eq!(key.to_string(), "m:name");
                assert_eq!(value, Some("x"));
            }
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_key_without_value_only_in_schema_mode() {
        assert!(parse_predicate("[name]", PredicateMode::Data).is_err());
        let (predicate, _) = parse_predicate("[name]", PredicateMode::Schema).unwrap();
        assert!(matches!(
            predicate.kind,
            PredicateKind::Key { value: None, .. }
        ));
    }

    #[test]
    fn test_leading_zero_position() {
        let err = parse_predicate("[01]", PredicateMode::Data).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::LeadingZero);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_predicate("[k='abc]", PredicateMode::Data).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_instance_identifier_walk() {
        let mut cursor = InstanceIdCursor::new("/mod:a/b[c='1'][d='2']/e");
        assert_eq!(cursor.next_segment().unwrap().unwrap().id.to_string(), "mod:a");
        let b = cursor.next_segment().unwrap().unwrap();
        assert!(b.has_predicate);
        assert!(cursor.next_predicate().unwrap().is_some());
        assert!(cursor.next_predicate().unwrap().is_some());
        assert!(cursor.next_predicate().unwrap().is_none());
        assert_eq!(cursor.next_segment().unwrap().unwrap().name(), "e");
        assert!(cursor.next_segment().unwrap().is_none());
    }

    #[test]
    fn test_instance_identifier_must_be_absolute() {
        let err = InstanceIdCursor::new("a/b").next_segment().unwrap_err();
        assert_eq!(err.offset, 0);
    }
}
