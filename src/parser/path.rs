//! Leafref `path-arg`, `path-predicate` and `path-key-expr`.
//!
//! ```text
//! path-arg           = absolute-path / relative-path
//! absolute-path      = 1*("/" (node-identifier *path-predicate))
//! relative-path      = 1*(".." "/") descendant-path
//! descendant-path    = node-identifier [*path-predicate absolute-path]
//! path-predicate     = "[" *WSP path-equality-expr *WSP "]"
//! path-equality-expr = node-identifier *WSP "=" *WSP path-key-expr
//! path-key-expr      = current-function-invocation *WSP "/" *WSP rel-path-keyexpr
//! rel-path-keyexpr   = 1*(".." *WSP "/" *WSP) *(node-identifier *WSP "/" *WSP) node-identifier
//! ```

use text_size::TextRange;

use super::error::{SyntaxError, SyntaxErrorKind};
use super::identifier::{NodeIdentifier, parse_node_identifier, whitespace_len};
use super::nodeid::{ParsedNodeId, text_range};

/// Pausable leafref path parser.
#[derive(Debug, Clone)]
pub struct PathArgCursor<'a> {
    input: &'a str,
    pos: usize,
    /// `None` before the first segment, `Some(0)` for an absolute path.
    parent_times: Option<usize>,
    failed: bool,
}

impl<'a> PathArgCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            parent_times: None,
            failed: false,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Known after the first segment.
    pub fn is_absolute(&self) -> Option<bool> {
        self.parent_times.map(|times| times == 0)
    }

    /// Number of leading `..` steps (0 for absolute paths).
    pub fn parent_times(&self) -> usize {
        self.parent_times.unwrap_or(0)
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Parse the next `/node-identifier`; `Ok(None)` at the end.
    ///
    /// Any predicates after the previous segment must have been consumed with
    /// [`Self::next_predicate`] first.
    pub fn next_segment(&mut self) -> Result<Option<ParsedNodeId<'a>>, SyntaxError> {
        if self.failed {
            return Ok(None);
        }
        let result = self.parse_segment();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn parse_segment(&mut self) -> Result<Option<ParsedNodeId<'a>>, SyntaxError> {
        let bytes = self.input.as_bytes();
        if self.parent_times.is_none() {
            let mut times = 0;
            if self.input.starts_with("..") {
                times = 1;
                self.pos = 2;
                while self.input[self.pos..].starts_with("/..") {
                    times += 1;
                    self.pos += 3;
                }
            }
            self.parent_times = Some(times);
        } else if self.is_done() {
            return Ok(None);
        }

        if bytes.get(self.pos) != Some(&b'/') {
            return Err(SyntaxError::at(self.input, self.pos));
        }
        self.pos += 1;

        let start = self.pos;
        let (id, consumed) =
            parse_node_identifier(&self.input[start..]).map_err(|e| e.shifted(start))?;
        self.pos += consumed;

        let has_predicate = match bytes.get(self.pos) {
            None | Some(b'/') => false,
            Some(b'[') => true,
            Some(_) => return Err(SyntaxError::at(self.input, self.pos)),
        };
        Ok(Some(ParsedNodeId {
            id,
            range: text_range(start, self.pos),
            has_predicate,
        }))
    }

    /// Parse one `[key = current()/...]` predicate if one follows.
    pub fn next_predicate(&mut self) -> Result<Option<PathPredicate<'a>>, SyntaxError> {
        if self.failed || self.input.as_bytes().get(self.pos) != Some(&b'[') {
            return Ok(None);
        }
        let start = self.pos;
        match parse_path_predicate(&self.input[start..]) {
            Ok((mut predicate, consumed)) => {
                predicate.shift(start);
                self.pos += consumed;
                match self.input.as_bytes().get(self.pos) {
                    None | Some(b'/') | Some(b'[') => Ok(Some(predicate)),
                    Some(_) => {
                        self.failed = true;
                        Err(SyntaxError::at(self.input, self.pos))
                    }
                }
            }
            Err(e) => {
                self.failed = true;
                Err(e.shifted(start))
            }
        }
    }
}

/// One `[key = path-key-expr]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPredicate<'a> {
    /// The list key compared by the predicate.
    pub key: NodeIdentifier<'a>,
    /// Trimmed `path-key-expr` text.
    pub key_expr: &'a str,
    /// Range of `key_expr` in the enclosing input.
    pub key_expr_range: TextRange,
    /// Range of the whole predicate including brackets.
    pub range: TextRange,
}

impl PathPredicate<'_> {
    fn shift(&mut self, by: usize) {
        let by = text_size::TextSize::from(by as u32);
        let shift = |range: TextRange| TextRange::new(range.start() + by, range.end() + by);
        self.key_expr_range = shift(self.key_expr_range);
        self.range = shift(self.range);
    }
}

/// Parse a single path-predicate at the start of `input`.
pub fn parse_path_predicate(input: &str) -> Result<(PathPredicate<'_>, usize), SyntaxError> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'[') {
        return Err(SyntaxError::at(input, 0));
    }
    let mut pos = 1;
    pos += whitespace_len(&input[pos..]);

    let (key, consumed) = parse_node_identifier(&input[pos..]).map_err(|e| e.shifted(pos))?;
    pos += consumed;
    pos += whitespace_len(&input[pos..]);

    if bytes.get(pos) != Some(&b'=') {
        return Err(SyntaxError::at(input, pos));
    }
    pos += 1;
    pos += whitespace_len(&input[pos..]);

    let Some(close) = input[pos..].find(']') else {
        return Err(SyntaxError::new(
            input.len(),
            SyntaxErrorKind::UnterminatedPredicate,
        ));
    };
    let raw = &input[pos..pos + close];
    let key_expr = raw.trim_end();
    if key_expr.is_empty() {
        return Err(SyntaxError::at(input, pos));
    }
    let key_expr_range = text_range(pos, pos + key_expr.len());
    pos += close + 1;

    Ok((
        PathPredicate {
            key,
            key_expr,
            key_expr_range,
            range: text_range(0, pos),
        },
        pos,
    ))
}

/// Pausable `path-key-expr` parser.
///
/// The first call consumes `current()`, every `..` and the first
/// node-identifier; each later call consumes one `/node-identifier`.
#[derive(Debug, Clone)]
pub struct PathKeyExprCursor<'a> {
    input: &'a str,
    pos: usize,
    parent_times: Option<usize>,
    failed: bool,
}

impl<'a> PathKeyExprCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            parent_times: None,
            failed: false,
        }
    }

    /// Number of `..` steps after `current()`.
    pub fn parent_times(&self) -> usize {
        self.parent_times.unwrap_or(0)
    }

    pub fn next_segment(&mut self) -> Result<Option<ParsedNodeId<'a>>, SyntaxError> {
        if self.failed {
            return Ok(None);
        }
        let result = self.parse_segment();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn skip_ws(&mut self) {
        self.pos += whitespace_len(&self.input[self.pos..]);
    }

    fn expect(&mut self, token: &str) -> Result<(), SyntaxError> {
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(SyntaxError::at(self.input, self.pos))
        }
    }

    fn parse_segment(&mut self) -> Result<Option<ParsedNodeId<'a>>, SyntaxError> {
        if self.parent_times.is_none() {
            self.expect("current()")?;
            self.skip_ws();
            self.expect("/")?;
            self.skip_ws();
            self.expect("..")?;
            let mut times = 1;
            loop {
                self.skip_ws();
                self.expect("/")?;
                self.skip_ws();
                if self.input[self.pos..].starts_with("..") {
                    self.pos += 2;
                    times += 1;
                } else {
                    break;
                }
            }
            self.parent_times = Some(times);
        } else {
            self.skip_ws();
            if self.is_done() {
                return Ok(None);
            }
            self.expect("/")?;
            self.skip_ws();
        }

        let start = self.pos;
        let (id, consumed) =
            parse_node_identifier(&self.input[start..]).map_err(|e| e.shifted(start))?;
        self.pos += consumed;
        Ok(Some(ParsedNodeId {
            id,
            range: text_range(start, self.pos),
            has_predicate: false,
        }))
    }

    pub fn is_done(&self) -> bool {
        self.input[self.pos..].trim_start().is_empty()
    }
}
