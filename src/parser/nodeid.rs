//! `schema-nodeid`, parsed one segment at a time.
//!
//! ```text
//! schema-nodeid            = absolute-schema-nodeid / descendant-schema-nodeid
//! absolute-schema-nodeid   = 1*("/" node-identifier)
//! descendant-schema-nodeid = ["./"] node-identifier [absolute-schema-nodeid]
//! ```
//!
//! The cursor is pausable: a resolver asks for the next segment only after the
//! previous one has been matched, because which module's siblings to search
//! depends on the node found by the previous segment.

use text_size::{TextRange, TextSize};

use super::error::{SyntaxError, SyntaxErrorKind};
use super::identifier::{NodeIdentifier, parse_node_identifier};

/// Whether a schema-nodeid starts at the module root or below a context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeIdKind {
    Absolute,
    Descendant,
}

/// One parsed path segment. Ephemeral: consumed immediately by a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNodeId<'a> {
    pub id: NodeIdentifier<'a>,
    /// Byte range of the node-identifier in the full input.
    pub range: TextRange,
    /// A `[` follows the identifier.
    pub has_predicate: bool,
}

impl<'a> ParsedNodeId<'a> {
    pub fn module(&self) -> Option<&'a str> {
        self.id.module
    }

    pub fn name(&self) -> &'a str {
        self.id.name
    }
}

pub(crate) fn text_range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

/// Pausable schema-nodeid parser.
#[derive(Debug, Clone)]
pub struct SchemaNodeIdCursor<'a> {
    input: &'a str,
    pos: usize,
    kind: Option<NodeIdKind>,
    expected: Option<NodeIdKind>,
    failed: bool,
}

impl<'a> SchemaNodeIdCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            kind: None,
            expected: None,
            failed: false,
        }
    }

    /// A cursor that rejects the other kind of schema-nodeid on the first segment.
    pub fn expecting(input: &'a str, kind: NodeIdKind) -> Self {
        Self {
            expected: Some(kind),
            ..Self::new(input)
        }
    }

    /// Absolute or descendant, known after the first segment.
    pub fn kind(&self) -> Option<NodeIdKind> {
        self.kind
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Byte offset of the next unparsed character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// The unparsed remainder.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Parse the next segment; `Ok(None)` once the input is exhausted.
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
        match self.kind {
            None => {
                let kind = if bytes.first() == Some(&b'/') {
                    self.pos += 1;
                    NodeIdKind::Absolute
                } else {
                    if self.input.starts_with("./") {
                        self.pos += 2;
                    }
                    NodeIdKind::Descendant
                };
                if self.expected.is_some_and(|expected| expected != kind) {
                    return Err(SyntaxError::new(0, SyntaxErrorKind::MixedNodeId));
                }
                self.kind = Some(kind);
            }
            Some(_) => {
                if self.is_done() {
                    return Ok(None);
                }
                if bytes[self.pos] != b'/' {
                    return Err(SyntaxError::at(self.input, self.pos));
                }
                self.pos += 1;
            }
        }

        let start = self.pos;
        let (id, consumed) =
            parse_node_identifier(&self.input[start..]).map_err(|e| e.shifted(start))?;
        self.pos += consumed;

        let has_predicate = bytes.get(self.pos) == Some(&b'[');
        Ok(Some(ParsedNodeId {
            id,
            range: text_range(start, self.pos),
            has_predicate,
        }))
    }

    /// Skip a `[...]` predicate that follows the current segment.
    ///
    /// Leafref targets written as schema-nodeids may carry predicates that do
    /// not influence which schema node is meant.
    pub fn skip_predicates(&mut self) -> Result<(), SyntaxError> {
        while self.input.as_bytes().get(self.pos) == Some(&b'[') {
            match self.input[self.pos..].find(']') {
                Some(end) => self.pos += end + 1,
                None => {
                    self.failed = true;
                    return Err(SyntaxError::new(
                        self.pos,
                        SyntaxErrorKind::UnterminatedPredicate,
                    ));
                }
            }
        }
        Ok(())
    }
}

impl<'a> Iterator for SchemaNodeIdCursor<'a> {
    type Item = Result<ParsedNodeId<'a>, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_segment().transpose()
    }
}
