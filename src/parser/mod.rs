//! Parsers for the path languages embedded in schema statements.
//!
//! All parsers borrow from their input and report positions as byte offsets,
//! so a failure can be reported with a precise column. Multi-segment grammars
//! are exposed as cursors that yield one segment per call: the resolver asks
//! for the next segment only after matching the previous one, because which
//! sibling set to search depends on the node the previous segment found.
//!
//! ## Grammars
//!
//! ```text
//! identifier          (ALPHA / "_") *(ALPHA / DIGIT / "_" / "-" / ".")
//! node-identifier     [module ":"] identifier
//! schema-nodeid       absolute ("/a/b") or descendant ("a/b", "./a/b")
//! instance-identifier "/" node-identifier *predicate, repeated
//! path-arg            absolute or "../"-relative leafref path
//! ```

mod error;
mod identifier;
mod instid;
mod nodeid;
mod path;

pub use error::{SyntaxError, SyntaxErrorKind};
pub use identifier::{
    NodeIdentifier, is_identifier, parse_identifier, parse_node_identifier, split_qualified,
};
pub use instid::{InstanceIdCursor, Predicate, PredicateKind, PredicateMode, parse_predicate};
pub use nodeid::{NodeIdKind, ParsedNodeId, SchemaNodeIdCursor};
pub use path::{PathArgCursor, PathKeyExprCursor, PathPredicate, parse_path_predicate};

pub(crate) use identifier::whitespace_len;
