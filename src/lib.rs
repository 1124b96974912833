//! # yanglink-base
//!
//! Linking core for YANG schemas: turns an unlinked schema tree, where every
//! cross-reference is still text, into a linked graph.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! compile   → Worklist engine: uses, augments, deviations, types, identities
//!   ↓
//! resolve   → Sibling walk and name resolvers (forward vs. fatal)
//!   ↓
//! schema    → Arena-owned schema graph and its construction API
//!   ↓
//! feature   → if-feature expression compiler and evaluator
//!   ↓
//! parser    → Identifier, schema-nodeid, instance-identifier and path grammars
//!   ↓
//! base      → Primitives (arena handles, Name interning, TextRange)
//! ```
//!
//! ## Example
//!
//! ```
//! use yanglink::{Context, compile};
//!
//! let mut ctx = Context::new();
//! let m = ctx.add_module("example", "ex").unwrap();
//! let list = ctx.add_list(m, None, "server", Some("name"));
//! ctx.add_uses(m, Some(list), "named");
//! let grouping = ctx.add_grouping(m, None, "named");
//! ctx.add_leaf(m, Some(grouping), "name", "string");
//!
//! let report = compile(&mut ctx, m).unwrap();
//! assert!(report.sweeps >= 1);
//! assert_eq!(ctx.node(list).list().unwrap().keys.len(), 1);
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → feature → schema → resolve → compile)
// ============================================================================

/// Foundation types: arena handles, Name interning, TextRange
pub mod base;

/// Parsers for the path languages embedded in schema statements
pub mod parser;

/// if-feature expressions: compilation to packed opcodes and evaluation
pub mod feature;

/// The schema graph and its construction API
pub mod schema;

/// Name resolvers and the shared sibling walk
pub mod resolve;

/// The deferred-resolution compiler
pub mod compile;

/// Diagnostics reported while linking
pub mod diagnostics;

/// Errors that stop a compilation
pub mod error;

/// Compilation options
pub mod options;

// Re-export the entry points
pub use compile::{CompileReport, Compiler, XPathContextKind, XPathEvaluator, XPathValue, compile};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use error::{CompileError, Result};
pub use options::CompileOptions;
pub use schema::Context;

// Re-export foundation types
pub use base::{FeatureId, IdentityId, ModuleId, Name, NodeId, TextRange, TextSize, TypeId, TypedefId};
