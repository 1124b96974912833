//! Foundation types for the yanglink toolchain.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`NodeId`], [`ModuleId`], [`TypeId`], … - Arena handles into the schema graph
//! - [`Name`], [`Interner`] - String interning
//! - [`TextRange`], [`TextSize`] - Byte offsets into embedded path expressions
//!
//! This module has NO dependencies on other yanglink modules.

mod ids;
mod intern;

pub use ids::{FeatureId, IdentityId, ModuleId, NodeId, TypeId, TypedefId};
pub use intern::{Interner, Name};

// Re-export text-size types for convenience
pub use text_size::{self, TextRange, TextSize};
