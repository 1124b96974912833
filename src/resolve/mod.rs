//! Name resolvers.
//!
//! Every resolver answers one of three ways:
//! - `Ok(value)`: the reference is linked,
//! - [`Unresolved::Forward`]: the target may still appear (a later augment, an
//!   unexpanded uses, a type that is itself pending); retry on the next sweep,
//! - [`Unresolved::Fatal`]: the reference can never resolve; stop compiling.
//!
//! All resolvers share the sibling walk in [`walk`], which matches one parsed
//! segment against a sibling set.

mod instid;
mod leafref;
mod names;
mod nodeid;
mod walk;

pub use nodeid::{NodeIdStart, NodeIdTarget};
pub use walk::{CaseState, Siblings, WalkMode};

use crate::error::CompileError;

/// Why a reference did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// Not resolvable yet; the message is reported if it never becomes so.
    Forward(String),
    /// Never resolvable.
    Fatal(CompileError),
}

impl Unresolved {
    pub fn forward(message: impl Into<String>) -> Self {
        Unresolved::Forward(message.into())
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Unresolved::Forward(_))
    }
}

impl From<CompileError> for Unresolved {
    fn from(error: CompileError) -> Self {
        Unresolved::Fatal(error)
    }
}

pub type Resolve<T> = Result<T, Unresolved>;
