//! Typedefs, identities and features.

use crate::base::{FeatureId, IdentityId, ModuleId, Name, NodeId, TypeId};
use crate::feature::IfFeatureExpr;

use super::node::Status;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typedef {
    pub name: Name,
    pub module: ModuleId,
    /// Enclosing node for scoped typedefs; `None` at module level.
    pub parent: Option<NodeId>,
    pub ty: TypeId,
    pub default: Option<String>,
    pub units: Option<String>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: Name,
    pub module: ModuleId,
    /// `base` arguments as written.
    pub base_names: Vec<Name>,
    /// Resolved bases, parallel to `base_names`.
    pub bases: Vec<Option<IdentityId>>,
    /// Every identity derived from this one, directly or transitively.
    pub derived: Vec<IdentityId>,
    pub if_features: Vec<IfFeatureExpr>,
    pub status: Status,
}

impl Identity {
    /// Number of bases not yet resolved.
    pub fn pending_bases(&self) -> usize {
        self.bases.iter().filter(|base| base.is_none()).count()
    }

    /// Base names that are still unresolved.
    pub fn pending_base_names(&self) -> impl Iterator<Item = &Name> {
        self.base_names
            .iter()
            .zip(&self.bases)
            .filter(|(_, base)| base.is_none())
            .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: Name,
    pub module: ModuleId,
    pub enabled: bool,
    pub if_features: Vec<IfFeatureExpr>,
    pub status: Status,
}

/// Anything that can carry `if-feature` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureOwner {
    Node(NodeId),
    Feature(FeatureId),
    Identity(IdentityId),
}
