//! Modules, submodules and their import tables.

use crate::base::{FeatureId, IdentityId, ModuleId, Name, NodeId, TypedefId};

use super::deviation::Deviation;

/// Language version declared by `yang-version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum YangVersion {
    V1_0,
    #[default]
    V1_1,
}

impl YangVersion {
    /// Whether the YANG 1.1 extensions (if-feature expressions, …) are allowed.
    pub fn is_extended(self) -> bool {
        self >= YangVersion::V1_1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: ModuleId,
    pub prefix: Name,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: Name,
    /// Own prefix; a submodule carries its `belongs-to` prefix.
    pub prefix: Name,
    pub namespace: Option<Name>,
    pub version: YangVersion,
    /// Contributes to the operational tree. Only ever switched on.
    pub implemented: bool,
    /// Set once the module compiled without errors.
    pub compiled: bool,
    /// Main module of a submodule.
    pub belongs_to: Option<ModuleId>,
    pub imports: Vec<Import>,
    pub includes: Vec<ModuleId>,
    /// Top-level data nodes, rpcs, notifications and groupings.
    pub children: Vec<NodeId>,
    pub typedefs: Vec<TypedefId>,
    pub identities: Vec<IdentityId>,
    pub features: Vec<FeatureId>,
    /// Top-level `augment` nodes.
    pub augments: Vec<NodeId>,
    pub deviations: Vec<Deviation>,
}

impl Module {
    pub(crate) fn new(name: Name, prefix: Name) -> Self {
        Self {
            name,
            prefix,
            namespace: None,
            version: YangVersion::default(),
            implemented: true,
            compiled: false,
            belongs_to: None,
            imports: Vec::new(),
            includes: Vec::new(),
            children: Vec::new(),
            typedefs: Vec::new(),
            identities: Vec::new(),
            features: Vec::new(),
            augments: Vec::new(),
            deviations: Vec::new(),
        }
    }

    pub fn is_submodule(&self) -> bool {
        self.belongs_to.is_some()
    }

    /// The module imported under `prefix`, if any.
    pub fn import_by_prefix(&self, prefix: &str) -> Option<ModuleId> {
        self.imports
            .iter()
            .find(|import| import.prefix == prefix)
            .map(|import| import.module)
    }
}
