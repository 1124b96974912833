//! The compilation context: owner of every arena in the schema graph.
//!
//! Front-ends emit the unlinked tree through the `add_*` construction
//! methods; cross-references are stored as text and linked later by the
//! compiler.

use rustc_hash::FxHashMap;

use crate::base::{FeatureId, IdentityId, Interner, ModuleId, Name, NodeId, TypeId, TypedefId};
use crate::error::{CompileError, Result};
use crate::feature::{self, FeatureSource, IfFeatureExpr};

use super::defs::{Feature, FeatureOwner, Identity, Typedef};
use super::module::{Import, Module};
use super::node::{NodeData, NodeKind, Refine, SchemaNode, Status};
use super::types::{TypeOwner, TypeSpec};

#[derive(Debug, Default)]
pub struct Context {
    pub(crate) interner: Interner,
    pub(crate) modules: Vec<Module>,
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) types: Vec<TypeSpec>,
    pub(crate) typedefs: Vec<Typedef>,
    pub(crate) identities: Vec<Identity>,
    pub(crate) features: Vec<Feature>,
    module_names: FxHashMap<Name, ModuleId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    // ------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------

    pub fn add_module(&mut self, name: &str, prefix: &str) -> Result<ModuleId> {
        if self.module_names.contains_key(name) {
            return Err(CompileError::duplicate("module", name));
        }
        let name = self.intern(name);
        let prefix = self.intern(prefix);
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(Module::new(name.clone(), prefix));
        self.module_names.insert(name, id);
        Ok(id)
    }

    /// Add a submodule of `main` and include it there.
    pub fn add_submodule(&mut self, name: &str, main: ModuleId) -> Result<ModuleId> {
        let prefix = self.module(main).prefix.clone();
        let id = self.add_module(name, &prefix)?;
        let version = self.module(main).version;
        let implemented = self.module(main).implemented;
        let submodule = self.module_mut(id);
        submodule.belongs_to = Some(main);
        submodule.version = version;
        submodule.implemented = implemented;
        self.module_mut(main).includes.push(id);
        Ok(id)
    }

    pub fn add_import(&mut self, module: ModuleId, imported: ModuleId, prefix: &str) {
        let prefix = self.intern(prefix);
        self.module_mut(module).imports.push(Import {
            module: imported,
            prefix,
        });
    }

    pub fn add_include(&mut self, module: ModuleId, submodule: ModuleId) {
        let includes = &mut self.module_mut(module).includes;
        if !includes.contains(&submodule) {
            includes.push(submodule);
        }
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.module_names.get(name).copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(index, module)| (ModuleId::from_index(index), module))
    }

    /// The module itself, or the main module of a submodule.
    pub fn main_module(&self, id: ModuleId) -> ModuleId {
        self.module(id).belongs_to.unwrap_or(id)
    }

    /// The module and every submodule it includes, transitively.
    pub fn module_family(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut family = vec![self.main_module(id)];
        let mut index = 0;
        while index < family.len() {
            for &include in &self.module(family[index]).includes {
                if !family.contains(&include) {
                    family.push(include);
                }
            }
            index += 1;
        }
        family
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node under `parent`, or at the top of `module`.
    ///
    /// Augments are attached to the module's (or the parent `uses`') augment
    /// list instead of the child list.
    pub fn add_node(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        data: NodeData,
    ) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        let kind = data.kind();
        if let Some(ty) = data.type_id() {
            self.types[ty.index()].owner = TypeOwner::Node(id);
        }
        let name = self.intern(name);
        self.nodes.push(SchemaNode::new(name, module, parent, data));

        match (parent, kind) {
            (Some(parent), NodeKind::Augment) => {
                if let NodeData::Uses(uses) = &mut self.node_mut(parent).data {
                    uses.augments.push(id);
                } else {
                    self.node_mut(parent).children.push(id);
                }
            }
            (Some(parent), _) => self.node_mut(parent).children.push(id),
            (None, NodeKind::Augment) => self.module_mut(module).augments.push(id),
            (None, _) => self.module_mut(module).children.push(id),
        }
        id
    }

    pub fn add_container(&mut self, module: ModuleId, parent: Option<NodeId>, name: &str) -> NodeId {
        self.add_node(module, parent, name, NodeData::container())
    }

    pub fn add_list(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        keys: Option<&str>,
    ) -> NodeId {
        let keys = keys.map(|keys| self.intern(keys));
        self.add_node(module, parent, name, NodeData::list(keys))
    }

    /// Add a leaf with a fresh type named `type_name`.
    pub fn add_leaf(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        type_name: &str,
    ) -> NodeId {
        let ty = self.new_type(module, type_name);
        self.add_node(module, parent, name, NodeData::leaf(ty))
    }

    pub fn add_leaf_list(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        type_name: &str,
    ) -> NodeId {
        let ty = self.new_type(module, type_name);
        self.add_node(module, parent, name, NodeData::leaf_list(ty))
    }

    pub fn add_choice(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        default: Option<&str>,
    ) -> NodeId {
        let default = default.map(|default| self.intern(default));
        self.add_node(module, parent, name, NodeData::choice(default))
    }

    pub fn add_case(&mut self, module: ModuleId, parent: NodeId, name: &str) -> NodeId {
        self.add_node(module, Some(parent), name, NodeData::Case)
    }

    pub fn add_grouping(&mut self, module: ModuleId, parent: Option<NodeId>, name: &str) -> NodeId {
        self.add_node(module, parent, name, NodeData::grouping())
    }

    pub fn add_uses(&mut self, module: ModuleId, parent: Option<NodeId>, grouping: &str) -> NodeId {
        let grouping = self.intern(grouping);
        let name = grouping.clone();
        self.add_node(module, parent, &name, NodeData::uses(grouping))
    }

    /// Add an augment; `uses` is the enclosing uses for a relative target.
    pub fn add_augment(&mut self, module: ModuleId, uses: Option<NodeId>, target: &str) -> NodeId {
        let target = self.intern(target);
        let name = target.clone();
        self.add_node(module, uses, &name, NodeData::augment(target))
    }

    /// Add a `refine` to a `uses`; `None` if `uses` is not a uses node.
    pub fn add_refine(&mut self, uses: NodeId, target: &str) -> Option<&mut Refine> {
        let target = self.intern(target);
        match &mut self.node_mut(uses).data {
            NodeData::Uses(data) => {
                data.refines.push(Refine::new(target));
                data.refines.last_mut()
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Types and definitions
    // ------------------------------------------------------------------

    /// A detached type; [`Context::add_node`] attaches leaf types.
    pub fn new_type(&mut self, module: ModuleId, name: &str) -> TypeId {
        let name = self.intern(name);
        let id = TypeId::from_index(self.types.len());
        self.types
            .push(TypeSpec::new(name, module, TypeOwner::Deviation(module)));
        id
    }

    pub fn add_union_member(&mut self, union: TypeId, name: &str) -> TypeId {
        let module = self.type_spec(union).module;
        let member = self.new_type(module, name);
        self.type_mut(member).owner = TypeOwner::Union(union);
        self.type_mut(union).restrictions.members.push(member);
        member
    }

    pub fn type_spec(&self, id: TypeId) -> &TypeSpec {
        &self.types[id.index()]
    }

    pub fn type_mut(&mut self, id: TypeId) -> &mut TypeSpec {
        &mut self.types[id.index()]
    }

    pub fn add_typedef(
        &mut self,
        module: ModuleId,
        parent: Option<NodeId>,
        name: &str,
        type_name: &str,
    ) -> TypedefId {
        let id = TypedefId::from_index(self.typedefs.len());
        let ty = self.new_type(module, type_name);
        self.type_mut(ty).owner = TypeOwner::Typedef(id);
        let name = self.intern(name);
        self.typedefs.push(Typedef {
            name,
            module,
            parent,
            ty,
            default: None,
            units: None,
            status: Status::Current,
        });
        match parent {
            Some(parent) => self.node_mut(parent).typedefs.push(id),
            None => self.module_mut(module).typedefs.push(id),
        }
        id
    }

    pub fn typedef(&self, id: TypedefId) -> &Typedef {
        &self.typedefs[id.index()]
    }

    pub fn typedef_mut(&mut self, id: TypedefId) -> &mut Typedef {
        &mut self.typedefs[id.index()]
    }

    pub fn add_identity(&mut self, module: ModuleId, name: &str, bases: &[&str]) -> IdentityId {
        let id = IdentityId::from_index(self.identities.len());
        let name = self.intern(name);
        let base_names: Vec<Name> = bases.iter().map(|base| self.intern(base)).collect();
        self.identities.push(Identity {
            name,
            module,
            bases: vec![None; base_names.len()],
            base_names,
            derived: Vec::new(),
            if_features: Vec::new(),
            status: Status::Current,
        });
        self.module_mut(module).identities.push(id);
        id
    }

    pub fn identity(&self, id: IdentityId) -> &Identity {
        &self.identities[id.index()]
    }

    pub(crate) fn identity_mut(&mut self, id: IdentityId) -> &mut Identity {
        &mut self.identities[id.index()]
    }

    /// Whether `derived` is `base` or derives from it.
    pub fn identity_derives_from(&self, derived: IdentityId, base: IdentityId) -> bool {
        derived == base || self.identity(base).derived.contains(&derived)
    }

    pub fn add_feature(&mut self, module: ModuleId, name: &str) -> FeatureId {
        let id = FeatureId::from_index(self.features.len());
        let name = self.intern(name);
        self.features.push(Feature {
            name,
            module,
            enabled: false,
            if_features: Vec::new(),
            status: Status::Current,
        });
        self.module_mut(module).features.push(id);
        id
    }

    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.index()]
    }

    /// Attach an `if-feature` argument; it is compiled at registration.
    pub fn add_if_feature(&mut self, owner: FeatureOwner, text: &str) {
        let expr = IfFeatureExpr::new(self.intern(text));
        self.if_features_mut(owner).push(expr);
    }

    pub fn if_features(&self, owner: FeatureOwner) -> &[IfFeatureExpr] {
        match owner {
            FeatureOwner::Node(id) => &self.node(id).if_features,
            FeatureOwner::Feature(id) => &self.feature(id).if_features,
            FeatureOwner::Identity(id) => &self.identity(id).if_features,
        }
    }

    pub(crate) fn if_features_mut(&mut self, owner: FeatureOwner) -> &mut Vec<IfFeatureExpr> {
        match owner {
            FeatureOwner::Node(id) => &mut self.node_mut(id).if_features,
            FeatureOwner::Feature(id) => &mut self.features[id.index()].if_features,
            FeatureOwner::Identity(id) => &mut self.identity_mut(id).if_features,
        }
    }

    // ------------------------------------------------------------------
    // Feature switches
    // ------------------------------------------------------------------

    fn set_feature(&mut self, module: ModuleId, name: &str, enabled: bool) -> Result<()> {
        let found = self
            .module_family(module)
            .into_iter()
            .flat_map(|m| self.module(m).features.clone())
            .find(|&id| self.feature(id).name == name);
        match found {
            Some(id) => {
                self.features[id.index()].enabled = enabled;
                tracing::debug!(feature = name, enabled, "feature switched");
                Ok(())
            }
            None => Err(CompileError::not_found("feature", name)),
        }
    }

    pub fn enable_feature(&mut self, module: ModuleId, name: &str) -> Result<()> {
        self.set_feature(module, name, true)
    }

    pub fn disable_feature(&mut self, module: ModuleId, name: &str) -> Result<()> {
        self.set_feature(module, name, false)
    }

    pub fn enable_all_features(&mut self, module: ModuleId) {
        for m in self.module_family(module) {
            for id in self.module(m).features.clone() {
                self.features[id.index()].enabled = true;
            }
        }
    }

    /// Whether a feature is on, taking its own `if-feature`s into account.
    pub fn is_feature_enabled(&self, id: FeatureId) -> bool {
        feature::feature_value(id, self).is_true()
    }

    /// Whether every `if-feature` on the node and its ancestors holds.
    pub fn is_node_enabled(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if !self
                .node(node)
                .if_features
                .iter()
                .all(|expr| feature::evaluate(expr, self))
            {
                return false;
            }
            current = self.node(node).parent;
        }
        true
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    /// Parent in the schema tree: an augment's child answers the augment target.
    pub fn schema_parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        match self.node(parent).augment() {
            Some(augment) => augment.target,
            None => Some(parent),
        }
    }

    /// Give the short-hand case of `node` an explicit `case` node of the same
    /// name, so it can be augmented. Returns the case.
    pub fn make_case_explicit(&mut self, node: NodeId) -> NodeId {
        if let Some(parent) = self.node(node).parent {
            if self.node(parent).kind() == NodeKind::Case {
                return parent;
            }
        }
        let case = NodeId::from_index(self.nodes.len());
        let n = self.node(node);
        let parent = n.parent;
        let mut wrapper = SchemaNode::new(n.name.clone(), n.module, parent, NodeData::Case);
        wrapper.line = n.line;
        wrapper.children.push(node);
        self.nodes.push(wrapper);
        self.node_mut(node).parent = Some(case);

        let spliced_into = parent.and_then(|p| self.node(p).augment().and_then(|a| a.target));
        for holder in parent.into_iter().chain(spliced_into) {
            for child in &mut self.node_mut(holder).children {
                if *child == node {
                    *child = case;
                }
            }
        }
        case
    }

    /// Parent in the data tree: choices, cases and uses are skipped.
    pub fn data_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut parent = self.schema_parent(id);
        while let Some(p) = parent {
            match self.node(p).kind() {
                NodeKind::Choice | NodeKind::Case | NodeKind::Uses => {
                    parent = self.schema_parent(p);
                }
                _ => return Some(p),
            }
        }
        None
    }

    /// The nearest grouping the node is defined in, if any.
    pub fn enclosing_grouping(&self, id: NodeId) -> Option<NodeId> {
        let mut parent = self.node(id).parent;
        while let Some(p) = parent {
            if self.node(p).kind() == NodeKind::Grouping {
                return Some(p);
            }
            parent = self.node(p).parent;
        }
        None
    }

    /// Effective `config`: explicit value or inherited; false under
    /// operations and notifications.
    pub fn is_config(&self, id: NodeId) -> bool {
        let mut explicit = None;
        let mut current = Some(id);
        while let Some(node) = current {
            let n = self.node(node);
            if n.kind().is_operation() {
                return false;
            }
            if explicit.is_none() {
                explicit = n.config;
            }
            current = self.schema_parent(node);
        }
        explicit.unwrap_or(true)
    }

    /// Effective `status`, inherited from the closest ancestor that sets one.
    pub fn effective_status(&self, id: NodeId) -> Status {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(status) = self.node(node).status {
                return status;
            }
            current = self.schema_parent(node);
        }
        Status::Current
    }
}

impl FeatureSource for Context {
    fn is_enabled(&self, feature: FeatureId) -> bool {
        self.feature(feature).enabled
    }

    fn if_features(&self, feature: FeatureId) -> &[IfFeatureExpr] {
        &self.feature(feature).if_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_module_name() {
        let mut ctx = Context::new();
        ctx.add_module("a", "a").unwrap();
        assert!(matches!(
            ctx.add_module("a", "x"),
            Err(CompileError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_add_node_links_parent() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let c = ctx.add_container(m, None, "c");
        let l = ctx.add_leaf(m, Some(c), "l", "string");
        assert_eq!(ctx.module(m).children, vec![c]);
        assert_eq!(ctx.node(c).children, vec![l]);
        let ty = ctx.node(l).type_id().unwrap();
        assert_eq!(ctx.type_spec(ty).owner, TypeOwner::Node(l));
    }

    #[test]
    fn test_augments_go_to_augment_lists() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let aug = ctx.add_augment(m, None, "/x:y");
        let g = ctx.add_grouping(m, None, "g");
        let uses = ctx.add_uses(m, None, "g");
        let nested = ctx.add_augment(m, Some(uses), "c");
        assert_eq!(ctx.module(m).augments, vec![aug]);
        assert_eq!(ctx.module(m).children, vec![g, uses]);
        assert_eq!(ctx.node(uses).uses().unwrap().augments, vec![nested]);
    }

    #[test]
    fn test_config_inheritance() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let c = ctx.add_container(m, None, "c");
        let inner = ctx.add_container(m, Some(c), "inner");
        ctx.node_mut(c).config = Some(false);
        assert!(!ctx.is_config(inner));

        let rpc = ctx.add_node(m, None, "op", NodeData::Rpc);
        let input = ctx.add_node(m, Some(rpc), "input", NodeData::Input);
        let leaf = ctx.add_leaf(m, Some(input), "x", "string");
        ctx.node_mut(leaf).config = Some(true);
        assert!(!ctx.is_config(leaf));
    }

    #[test]
    fn test_feature_switches() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let f = ctx.add_feature(m, "f");
        assert!(!ctx.is_feature_enabled(f));
        ctx.enable_feature(m, "f").unwrap();
        assert!(ctx.is_feature_enabled(f));
        assert!(ctx.enable_feature(m, "nope").is_err());
    }
}
