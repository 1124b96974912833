//! Registration: one work item per reference that is still text.

use crate::base::{ModuleId, Name, NodeId, TypeId, TypedefId};
use crate::error::{CompileError, Result};
use crate::feature;
use crate::schema::{BaseType, Context, FeatureOwner, NodeKind};

use super::unres::{AddOutcome, DefaultOwner, WorkKind};
use super::Compiler;

/// Every node below `roots`, roots included, in document order. Augments
/// written inside a `uses` are part of its subtree.
pub(crate) fn subtree(ctx: &Context, roots: &[NodeId]) -> Vec<NodeId> {
    let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
    let mut nodes = Vec::new();
    while let Some(id) = stack.pop() {
        nodes.push(id);
        let node = ctx.node(id);
        if let Some(uses) = node.uses() {
            stack.extend(uses.augments.iter().rev().copied());
        }
        stack.extend(node.children.iter().rev().copied());
    }
    nodes
}

impl Compiler<'_> {
    /// Queue everything `module` (and its submodules) still has to link.
    ///
    /// Imported modules contribute their definitions; their data trees are
    /// only scheduled once they are implemented.
    pub fn register_module(&mut self, module: ModuleId) -> Result<()> {
        let module = self.ctx.main_module(module);
        self.register_definitions(module)?;
        if self.ctx.module(module).implemented {
            self.register_tree(module)?;
        }
        Ok(())
    }

    fn register_definitions(&mut self, module: ModuleId) -> Result<()> {
        if !self.definitions.insert(module) {
            return Ok(());
        }
        tracing::debug!(module = %self.ctx.module(module).name, "registering definitions");

        let family = self.ctx.module_family(module);
        let imports: Vec<ModuleId> = family
            .iter()
            .flat_map(|&m| self.ctx.module(m).imports.iter().map(|import| import.module))
            .collect();
        for import in imports {
            self.register_definitions(self.ctx.main_module(import))?;
        }

        for m in family {
            for feature in self.ctx.module(m).features.clone() {
                self.register_if_features(m, FeatureOwner::Feature(feature))?;
                self.queue(m, WorkKind::FeatureCheck { feature });
            }
            for identity in self.ctx.module(m).identities.clone() {
                self.register_if_features(m, FeatureOwner::Identity(identity))?;
                let pending: Vec<usize> = self
                    .ctx
                    .identity(identity)
                    .bases
                    .iter()
                    .enumerate()
                    .filter(|(_, base)| base.is_none())
                    .map(|(index, _)| index)
                    .collect();
                for index in pending {
                    self.queue(m, WorkKind::IdentityBase { identity, index });
                }
            }
            for typedef in self.ctx.module(m).typedefs.clone() {
                self.register_typedef(typedef);
            }
            let groupings: Vec<NodeId> = self
                .ctx
                .module(m)
                .children
                .iter()
                .copied()
                .filter(|&id| self.ctx.node(id).kind() == NodeKind::Grouping)
                .collect();
            for node in subtree(self.ctx, &groupings) {
                self.register_node(node)?;
            }
        }
        Ok(())
    }

    /// Queue the data tree, augments and deviations of an implemented module.
    pub(crate) fn register_tree(&mut self, module: ModuleId) -> Result<()> {
        if !self.trees.insert(module) {
            return Ok(());
        }
        self.register_definitions(module)?;
        tracing::debug!(module = %self.ctx.module(module).name, "registering data tree");

        for m in self.ctx.module_family(module) {
            let mut roots: Vec<NodeId> = self
                .ctx
                .module(m)
                .children
                .iter()
                .copied()
                .filter(|&id| self.ctx.node(id).kind() != NodeKind::Grouping)
                .collect();
            let augments = self.ctx.module(m).augments.clone();
            roots.extend(augments.iter().copied());
            for node in subtree(self.ctx, &roots) {
                self.register_node(node)?;
            }
            for node in augments {
                self.queue(m, WorkKind::Augment { node });
            }

            for index in 0..self.ctx.module(m).deviations.len() {
                let types: Vec<TypeId> = self.ctx.module(m).deviations[index]
                    .deviates
                    .iter()
                    .filter_map(|deviate| deviate.ty)
                    .collect();
                for ty in types {
                    self.register_type(ty, None);
                }
                if self.options.apply_deviations {
                    self.queue(m, WorkKind::Deviation { module: m, index });
                }
            }
        }
        Ok(())
    }

    fn register_typedef(&mut self, typedef: TypedefId) {
        let ty = self.ctx.typedef(typedef).ty;
        let module = self.ctx.typedef(typedef).module;
        self.register_type(ty, self.type_grouping(ty));
        if self.ctx.typedef(typedef).default.is_some() {
            self.queue(
                module,
                WorkKind::TypeDefault {
                    owner: DefaultOwner::Typedef(typedef),
                },
            );
        }
    }

    /// Queue derivation of `ty` and its union members.
    pub(crate) fn register_type(&mut self, ty: TypeId, grouping: Option<NodeId>) {
        let spec = self.ctx.type_spec(ty);
        let module = spec.module;
        let members = spec.restrictions.members.clone();
        let needs_bases = !spec.restrictions.bases.is_empty() && spec.identities.is_empty();
        let resolved = spec.is_resolved();
        if !resolved && self.queue(module, WorkKind::TypeDerivation { ty }) == AddOutcome::Queued {
            self.hold_grouping(grouping);
        }
        if needs_bases {
            self.queue(module, WorkKind::Identityref { ty });
        }
        for member in members {
            self.register_type(member, grouping);
        }
    }

    fn register_node(&mut self, node: NodeId) -> Result<()> {
        let module = self.ctx.node(node).module;
        self.register_if_features(module, FeatureOwner::Node(node))?;
        for typedef in self.ctx.node(node).typedefs.clone() {
            self.register_typedef(typedef);
        }

        let grouping = self.ctx.enclosing_grouping(node);
        let in_tree = grouping.is_none();
        let n = self.ctx.node(node);
        let kind = n.kind();
        let has_defaults = !n.defaults().is_empty();
        let has_unique = n.list().is_some_and(|list| !list.unique_specs.is_empty());
        let has_choice_default = n.choice().is_some_and(|choice| choice.default_name.is_some());
        let unexpanded = n.uses().is_some_and(|uses| uses.grouping.is_none());
        let ty = n.type_id();

        match kind {
            NodeKind::Leaf | NodeKind::LeafList => {
                if let Some(ty) = ty {
                    self.register_type(ty, grouping);
                }
                if in_tree && has_defaults {
                    self.queue(module, WorkKind::TypeDefault { owner: DefaultOwner::Node(node) });
                }
            }
            NodeKind::List if in_tree => {
                self.queue(module, WorkKind::ListKeys { node });
                if has_unique {
                    self.queue(module, WorkKind::ListUnique { node });
                }
            }
            NodeKind::Choice if in_tree && has_choice_default => {
                self.queue(module, WorkKind::ChoiceDefault { node });
            }
            NodeKind::Uses if unexpanded => {
                if self.queue(module, WorkKind::Uses { node }) == AddOutcome::Queued {
                    self.hold_grouping(grouping);
                }
            }
            _ => {}
        }
        if in_tree {
            self.register_xpath(node);
        }
        Ok(())
    }

    pub(crate) fn register_xpath(&mut self, node: NodeId) {
        let n = self.ctx.node(node);
        let module = n.module;
        if self.options.check_xpath && (n.when.is_some() || !n.musts.is_empty()) {
            self.queue(module, WorkKind::XPath { node });
        }
    }

    /// Compile the `if-feature`s of `owner` and queue their unfilled slots.
    /// Feature names are resolved with the prefixes of `module`.
    pub(crate) fn register_if_features(&mut self, module: ModuleId, owner: FeatureOwner) -> Result<()> {
        for index in 0..self.ctx.if_features(owner).len() {
            self.register_if_feature(module, owner, index)?;
        }
        Ok(())
    }

    pub(crate) fn register_if_feature(&mut self, module: ModuleId, owner: FeatureOwner, index: usize) -> Result<()> {
        let Some(expr) = self.ctx.if_features(owner).get(index) else {
            return Ok(());
        };
        if expr.is_resolved() {
            return Ok(());
        }
        let text = expr.text().clone();
        let filled: Vec<bool> = expr.features().iter().map(Option::is_some).collect();
        let was_compiled = expr.is_compiled();

        let extended = self.ctx.module(module).version.is_extended();
        let compiled = feature::compile(&text, extended).map_err(|error| CompileError::IfFeature {
            text: text.to_string(),
            error,
        })?;
        let names: Vec<Name> = compiled.features.iter().map(|name| self.ctx.intern(name)).collect();
        if !was_compiled {
            self.ctx.if_features_mut(owner)[index].install(&compiled);
        }
        for (slot, name) in names.into_iter().enumerate() {
            if filled.get(slot).copied().unwrap_or(false) {
                continue;
            }
            self.queue(
                module,
                WorkKind::IfFeature {
                    owner,
                    expr: index,
                    slot,
                    name,
                },
            );
        }
        Ok(())
    }

    /// Queue the tree-dependent items of a node copied out of a grouping.
    /// `source` is the grouping node it was copied from.
    pub(crate) fn register_copy(&mut self, copy: NodeId, source: NodeId) -> Result<()> {
        let source_module = self.ctx.node(source).module;
        self.register_if_features(source_module, FeatureOwner::Node(copy))?;
        let module = self.ctx.node(copy).module;

        let n = self.ctx.node(copy);
        let kind = n.kind();
        let has_unique = n.list().is_some_and(|list| !list.unique_specs.is_empty());
        let has_choice_default = n.choice().is_some_and(|choice| choice.default_name.is_some());
        let ty = n.type_id();

        match kind {
            NodeKind::Leaf | NodeKind::LeafList => {
                if let Some(ty) = ty {
                    self.register_copied_type(ty, copy);
                }
                if self.needs_default_check(copy) {
                    self.queue(module, WorkKind::TypeDefault { owner: DefaultOwner::Node(copy) });
                }
            }
            NodeKind::List => {
                self.queue(module, WorkKind::ListKeys { node: copy });
                if has_unique {
                    self.queue(module, WorkKind::ListUnique { node: copy });
                }
            }
            NodeKind::Choice if has_choice_default => {
                self.queue(module, WorkKind::ChoiceDefault { node: copy });
            }
            _ => {}
        }
        self.register_xpath(copy);
        Ok(())
    }

    fn register_copied_type(&mut self, ty: TypeId, node: NodeId) {
        let spec = self.ctx.type_spec(ty);
        let module = spec.module;
        let members = spec.restrictions.members.clone();
        let needs_target = spec.base == Some(BaseType::LeafRef) && spec.leafref_target.is_none();
        let needs_bases = !spec.restrictions.bases.is_empty() && spec.identities.is_empty();
        if needs_target {
            self.queue(module, WorkKind::Leafref { ty, node });
        }
        if needs_bases {
            self.queue(module, WorkKind::Identityref { ty });
        }
        for member in members {
            self.register_copied_type(member, node);
        }
    }

    /// A leaf or leaf-list default has to be checked against its type: its
    /// own default, or an inherited typedef default the type narrows.
    pub(crate) fn needs_default_check(&self, node: NodeId) -> bool {
        let n = self.ctx.node(node);
        if !n.defaults().is_empty() {
            return true;
        }
        let Some(ty) = n.type_id() else {
            return false;
        };
        let spec = self.ctx.type_spec(ty);
        spec.restrictions.narrows_values() && self.inherited_default(ty).is_some()
    }
}
