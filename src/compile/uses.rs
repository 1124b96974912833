//! Grouping expansion.
//!
//! A `uses` is expanded in one step once its grouping has nothing pending:
//!
//! 1. the grouping's children are deep-copied under the `uses` node, which
//!    stays in the tree as a transparent level,
//! 2. refines are applied to the copies and their side effects re-checked,
//! 3. augments written inside the `uses` are queued against the copies.
//!
//! Copies of tree-dependent statements (list keys, leafref paths, defaults)
//! are queued again, since they resolve relative to their new position.

use crate::base::{ModuleId, NodeId, TypeId};
use crate::error::CompileError;
use crate::feature::IfFeatureExpr;
use crate::resolve::{NodeIdStart, Resolve, Siblings, Unresolved, WalkMode};
use crate::schema::{FeatureOwner, NodeData, NodeKind, Refine, TypeOwner};

use super::unres::{AddOutcome, DefaultOwner, WorkKind};
use super::Compiler;

impl Compiler<'_> {
    pub(crate) fn expand_uses(&mut self, uses: NodeId) -> Resolve<()> {
        let n = self.ctx.node(uses);
        let Some(data) = n.uses() else {
            return Ok(());
        };
        if data.grouping.is_some() {
            return Ok(());
        }
        let module = n.module;
        let grouping_name = data.grouping_name.clone();
        let grouping = self.ctx.find_grouping(uses)?;

        let mut ancestor = self.ctx.node(uses).parent;
        while let Some(id) = ancestor {
            if id == grouping {
                return Err(CompileError::cycle("grouping", grouping_name.as_str()).into());
            }
            ancestor = self.ctx.node(id).parent;
        }
        let pending = self.ctx.node(grouping).grouping().map_or(0, |g| g.pending);
        if pending > 0 {
            return Err(Unresolved::forward(format!(
                "grouping \"{grouping_name}\" has {pending} unresolved item(s)"
            )));
        }
        self.check_collisions(uses, grouping, module)?;

        let mut copies = Vec::new();
        let sources: Vec<NodeId> = self.ctx.node(grouping).children.clone();
        for source in sources {
            if self.ctx.node(source).kind() != NodeKind::Grouping {
                self.copy_subtree(source, uses, module, &mut copies);
            }
        }
        if let NodeData::Uses(data) = &mut self.ctx.node_mut(uses).data {
            data.grouping = Some(grouping);
        }
        tracing::debug!(
            grouping = %grouping_name,
            module = %self.ctx.module(module).name,
            nodes = copies.len(),
            "grouping expanded"
        );

        let in_grouping = self.ctx.enclosing_grouping(uses);
        for &(copy, source) in &copies {
            if in_grouping.is_some() {
                let source_module = self.ctx.node(source).module;
                self.register_if_features(source_module, FeatureOwner::Node(copy))?;
            } else {
                self.register_copy(copy, source)?;
            }
        }

        let refines = self.ctx.node(uses).uses().map(|u| u.refines.clone()).unwrap_or_default();
        for refine in &refines {
            let target = self
                .ctx
                .resolve_schema_nodeid(&refine.target, NodeIdStart::Node(uses), module)
                .map_err(|err| match err {
                    Unresolved::Forward(_) => Unresolved::Fatal(CompileError::not_found(
                        "refine target",
                        refine.target.as_str(),
                    )),
                    fatal => fatal,
                })?;
            self.apply_refine(target, refine, module)?;
            self.check_refined(target)?;
        }

        let augments = self.ctx.node(uses).uses().map(|u| u.augments.clone()).unwrap_or_default();
        for node in augments {
            if self.queue(module, WorkKind::Augment { node }) == AddOutcome::Queued {
                self.hold_grouping(in_grouping);
            }
        }
        self.release_grouping(in_grouping);
        Ok(())
    }

    /// A grouping child may not clash with a sibling of the `uses`.
    fn check_collisions(&self, uses: NodeId, grouping: NodeId, module: ModuleId) -> Resolve<()> {
        let siblings = match self.ctx.node(uses).parent {
            Some(parent) => Siblings::Node(parent),
            None => Siblings::Module(module),
        };
        let existing = self.ctx.visible_children(siblings, WalkMode::Schema);
        let module = self.ctx.main_module(module);
        for child in self.ctx.visible_children(Siblings::Node(grouping), WalkMode::Schema) {
            let name = &self.ctx.node(child).name;
            let clash = existing.iter().any(|&id| {
                let node = self.ctx.node(id);
                node.name == *name && self.ctx.main_module(node.module) == module
            });
            if clash {
                return Err(CompileError::duplicate("node", name.as_str()).into());
            }
        }
        Ok(())
    }

    /// Copy `source` and its descendants under `parent` in the namespace of
    /// `module`. Records `(copy, source)` pairs in document order.
    fn copy_subtree(
        &mut self,
        source: NodeId,
        parent: NodeId,
        module: ModuleId,
        copies: &mut Vec<(NodeId, NodeId)>,
    ) -> NodeId {
        let id = NodeId::from_index(self.ctx.nodes.len());
        let mut node = self.ctx.node(source).clone();
        node.parent = Some(parent);
        node.module = module;
        node.children = Vec::new();
        match &mut node.data {
            NodeData::List(list) => {
                list.keys.clear();
                list.uniques.clear();
            }
            NodeData::Choice(choice) => choice.default_case = None,
            NodeData::Uses(uses) => uses.augments.clear(),
            _ => {}
        }
        self.ctx.nodes.push(node);
        self.ctx.node_mut(parent).children.push(id);

        if let Some(ty) = self.ctx.node(source).type_id() {
            let copy = self.copy_type(ty, TypeOwner::Node(id));
            match &mut self.ctx.node_mut(id).data {
                NodeData::Leaf(leaf) => leaf.ty = copy,
                NodeData::LeafList(leaf_list) => leaf_list.ty = copy,
                _ => {}
            }
        }
        copies.push((id, source));

        let children = self.ctx.node(source).children.clone();
        for child in children {
            if !matches!(self.ctx.node(child).kind(), NodeKind::Grouping | NodeKind::Augment) {
                self.copy_subtree(child, id, module, copies);
            }
        }
        id
    }

    /// A type statement copied with its node. The leafref target is dropped;
    /// it is linked again from the new position.
    fn copy_type(&mut self, ty: TypeId, owner: TypeOwner) -> TypeId {
        let id = TypeId::from_index(self.ctx.types.len());
        let mut spec = self.ctx.type_spec(ty).clone();
        spec.owner = owner;
        spec.leafref_target = None;
        let members = std::mem::take(&mut spec.restrictions.members);
        self.ctx.types.push(spec);
        let members: Vec<TypeId> = members
            .into_iter()
            .map(|member| self.copy_type(member, TypeOwner::Union(id)))
            .collect();
        self.ctx.type_mut(id).restrictions.members = members;
        id
    }

    fn apply_refine(&mut self, target: NodeId, refine: &Refine, module: ModuleId) -> Resolve<()> {
        let kind = self.ctx.node(target).kind();
        let invalid = |what: &str| -> Unresolved {
            CompileError::constraint(format!(
                "refine \"{}\" cannot set {what} on a {kind}",
                refine.target
            ))
            .into()
        };

        if refine.config.is_some()
            && !matches!(
                kind,
                NodeKind::Container
                    | NodeKind::Leaf
                    | NodeKind::LeafList
                    | NodeKind::List
                    | NodeKind::Choice
                    | NodeKind::AnyData
                    | NodeKind::AnyXml
            )
        {
            return Err(invalid("config"));
        }
        if refine.mandatory.is_some()
            && !matches!(kind, NodeKind::Leaf | NodeKind::Choice | NodeKind::AnyData | NodeKind::AnyXml)
        {
            return Err(invalid("mandatory"));
        }
        if refine.presence.is_some() && kind != NodeKind::Container {
            return Err(invalid("presence"));
        }
        if (refine.min_elements.is_some() || refine.max_elements.is_some())
            && !matches!(kind, NodeKind::List | NodeKind::LeafList)
        {
            return Err(invalid("min-elements or max-elements"));
        }
        if !refine.musts.is_empty() && !kind.is_data() {
            return Err(invalid("must"));
        }
        if !refine.defaults.is_empty() {
            let single = refine.defaults.len() == 1;
            let extended = self.ctx.module(module).version.is_extended();
            let allowed = match kind {
                NodeKind::Leaf | NodeKind::Choice => single,
                NodeKind::LeafList => extended,
                _ => false,
            };
            if !allowed {
                return Err(invalid("default"));
            }
        }

        let default_name = match (kind, refine.defaults.first()) {
            (NodeKind::Choice, Some(default)) => Some(self.ctx.intern(default)),
            _ => None,
        };
        let node = self.ctx.node_mut(target);
        if let Some(description) = &refine.description {
            node.description = Some(description.clone());
        }
        if let Some(reference) = &refine.reference {
            node.reference = Some(reference.clone());
        }
        if let Some(config) = refine.config {
            node.config = Some(config);
        }
        if let Some(mandatory) = refine.mandatory {
            node.mandatory = mandatory;
        }
        node.musts.extend(refine.musts.iter().cloned());
        node.set_element_bounds(refine.min_elements, refine.max_elements);
        match &mut node.data {
            NodeData::Container(container) if refine.presence.is_some() => {
                container.presence = refine.presence.clone();
            }
            NodeData::Leaf(leaf) if !refine.defaults.is_empty() => {
                leaf.default = refine.defaults.first().cloned();
            }
            NodeData::LeafList(leaf_list) if !refine.defaults.is_empty() => {
                leaf_list.defaults = refine.defaults.clone();
            }
            NodeData::Choice(choice) if default_name.is_some() => {
                choice.default_name = default_name;
                choice.default_case = None;
            }
            _ => {}
        }

        for text in &refine.if_features {
            let owner = FeatureOwner::Node(target);
            self.ctx.if_features_mut(owner).push(IfFeatureExpr::new(text.clone()));
            let index = self.ctx.if_features(owner).len() - 1;
            self.register_if_feature(module, owner, index)?;
        }

        if self.ctx.enclosing_grouping(target).is_none() {
            let node_module = self.ctx.node(target).module;
            if !refine.defaults.is_empty() {
                let work = match kind {
                    NodeKind::Choice => WorkKind::ChoiceDefault { node: target },
                    _ => WorkKind::TypeDefault {
                        owner: DefaultOwner::Node(target),
                    },
                };
                self.queue(node_module, work);
            }
            if !refine.musts.is_empty() {
                self.register_xpath(target);
            }
        }
        Ok(())
    }

    /// Rules a refine can break on the node it changed.
    fn check_refined(&self, target: NodeId) -> Resolve<()> {
        let node = self.ctx.node(target);
        let name = node.name.as_str();
        if node.mandatory && !node.defaults().is_empty() {
            return Err(CompileError::constraint(format!(
                "\"{name}\" cannot be mandatory and have a default"
            ))
            .into());
        }
        if let Some((min, Some(max))) = node.element_bounds() {
            if min > max {
                return Err(CompileError::constraint(format!(
                    "\"{name}\": min-elements {min} exceeds max-elements {max}"
                ))
                .into());
            }
        }

        let mut child = target;
        let mut parent = self.ctx.schema_parent(target);
        while let Some(p) = parent {
            let node = self.ctx.node(p);
            match &node.data {
                NodeData::Choice(choice) => {
                    if choice.default_case == Some(child) {
                        if let Some(mandatory) = self.mandatory_in_case(child) {
                            return Err(CompileError::constraint(format!(
                                "default case of choice \"{}\" contains mandatory node \"{}\"",
                                node.name,
                                self.ctx.node(mandatory).name
                            ))
                            .into());
                        }
                    }
                    break;
                }
                NodeData::Container(container) if container.presence.is_none() => {}
                NodeData::Case | NodeData::Uses(_) => {}
                _ => break,
            }
            child = p;
            parent = self.ctx.schema_parent(p);
        }
        Ok(())
    }
}
