//! Augment application.

use crate::base::NodeId;
use crate::diagnostics::{Diagnostic, codes};
use crate::error::CompileError;
use crate::resolve::{NodeIdStart, NodeIdTarget, Resolve, Siblings, Unresolved, WalkMode};
use crate::schema::{NodeData, NodeKind};

use super::Compiler;

impl Compiler<'_> {
    /// Splice the children of an augment into its target.
    ///
    /// The children keep the augment as their lexical parent;
    /// [`crate::Context::schema_parent`] answers the target for them.
    pub(crate) fn apply_augment(&mut self, augment: NodeId) -> Resolve<()> {
        let aug = self.ctx.node(augment);
        let Some(data) = aug.augment() else {
            return Ok(());
        };
        if data.target.is_some() {
            return Ok(());
        }
        let path = data.target_path.clone();
        let module = aug.module;
        let start = match aug.parent {
            Some(uses) => match self.ctx.node(uses).uses() {
                Some(u) if u.grouping.is_none() => {
                    return Err(Unresolved::forward(format!(
                        "uses \"{}\" is not expanded yet",
                        u.grouping_name
                    )));
                }
                _ => NodeIdStart::Node(uses),
            },
            None => NodeIdStart::Root,
        };
        let target = match self.ctx.resolve_schema_nodeid_target(&path, start, module)? {
            NodeIdTarget::Node(node) => node,
            NodeIdTarget::ShorthandCase(node) => self.ctx.make_case_explicit(node),
        };
        let target_kind = self.ctx.node(target).kind();
        if !matches!(
            target_kind,
            NodeKind::Container
                | NodeKind::List
                | NodeKind::Choice
                | NodeKind::Case
                | NodeKind::Input
                | NodeKind::Output
                | NodeKind::Notification
                | NodeKind::Rpc
                | NodeKind::Action
        ) {
            return Err(CompileError::constraint(format!(
                "augment target \"{path}\" is a {target_kind}"
            ))
            .into());
        }

        let children = self.ctx.node(augment).children.clone();
        for &child in &children {
            let kind = self.ctx.node(child).kind();
            let allowed = match target_kind {
                NodeKind::Choice => kind.is_case_member() || kind == NodeKind::Uses,
                NodeKind::Rpc | NodeKind::Action => matches!(kind, NodeKind::Input | NodeKind::Output),
                _ => !matches!(
                    kind,
                    NodeKind::Case | NodeKind::Input | NodeKind::Output | NodeKind::Rpc
                ),
            };
            if !allowed {
                return Err(CompileError::constraint(format!(
                    "a {kind} cannot augment {target_kind} \"{path}\""
                ))
                .into());
            }
            if self.ctx.node(child).uses().is_some_and(|u| u.grouping.is_none()) {
                return Err(Unresolved::forward(format!(
                    "augment \"{path}\" waits for a uses to expand"
                )));
            }
        }

        for child in self.ctx.visible_children(Siblings::Node(augment), WalkMode::Schema) {
            let c = self.ctx.node(child);
            if self
                .ctx
                .find_child(Siblings::Node(target), c.module, &c.name, WalkMode::Schema)
                .is_some()
            {
                return Err(CompileError::duplicate("node", c.name.as_str()).into());
            }
        }

        let foreign = self.ctx.main_module(self.ctx.node(target).module) != self.ctx.main_module(module);
        if foreign && self.ctx.node(augment).when.is_none() {
            for &child in &children {
                if let Some(mandatory) = self.mandatory_in_case(child) {
                    return Err(CompileError::constraint(format!(
                        "augment \"{path}\" adds mandatory node \"{}\" without a when",
                        self.ctx.node(mandatory).name
                    ))
                    .into());
                }
            }
        }

        let under_operation = {
            let mut current = Some(target);
            let mut found = false;
            while let Some(id) = current {
                if self.ctx.node(id).kind().is_operation() {
                    found = true;
                    break;
                }
                current = self.ctx.schema_parent(id);
            }
            found
        };
        let target_config = self.ctx.is_config(target);
        let target_status = self.ctx.effective_status(target);
        let mut warnings = Vec::new();
        for &child in &children {
            let c = self.ctx.node(child);
            if !under_operation && !target_config && c.config == Some(true) {
                return Err(CompileError::constraint(format!(
                    "\"{}\" is config true under state data \"{path}\"",
                    c.name
                ))
                .into());
            }
            let status = c.status.or(self.ctx.node(augment).status).unwrap_or_default();
            if status < target_status {
                warnings.push(
                    Diagnostic::warning(
                        codes::DEPRECATED,
                        format!(
                            "{} \"{}\" augments {} target \"{path}\"",
                            status.as_str(),
                            c.name,
                            target_status.as_str()
                        ),
                    )
                    .with_module(self.ctx.module(module).name.clone())
                    .with_line(c.line),
                );
            }
        }
        for warning in warnings {
            self.warn(warning);
        }

        for &child in &children {
            if under_operation {
                self.ctx.node_mut(child).config = None;
            }
            self.ctx.node_mut(target).children.push(child);
        }
        if let NodeData::Augment(data) = &mut self.ctx.node_mut(augment).data {
            data.target = Some(target);
        }
        tracing::debug!(
            target = %path,
            module = %self.ctx.module(module).name,
            nodes = children.len(),
            "augment applied"
        );

        let target_module = self.ctx.main_module(self.ctx.node(target).module);
        if !self.ctx.module(target_module).implemented && self.options.promote_augment_targets {
            self.ctx.module_mut(target_module).implemented = true;
            tracing::debug!(module = %self.ctx.module(target_module).name, "module promoted to implemented");
            self.register_tree(target_module)?;
        }
        self.release_grouping(self.ctx.enclosing_grouping(augment));
        Ok(())
    }
}
