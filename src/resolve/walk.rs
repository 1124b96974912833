//! The sibling walk shared by every path resolver.

use crate::base::{ModuleId, NodeId};
use crate::schema::{Context, NodeKind};

/// What a segment is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Siblings {
    /// Children of a node.
    Node(NodeId),
    /// Top-level nodes of a module and its submodules.
    Module(ModuleId),
}

/// Which tree a path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Schema-nodeids: choices and cases are path segments.
    Schema,
    /// Leafref paths and instance-identifiers: choices and cases are invisible.
    Data,
}

/// Position relative to a short-hand case while walking a schema-nodeid.
///
/// A node written directly under a `choice` sits in an implicit case of the
/// same name, so `/c/x/x` addresses leaf `x` of choice `c`: the first `x`
/// names the case, the second the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    /// The walk is not directly below a choice.
    NotApplicable,
    /// The walk is at a choice; the next segment names a case.
    OutsideCase,
    /// The last segment named the implicit case of this node; the next
    /// segment must name the node itself.
    InsideCase(NodeId),
}

impl CaseState {
    /// State after matching `node` in schema mode.
    pub fn after(ctx: &Context, node: NodeId, previous: CaseState) -> CaseState {
        let kind = ctx.node(node).kind();
        if previous == CaseState::OutsideCase && kind != NodeKind::Case {
            return CaseState::InsideCase(node);
        }
        if kind == NodeKind::Choice {
            CaseState::OutsideCase
        } else {
            CaseState::NotApplicable
        }
    }
}

impl Context {
    /// Children visible at one level: `uses` is always transparent, and so
    /// are `choice` and `case` in data mode. Groupings are never visible.
    pub fn visible_children(&self, siblings: Siblings, mode: WalkMode) -> Vec<NodeId> {
        let mut pending: Vec<NodeId> = match siblings {
            Siblings::Node(parent) => self.node(parent).children.clone(),
            Siblings::Module(module) => self
                .module_family(module)
                .into_iter()
                .flat_map(|m| self.module(m).children.iter().copied())
                .collect(),
        };
        pending.reverse();

        let mut visible = Vec::new();
        while let Some(id) = pending.pop() {
            let transparent = match self.node(id).kind() {
                NodeKind::Grouping => continue,
                NodeKind::Uses => true,
                NodeKind::Choice | NodeKind::Case => mode == WalkMode::Data,
                _ => false,
            };
            if transparent {
                pending.extend(self.node(id).children.iter().rev().copied());
            } else {
                visible.push(id);
            }
        }
        visible
    }

    /// Find the visible child called `name` whose namespace is `module`.
    pub fn find_child(
        &self,
        siblings: Siblings,
        module: ModuleId,
        name: &str,
        mode: WalkMode,
    ) -> Option<NodeId> {
        let module = self.main_module(module);
        self.visible_children(siblings, mode).into_iter().find(|&id| {
            let node = self.node(id);
            node.name == name && self.main_module(node.module) == module
        })
    }

    /// The node is below an augment that has not been spliced yet.
    pub fn in_unapplied_augment(&self, id: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(node) = current {
            if self.node(node).augment().is_some_and(|a| a.target.is_none()) {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_is_transparent() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let c = ctx.add_container(m, None, "c");
        let uses = ctx.add_uses(m, Some(c), "g");
        let inner = ctx.add_leaf(m, Some(uses), "x", "string");
        assert_eq!(ctx.visible_children(Siblings::Node(c), WalkMode::Schema), vec![inner]);
        assert_eq!(ctx.find_child(Siblings::Node(c), m, "x", WalkMode::Schema), Some(inner));
    }

    #[test]
    fn test_choice_visible_only_in_schema_mode() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let c = ctx.add_container(m, None, "c");
        let ch = ctx.add_choice(m, Some(c), "ch", None);
        let case = ctx.add_case(m, ch, "k");
        let leaf = ctx.add_leaf(m, Some(case), "x", "string");
        assert_eq!(ctx.find_child(Siblings::Node(c), m, "x", WalkMode::Schema), None);
        assert_eq!(ctx.find_child(Siblings::Node(c), m, "x", WalkMode::Data), Some(leaf));
        assert_eq!(ctx.find_child(Siblings::Node(c), m, "ch", WalkMode::Schema), Some(ch));
    }

    #[test]
    fn test_module_siblings_include_submodules() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let sub = ctx.add_submodule("m-sub", m).unwrap();
        let top = ctx.add_container(sub, None, "top");
        assert_eq!(ctx.find_child(Siblings::Module(m), m, "top", WalkMode::Schema), Some(top));
        let other = ctx.add_module("o", "o").unwrap();
        assert_eq!(ctx.find_child(Siblings::Module(m), other, "top", WalkMode::Schema), None);
    }

    #[test]
    fn test_case_state_transitions() {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let ch = ctx.add_choice(m, None, "ch", None);
        let short = ctx.add_leaf(m, Some(ch), "x", "string");
        let case = ctx.add_case(m, ch, "k");
        assert_eq!(CaseState::after(&ctx, ch, CaseState::NotApplicable), CaseState::OutsideCase);
        assert_eq!(CaseState::after(&ctx, short, CaseState::OutsideCase), CaseState::InsideCase(short));
        assert_eq!(CaseState::after(&ctx, case, CaseState::OutsideCase), CaseState::NotApplicable);
    }
}
