//! Schema-nodeid resolution for augment, deviation, refine and unique targets.

use crate::base::{ModuleId, NodeId};
use crate::error::CompileError;
use crate::parser::{NodeIdKind, SchemaNodeIdCursor};
use crate::schema::{Context, NodeKind};

use super::walk::{CaseState, Siblings, WalkMode};
use super::{Resolve, Unresolved};

/// Where a schema-nodeid starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIdStart {
    /// An absolute path; the first segment's prefix picks the module.
    Root,
    /// A descendant path below this node.
    Node(NodeId),
}

/// What the last segment of a schema-nodeid named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIdTarget {
    Node(NodeId),
    /// The implicit case around this node, which sits directly in a choice.
    ShorthandCase(NodeId),
}

impl Context {
    /// Resolve a schema-nodeid written in module `from`.
    ///
    /// Unprefixed segments belong to `from`. A segment that is missing is a
    /// forward reference; an unknown prefix or a malformed path is fatal.
    /// A path ending on a short-hand case answers the node inside it.
    pub fn resolve_schema_nodeid(
        &self,
        text: &str,
        start: NodeIdStart,
        from: ModuleId,
    ) -> Resolve<NodeId> {
        match self.resolve_schema_nodeid_target(text, start, from)? {
            NodeIdTarget::Node(node) | NodeIdTarget::ShorthandCase(node) => Ok(node),
        }
    }

    /// Like [`Context::resolve_schema_nodeid`], but tells a short-hand case
    /// apart from the node it holds.
    pub fn resolve_schema_nodeid_target(
        &self,
        text: &str,
        start: NodeIdStart,
        from: ModuleId,
    ) -> Resolve<NodeIdTarget> {
        let kind = match start {
            NodeIdStart::Root => NodeIdKind::Absolute,
            NodeIdStart::Node(_) => NodeIdKind::Descendant,
        };
        let mut cursor = SchemaNodeIdCursor::expecting(text, kind);
        let mut siblings = match start {
            NodeIdStart::Root => None,
            NodeIdStart::Node(node) => Some(Siblings::Node(node)),
        };
        let mut state = match start {
            NodeIdStart::Node(node) if self.node(node).kind() == NodeKind::Choice => {
                CaseState::OutsideCase
            }
            _ => CaseState::NotApplicable,
        };
        let mut current = None;

        while let Some(segment) = cursor
            .next_segment()
            .map_err(|error| CompileError::syntax(text, error))?
        {
            let module = self.module_by_prefix(from, segment.module())?;
            let name = segment.name();

            if let CaseState::InsideCase(node) = state {
                let n = self.node(node);
                if n.name != name || self.main_module(n.module) != module {
                    return Err(Unresolved::forward(format!(
                        "\"{name}\" in \"{text}\" does not match short-hand case \"{}\"",
                        n.name
                    )));
                }
                siblings = Some(Siblings::Node(node));
                state = CaseState::after(self, node, CaseState::NotApplicable);
                current = Some(node);
                continue;
            }

            let scope = *siblings.get_or_insert(Siblings::Module(module));
            let found = self
                .find_child(scope, module, name, WalkMode::Schema)
                .ok_or_else(|| {
                    Unresolved::forward(format!("target node \"{name}\" of \"{text}\" not found"))
                })?;
            state = CaseState::after(self, found, state);
            siblings = Some(Siblings::Node(found));
            current = Some(found);
        }

        match (current, state) {
            (Some(node), CaseState::InsideCase(_)) => Ok(NodeIdTarget::ShorthandCase(node)),
            (Some(node), _) => Ok(NodeIdTarget::Node(node)),
            (None, _) => Err(Unresolved::forward(format!("empty schema-nodeid \"{text}\""))),
        }
    }
}
