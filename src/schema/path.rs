//! Canonical path printing.

use std::fmt::Write;

use crate::base::NodeId;

use super::context::Context;
use super::node::NodeKind;

impl Context {
    /// Schema-nodeid of `id`, module-qualified at every segment.
    ///
    /// Choices, cases and operation input/output appear; `uses` does not.
    pub fn schema_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if self.node(node).kind() != NodeKind::Uses {
                segments.push(node);
            }
            current = self.schema_parent(node);
        }

        let mut path = String::new();
        for &node in segments.iter().rev() {
            let n = self.node(node);
            let module = self.module(self.main_module(n.module));
            let _ = write!(path, "/{}:{}", module.name, n.name);
        }
        path
    }

    /// JSON-style data path of `id`: schema-only nodes are skipped and a
    /// segment is qualified only where the module changes.
    pub fn data_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            match self.node(node).kind() {
                NodeKind::Choice | NodeKind::Case | NodeKind::Uses => {}
                NodeKind::Input | NodeKind::Output => {}
                _ => segments.push(node),
            }
            current = self.schema_parent(node);
        }

        let mut path = String::new();
        let mut previous = None;
        for &node in segments.iter().rev() {
            let n = self.node(node);
            let module = self.main_module(n.module);
            if previous == Some(module) {
                let _ = write!(path, "/{}", n.name);
            } else {
                let _ = write!(path, "/{}:{}", self.module(module).name, n.name);
            }
            previous = Some(module);
        }
        path
    }
}
