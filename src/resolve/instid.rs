//! JSON-normalized instance-identifier resolution.

use crate::base::{ModuleId, NodeId};
use crate::error::{CompileError, Result};
use crate::parser::{InstanceIdCursor, Predicate, PredicateKind};
use crate::schema::{Context, NodeKind};

use super::walk::{Siblings, WalkMode};

impl Context {
    /// Resolve an instance-identifier such as `/m:a/b[k='1']/c` to the
    /// schema node it addresses.
    ///
    /// The first segment must be qualified with a module name; later segments
    /// inherit the module of the previous one. Predicates are checked against
    /// the node they follow.
    pub fn resolve_instance_identifier(&self, text: &str) -> Result<NodeId> {
        let syntax = |error| CompileError::syntax(text, error);
        let mut cursor = InstanceIdCursor::new(text);
        let mut module: Option<ModuleId> = None;
        let mut siblings: Option<Siblings> = None;
        let mut current = None;

        while let Some(segment) = cursor.next_segment().map_err(syntax)? {
            let segment_module = match (segment.module(), module) {
                (Some(name), _) => self
                    .module_by_name(name)
                    .map(|m| self.main_module(m))
                    .ok_or_else(|| CompileError::not_found("module", name))?,
                (None, Some(previous)) => previous,
                (None, None) => {
                    return Err(CompileError::constraint(format!(
                        "\"{text}\": first segment has no module name"
                    )));
                }
            };
            let scope = siblings.unwrap_or(Siblings::Module(segment_module));
            let found = self
                .find_child(scope, segment_module, segment.name(), WalkMode::Data)
                .ok_or_else(|| CompileError::not_found("node", &text[..usize::from(segment.range.end())]))?;

            while let Some(predicate) = cursor.next_predicate().map_err(syntax)? {
                self.check_instance_predicate(found, segment_module, &predicate, text)?;
            }

            module = Some(segment_module);
            siblings = Some(Siblings::Node(found));
            current = Some(found);
        }
        current.ok_or_else(|| CompileError::constraint("empty instance-identifier"))
    }

    fn check_instance_predicate(
        &self,
        node: NodeId,
        module: ModuleId,
        predicate: &Predicate<'_>,
        text: &str,
    ) -> Result<()> {
        let n = self.node(node);
        let kind = n.kind();
        let invalid = |what: &str| {
            CompileError::constraint(format!(
                "\"{text}\": {what} predicate on {} \"{}\"",
                kind.as_str(),
                n.name
            ))
        };
        match predicate.kind {
            PredicateKind::Position(0) => Err(CompileError::constraint(format!(
                "\"{text}\": positions start at 1"
            ))),
            PredicateKind::Position(_) => match kind {
                NodeKind::List | NodeKind::LeafList => Ok(()),
                _ => Err(invalid("position")),
            },
            PredicateKind::Value(_) => match kind {
                NodeKind::LeafList => Ok(()),
                _ => Err(invalid("value")),
            },
            PredicateKind::Key { key, .. } => {
                let Some(list) = n.list() else {
                    return Err(invalid("key"));
                };
                let key_module = match key.module {
                    Some(name) => self
                        .module_by_name(name)
                        .ok_or_else(|| CompileError::not_found("module", name))?,
                    None => module,
                };
                let found = self.find_child(Siblings::Node(node), key_module, key.name, WalkMode::Data);
                match found {
                    Some(leaf) if list.keys.contains(&leaf) => Ok(()),
                    _ => Err(CompileError::constraint(format!(
                        "\"{text}\": \"{}\" is not a key of \"{}\"",
                        key.name, n.name
                    ))),
                }
            }
        }
    }
}
