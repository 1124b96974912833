//! Leafref `path` resolution.

use crate::base::{ModuleId, NodeId, TypeId};
use crate::error::CompileError;
use crate::parser::{PathArgCursor, PathKeyExprCursor, PathPredicate};
use crate::schema::{BaseType, Context, NodeKind, TypeOwner};

use super::walk::{Siblings, WalkMode};
use super::{Resolve, Unresolved};

impl Context {
    /// Resolve the `path` of leafref type `ty` used by `node`.
    ///
    /// The target must be a leaf or leaf-list whose own type is resolved.
    /// A configuration leafref with `require-instance` may not point at
    /// state data.
    pub fn resolve_leafref(&self, ty: TypeId, node: NodeId) -> Resolve<NodeId> {
        let Some((text, prefixes)) = self.leafref_path(ty) else {
            return Err(CompileError::constraint("leafref type without a \"path\"").into());
        };
        let text = text.as_str();
        if self.in_unapplied_augment(node) {
            return Err(Unresolved::forward(format!(
                "leafref \"{text}\" is inside an augment that is not applied yet"
            )));
        }
        let syntax = |error| Unresolved::from(CompileError::syntax(text, error));

        let mut cursor = PathArgCursor::new(text);
        let mut previous: ModuleId = self.main_module(self.node(node).module);
        let mut siblings: Option<Siblings> = None;
        let mut current = None;

        while let Some(segment) = cursor.next_segment().map_err(syntax)? {
            let module = match segment.module() {
                Some(_) => self.module_by_prefix(prefixes, segment.module())?,
                None => previous,
            };
            if siblings.is_none() {
                siblings = Some(if cursor.is_absolute() == Some(true) {
                    Siblings::Module(module)
                } else {
                    self.ascend(node, cursor.parent_times(), text)?
                });
            }
            let scope = siblings.unwrap_or(Siblings::Module(module));
            let found = self
                .find_child(scope, module, segment.name(), WalkMode::Data)
                .ok_or_else(|| {
                    Unresolved::forward(format!(
                        "leafref \"{text}\": node \"{}\" not found",
                        segment.name()
                    ))
                })?;

            while let Some(predicate) = cursor.next_predicate().map_err(syntax)? {
                self.check_path_predicate(found, node, prefixes, &predicate, text)?;
            }

            previous = module;
            siblings = Some(Siblings::Node(found));
            current = Some(found);
        }

        let Some(target) = current else {
            return Err(Unresolved::forward(format!("empty leafref path \"{text}\"")));
        };
        self.check_leafref_target(ty, node, target, text)?;
        Ok(target)
    }

    /// The `path` of a leafref, following typedefs, with the module whose
    /// prefixes it is written in.
    fn leafref_path(&self, ty: TypeId) -> Option<(crate::base::Name, ModuleId)> {
        let mut current = Some(ty);
        while let Some(id) = current {
            let spec = self.type_spec(id);
            if let Some(path) = &spec.restrictions.path {
                return Some((path.clone(), spec.module));
            }
            current = spec.derived_from.map(|typedef| self.typedef(typedef).ty);
        }
        None
    }

    /// Effective `require-instance`, following typedefs; defaults to true.
    pub fn require_instance(&self, ty: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            let spec = self.type_spec(id);
            if let Some(require) = spec.restrictions.require_instance {
                return require;
            }
            current = spec.derived_from.map(|typedef| self.typedef(typedef).ty);
        }
        true
    }

    /// Sibling set reached by `times` data-tree steps up from `node`.
    fn ascend(&self, node: NodeId, times: usize, text: &str) -> Resolve<Siblings> {
        let mut at = Siblings::Node(node);
        for _ in 0..times {
            at = match at {
                Siblings::Node(n) => match self.data_parent(n) {
                    Some(parent) => Siblings::Node(parent),
                    None => Siblings::Module(self.main_module(self.node(n).module)),
                },
                Siblings::Module(_) => {
                    return Err(CompileError::constraint(format!(
                        "leafref \"{text}\" climbs above the top of the tree"
                    ))
                    .into());
                }
            };
        }
        Ok(at)
    }

    /// `[key = current()/../path]`: `key` is a key of `list`, the right side
    /// ends on a leaf.
    fn check_path_predicate(
        &self,
        list: NodeId,
        node: NodeId,
        prefixes: ModuleId,
        predicate: &PathPredicate<'_>,
        text: &str,
    ) -> Resolve<()> {
        let Some(data) = self.node(list).list() else {
            return Err(CompileError::constraint(format!(
                "leafref \"{text}\": predicate on non-list \"{}\"",
                self.node(list).name
            ))
            .into());
        };
        let key_module = self.path_module(node, prefixes, predicate.key.module)?;
        let key = self
            .find_child(Siblings::Node(list), key_module, predicate.key.name, WalkMode::Data)
            .ok_or_else(|| {
                Unresolved::forward(format!(
                    "leafref \"{text}\": key \"{}\" not found",
                    predicate.key.name
                ))
            })?;
        if data.keys.is_empty() && data.key_names.is_some() {
            return Err(Unresolved::forward(format!(
                "leafref \"{text}\": keys of \"{}\" not resolved yet",
                self.node(list).name
            )));
        }
        if !data.keys.contains(&key) {
            return Err(CompileError::constraint(format!(
                "leafref \"{text}\": \"{}\" is not a key of \"{}\"",
                predicate.key.name,
                self.node(list).name
            ))
            .into());
        }

        let expr = predicate.key_expr;
        let mut cursor = PathKeyExprCursor::new(expr);
        let mut siblings = None;
        let mut current = None;
        while let Some(segment) = cursor
            .next_segment()
            .map_err(|error| CompileError::syntax(expr, error))?
        {
            let scope = match siblings {
                Some(scope) => scope,
                None => self.ascend(node, cursor.parent_times(), text)?,
            };
            let module = self.path_module(node, prefixes, segment.module())?;
            let found = self
                .find_child(scope, module, segment.name(), WalkMode::Data)
                .ok_or_else(|| {
                    Unresolved::forward(format!(
                        "leafref \"{text}\": predicate node \"{}\" not found",
                        segment.name()
                    ))
                })?;
            siblings = Some(Siblings::Node(found));
            current = Some(found);
        }
        match current.map(|id| self.node(id).kind()) {
            Some(NodeKind::Leaf) => Ok(()),
            _ => Err(CompileError::constraint(format!(
                "leafref \"{text}\": predicate \"{expr}\" does not end on a leaf"
            ))
            .into()),
        }
    }

    /// Module of a path node name: unprefixed names belong to the module of
    /// `node`, prefixes map through the imports of `prefixes`.
    fn path_module(&self, node: NodeId, prefixes: ModuleId, prefix: Option<&str>) -> Resolve<ModuleId> {
        match prefix {
            Some(_) => Ok(self.module_by_prefix(prefixes, prefix)?),
            None => Ok(self.main_module(self.node(node).module)),
        }
    }

    fn check_leafref_target(
        &self,
        ty: TypeId,
        node: NodeId,
        target: NodeId,
        text: &str,
    ) -> Resolve<()> {
        let target_node = self.node(target);
        if !matches!(target_node.kind(), NodeKind::Leaf | NodeKind::LeafList) {
            return Err(CompileError::constraint(format!(
                "leafref \"{text}\" points to {} \"{}\"",
                target_node.kind().as_str(),
                target_node.name
            ))
            .into());
        }
        if target == node {
            return Err(CompileError::cycle("leafref", text).into());
        }
        let Some(target_ty) = target_node.type_id() else {
            return Err(Unresolved::forward(format!("leafref \"{text}\": target has no type")));
        };
        let target_spec = self.type_spec(target_ty);
        match target_spec.base {
            None => {
                return Err(Unresolved::forward(format!(
                    "leafref \"{text}\": target type not resolved yet"
                )));
            }
            Some(BaseType::LeafRef) if target_spec.leafref_target.is_none() => {
                return Err(Unresolved::forward(format!(
                    "leafref \"{text}\": target leafref not resolved yet"
                )));
            }
            _ => {}
        }

        let owner_node = match self.type_spec(ty).owner {
            TypeOwner::Node(owner) => owner,
            _ => node,
        };
        if self.require_instance(ty) && self.is_config(owner_node) && !self.is_config(target) {
            return Err(CompileError::constraint(format!(
                "leafref \"{text}\" of configuration node \"{}\" points to state data",
                self.node(owner_node).name
            ))
            .into());
        }
        Ok(())
    }
}
