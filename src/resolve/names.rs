//! Prefix and definition lookup.

use crate::base::{FeatureId, IdentityId, ModuleId, NodeId, TypeId, TypedefId};
use crate::error::{CompileError, Result};
use crate::parser::{NodeIdentifier, split_qualified};
use crate::schema::{BaseType, Context, NodeKind};

use super::{Resolve, Unresolved};

impl Context {
    /// Map a prefix used inside `from` to a main module.
    ///
    /// No prefix and the module's own prefix both answer `from`'s main module.
    /// Submodules also see the imports of the module they belong to.
    pub fn module_by_prefix(&self, from: ModuleId, prefix: Option<&str>) -> Result<ModuleId> {
        let Some(prefix) = prefix else {
            return Ok(self.main_module(from));
        };
        if self.module(from).prefix == prefix {
            return Ok(self.main_module(from));
        }
        let main = self.main_module(from);
        [from, main]
            .into_iter()
            .find_map(|m| self.module(m).import_by_prefix(prefix))
            .map(|m| self.main_module(m))
            .ok_or_else(|| CompileError::not_found("prefix", prefix))
    }

    /// Parse `prefix:name` and map its prefix.
    pub(crate) fn split_prefixed<'a>(
        &self,
        from: ModuleId,
        text: &'a str,
    ) -> Result<(ModuleId, &'a str)> {
        let NodeIdentifier { module, name } =
            split_qualified(text).map_err(|error| CompileError::syntax(text, error))?;
        Ok((self.module_by_prefix(from, module)?, name))
    }

    /// Lexical lookup of the grouping a `uses` names.
    ///
    /// Unprefixed names are searched in every enclosing scope, then among the
    /// top-level groupings of the module and its submodules.
    pub fn find_grouping(&self, uses: NodeId) -> Resolve<NodeId> {
        let node = self.node(uses);
        let Some(data) = node.uses() else {
            return Err(CompileError::constraint(format!("\"{}\" is not a uses", node.name)).into());
        };
        let text = data.grouping_name.as_str();
        let (module, name) = self.split_prefixed(node.module, text)?;

        let is_grouping = |id: &NodeId| {
            let n = self.node(*id);
            n.kind() == NodeKind::Grouping && n.name == name
        };

        if module == self.main_module(node.module) {
            let mut scope = node.parent;
            while let Some(parent) = scope {
                if let Some(&found) = self.node(parent).children.iter().find(|id| is_grouping(id)) {
                    return Ok(found);
                }
                scope = self.node(parent).parent;
            }
        }
        self.module_family(module)
            .into_iter()
            .find_map(|m| self.module(m).children.iter().copied().find(|id| is_grouping(id)))
            .ok_or_else(|| Unresolved::forward(format!("grouping \"{text}\" not found")))
    }

    /// Lexical lookup of a typedef named by a type statement.
    ///
    /// `Ok(None)` means the name is a built-in type.
    pub fn find_typedef(&self, ty: TypeId) -> Resolve<Option<TypedefId>> {
        let spec = self.type_spec(ty);
        let text = spec.name.as_str();
        if !text.contains(':') && BaseType::from_builtin(text).is_some() {
            return Ok(None);
        }
        let (module, name) = self.split_prefixed(spec.module, text)?;

        if module == self.main_module(spec.module) {
            let mut scope = self.type_scope(ty);
            while let Some(node) = scope {
                let found = self
                    .node(node)
                    .typedefs
                    .iter()
                    .copied()
                    .find(|&id| self.typedef(id).name == name);
                if let Some(found) = found {
                    return Ok(Some(found));
                }
                scope = self.node(node).parent;
            }
        }
        self.module_family(module)
            .into_iter()
            .flat_map(|m| self.module(m).typedefs.iter().copied())
            .find(|&id| self.typedef(id).name == name)
            .map(Some)
            .ok_or_else(|| Unresolved::forward(format!("typedef \"{text}\" not found")))
    }

    /// The innermost node whose typedefs are visible from `ty`.
    fn type_scope(&self, ty: TypeId) -> Option<NodeId> {
        use crate::schema::TypeOwner;

        let mut owner = self.type_spec(ty).owner;
        loop {
            match owner {
                TypeOwner::Node(node) => return Some(node),
                TypeOwner::Typedef(id) => return self.typedef(id).parent,
                TypeOwner::Union(union) => owner = self.type_spec(union).owner,
                TypeOwner::Deviation(_) => return None,
            }
        }
    }

    pub fn find_identity(&self, from: ModuleId, text: &str) -> Resolve<IdentityId> {
        let (module, name) = self.split_prefixed(from, text)?;
        self.module_family(module)
            .into_iter()
            .flat_map(|m| self.module(m).identities.iter().copied())
            .find(|&id| self.identity(id).name == name)
            .ok_or_else(|| Unresolved::forward(format!("identity \"{text}\" not found")))
    }

    pub fn find_feature(&self, from: ModuleId, text: &str) -> Resolve<FeatureId> {
        let (module, name) = self.split_prefixed(from, text)?;
        self.module_family(module)
            .into_iter()
            .flat_map(|m| self.module(m).features.iter().copied())
            .find(|&id| self.feature(id).name == name)
            .ok_or_else(|| Unresolved::forward(format!("feature \"{text}\" not found")))
    }

    /// Resolve an identityref value written as `module:identity` and check it
    /// derives from one of the type's bases.
    ///
    /// The qualifier is a module name, as in JSON-encoded data; an unqualified
    /// value is looked up in the module of the type.
    pub fn resolve_identityref_value(&self, ty: TypeId, value: &str) -> Result<IdentityId> {
        let bases = self.effective_identity_bases(ty);
        if bases.is_empty() {
            return Err(CompileError::constraint(format!(
                "\"{value}\" cannot be checked: type has no resolved identity base"
            )));
        }
        let NodeIdentifier { module, name } =
            split_qualified(value).map_err(|error| CompileError::syntax(value, error))?;
        let module = match module {
            Some(module) => self
                .module_by_name(module)
                .ok_or_else(|| CompileError::not_found("module", module))?,
            None => self.type_spec(ty).module,
        };
        let identity = self
            .module_family(module)
            .into_iter()
            .flat_map(|m| self.module(m).identities.iter().copied())
            .find(|&id| self.identity(id).name == name)
            .ok_or_else(|| CompileError::not_found("identity", value))?;

        if bases.iter().any(|&base| base != identity && self.identity_derives_from(identity, base)) {
            Ok(identity)
        } else {
            Err(CompileError::constraint(format!(
                "identity \"{value}\" is not derived from the type's base"
            )))
        }
    }

    /// Identity bases of an identityref type, following the typedef chain to
    /// the first type that names bases.
    pub fn effective_identity_bases(&self, ty: TypeId) -> Vec<IdentityId> {
        let mut current = Some(ty);
        while let Some(id) = current {
            let spec = self.type_spec(id);
            if !spec.identities.is_empty() {
                return spec.identities.clone();
            }
            current = spec.derived_from.map(|typedef| self.typedef(typedef).ty);
        }
        Vec::new()
    }
}
