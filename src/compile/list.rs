//! List keys, `unique` and choice defaults.

use crate::base::NodeId;
use crate::error::CompileError;
use crate::resolve::{NodeIdStart, Resolve, Siblings, Unresolved, WalkMode};
use crate::schema::{BaseType, NodeData, NodeKind, YangVersion};

use super::Compiler;

impl Compiler<'_> {
    pub(crate) fn link_list_keys(&mut self, list: NodeId) -> Resolve<()> {
        let n = self.ctx.node(list);
        let Some(data) = n.list() else {
            return Ok(());
        };
        if !data.keys.is_empty() {
            return Ok(());
        }
        let module = n.module;
        let list_name = n.name.clone();
        let config = self.ctx.is_config(list);
        let Some(key_names) = data.key_names.clone() else {
            if config {
                return Err(CompileError::constraint(format!(
                    "configuration list \"{list_name}\" has no key"
                ))
                .into());
            }
            return Ok(());
        };
        let version = self.ctx.module(module).version;

        let mut keys: Vec<NodeId> = Vec::new();
        for text in key_names.split_whitespace() {
            let (key_module, name) = self.ctx.split_prefixed(module, text)?;
            let key = self
                .ctx
                .find_child(Siblings::Node(list), key_module, name, WalkMode::Schema)
                .ok_or_else(|| {
                    Unresolved::forward(format!("key \"{text}\" of list \"{list_name}\" not found"))
                })?;
            if keys.contains(&key) {
                return Err(CompileError::duplicate("key", text).into());
            }
            let k = self.ctx.node(key);
            if k.kind() != NodeKind::Leaf {
                return Err(CompileError::constraint(format!(
                    "key \"{text}\" of list \"{list_name}\" is a {}, not a leaf",
                    k.kind()
                ))
                .into());
            }
            if k.config.is_some_and(|key_config| key_config != config) {
                return Err(CompileError::constraint(format!(
                    "key \"{text}\" has a different config than list \"{list_name}\""
                ))
                .into());
            }
            if version.is_extended() && (!k.if_features.is_empty() || k.when.is_some()) {
                return Err(CompileError::constraint(format!(
                    "key \"{text}\" cannot be conditional"
                ))
                .into());
            }
            let base = k.type_id().map(|ty| self.ctx.type_spec(ty).base);
            match base {
                Some(None) => {
                    return Err(Unresolved::forward(format!(
                        "type of key \"{text}\" is not resolved yet"
                    )));
                }
                Some(Some(BaseType::Empty)) if version == YangVersion::V1_0 => {
                    return Err(CompileError::constraint(format!(
                        "key \"{text}\" cannot be of type empty"
                    ))
                    .into());
                }
                _ => {}
            }
            keys.push(key);
        }

        if let NodeData::List(data) = &mut self.ctx.node_mut(list).data {
            data.keys = keys;
        }
        Ok(())
    }

    pub(crate) fn link_unique(&mut self, list: NodeId) -> Resolve<()> {
        let n = self.ctx.node(list);
        let Some(data) = n.list() else {
            return Ok(());
        };
        if data.uniques.len() == data.unique_specs.len() {
            return Ok(());
        }
        let module = n.module;
        let mut uniques = Vec::with_capacity(data.unique_specs.len());
        for spec in &data.unique_specs {
            let mut leafs: Vec<NodeId> = Vec::new();
            for path in spec.split_whitespace() {
                let target = self
                    .ctx
                    .resolve_schema_nodeid(path, NodeIdStart::Node(list), module)?;
                if self.ctx.node(target).kind() != NodeKind::Leaf {
                    return Err(CompileError::constraint(format!(
                        "unique \"{path}\" does not refer to a leaf"
                    ))
                    .into());
                }
                if leafs.contains(&target) {
                    return Err(CompileError::duplicate("unique", path).into());
                }
                leafs.push(target);
            }
            let mut config = leafs.iter().map(|&leaf| self.ctx.is_config(leaf));
            if let Some(first) = config.next() {
                if config.any(|c| c != first) {
                    return Err(CompileError::constraint(format!(
                        "unique \"{spec}\" mixes configuration and state leafs"
                    ))
                    .into());
                }
            }
            uniques.push(leafs);
        }

        if let NodeData::List(data) = &mut self.ctx.node_mut(list).data {
            data.uniques = uniques;
        }
        Ok(())
    }

    pub(crate) fn link_choice_default(&mut self, choice: NodeId) -> Resolve<()> {
        let n = self.ctx.node(choice);
        let Some(data) = n.choice() else {
            return Ok(());
        };
        let Some(name) = data.default_name.clone() else {
            return Ok(());
        };
        if n.mandatory {
            return Err(CompileError::constraint(format!(
                "mandatory choice \"{}\" cannot have a default",
                n.name
            ))
            .into());
        }
        let module = self.ctx.main_module(n.module);
        let case = self
            .ctx
            .visible_children(Siblings::Node(choice), WalkMode::Schema)
            .into_iter()
            .find(|&id| {
                let c = self.ctx.node(id);
                c.name == name.as_str() && self.ctx.main_module(c.module) == module
            })
            .ok_or_else(|| Unresolved::forward(format!("default case \"{name}\" not found")))?;

        if let Some(mandatory) = self.mandatory_in_case(case) {
            return Err(CompileError::constraint(format!(
                "default case \"{name}\" contains mandatory node \"{}\"",
                self.ctx.node(mandatory).name
            ))
            .into());
        }
        if let NodeData::Choice(data) = &mut self.ctx.node_mut(choice).data {
            data.default_case = Some(case);
        }
        Ok(())
    }

    /// The first mandatory node directly under `case`, which may be a
    /// short-hand case, looking through non-presence containers.
    pub(crate) fn mandatory_in_case(&self, case: NodeId) -> Option<NodeId> {
        let mut pending = if self.ctx.node(case).kind() == NodeKind::Case {
            self.ctx.visible_children(Siblings::Node(case), WalkMode::Schema)
        } else {
            vec![case]
        };
        while let Some(id) = pending.pop() {
            let node = self.ctx.node(id);
            if node.mandatory || node.element_bounds().is_some_and(|(min, _)| min > 0) {
                return Some(id);
            }
            if let NodeData::Container(container) = &node.data {
                if container.presence.is_none() {
                    pending.extend(self.ctx.visible_children(Siblings::Node(id), WalkMode::Schema));
                }
            }
        }
        None
    }
}
