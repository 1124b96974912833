//! Deviations: toggle-able patches on nodes of other modules.
//!
//! Applying a deviation snapshots the target node first, so the undeviated
//! tree can be restored (and the patch re-applied) at any time.

use crate::base::{ModuleId, Name, NodeId, TypeId};
use crate::error::{CompileError, Result};

use super::context::Context;
use super::node::{Must, NodeData, NodeKind, SchemaNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

impl DeviateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviateKind::NotSupported => "not-supported",
            DeviateKind::Add => "add",
            DeviateKind::Replace => "replace",
            DeviateKind::Delete => "delete",
        }
    }
}

/// One `deviate` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviate {
    pub kind: DeviateKind,
    pub ty: Option<TypeId>,
    pub units: Option<String>,
    pub defaults: Vec<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub musts: Vec<Must>,
    pub uniques: Vec<String>,
}

impl Deviate {
    pub fn new(kind: DeviateKind) -> Self {
        Self {
            kind,
            ty: None,
            units: None,
            defaults: Vec::new(),
            config: None,
            mandatory: None,
            min_elements: None,
            max_elements: None,
            musts: Vec::new(),
            uniques: Vec::new(),
        }
    }
}

/// Where a removed node used to be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Node(NodeId, usize),
    Module(ModuleId, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    node: SchemaNode,
    removed_from: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    /// Absolute schema-nodeid of the target.
    pub target_path: Name,
    pub deviates: Vec<Deviate>,
    pub target: Option<NodeId>,
    snapshot: Option<Snapshot>,
}

impl Deviation {
    pub fn new(target_path: Name, deviates: Vec<Deviate>) -> Self {
        Self {
            target_path,
            deviates,
            target: None,
            snapshot: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl Context {
    pub fn add_deviation(&mut self, module: ModuleId, target: &str, deviates: Vec<Deviate>) -> usize {
        let target = self.intern(target);
        let deviations = &mut self.module_mut(module).deviations;
        deviations.push(Deviation::new(target, deviates));
        deviations.len() - 1
    }

    /// Apply or revert every resolved deviation of `module`.
    pub fn set_deviations_enabled(&mut self, module: ModuleId, enabled: bool) -> Result<()> {
        let count = self.module(module).deviations.len();
        if enabled {
            for index in 0..count {
                if self.module(module).deviations[index].target.is_some() {
                    self.apply_deviation(module, index)?;
                }
            }
        } else {
            for index in (0..count).rev() {
                self.revert_deviation(module, index);
            }
        }
        tracing::debug!(module = %self.module(module).name, enabled, "deviations toggled");
        Ok(())
    }

    /// Patch the target of a resolved deviation. No-op when already applied.
    pub(crate) fn apply_deviation(&mut self, module: ModuleId, index: usize) -> Result<()> {
        let deviation = &self.module(module).deviations[index];
        if deviation.is_applied() {
            return Ok(());
        }
        let Some(target) = deviation.target else {
            return Err(CompileError::not_found(
                "deviation target",
                deviation.target_path.as_str(),
            ));
        };
        let deviates = deviation.deviates.clone();
        let original = self.node(target).clone();

        let mut removed_from = None;
        for deviate in &deviates {
            if let Err(message) = self.apply_deviate(target, deviate, &mut removed_from) {
                // Leave the node as it was before the failed deviation.
                self.module_mut(module).deviations[index].snapshot = Some(Snapshot {
                    node: original,
                    removed_from,
                });
                self.revert_deviation(module, index);
                return Err(CompileError::constraint(format!(
                    "deviate {} of \"{}\": {}",
                    deviate.kind.as_str(),
                    self.module(module).deviations[index].target_path,
                    message
                )));
            }
        }
        self.module_mut(module).deviations[index].snapshot = Some(Snapshot {
            node: original,
            removed_from,
        });
        Ok(())
    }

    /// Restore the undeviated target. No-op when not applied.
    pub(crate) fn revert_deviation(&mut self, module: ModuleId, index: usize) {
        let deviation = &mut self.module_mut(module).deviations[index];
        let (Some(target), Some(snapshot)) = (deviation.target, deviation.snapshot.take()) else {
            return;
        };
        self.nodes[target.index()] = snapshot.node;
        match snapshot.removed_from {
            Some(Slot::Node(parent, pos)) => {
                let children = &mut self.node_mut(parent).children;
                children.insert(pos.min(children.len()), target);
            }
            Some(Slot::Module(owner, pos)) => {
                let children = &mut self.module_mut(owner).children;
                children.insert(pos.min(children.len()), target);
            }
            None => {}
        }
    }

    fn apply_deviate(
        &mut self,
        target: NodeId,
        deviate: &Deviate,
        removed_from: &mut Option<Slot>,
    ) -> std::result::Result<(), String> {
        match deviate.kind {
            DeviateKind::NotSupported => {
                *removed_from = Some(self.unlink(target)?);
                Ok(())
            }
            DeviateKind::Add => self.deviate_add(target, deviate),
            DeviateKind::Replace => self.deviate_replace(target, deviate),
            DeviateKind::Delete => self.deviate_delete(target, deviate),
        }
    }

    fn unlink(&mut self, target: NodeId) -> std::result::Result<Slot, String> {
        match self.schema_parent(target) {
            Some(parent) => {
                let children = &mut self.node_mut(parent).children;
                let pos = children
                    .iter()
                    .position(|&child| child == target)
                    .ok_or("target is not linked to its parent")?;
                children.remove(pos);
                Ok(Slot::Node(parent, pos))
            }
            None => {
                let owner = self.node(target).module;
                let children = &mut self.module_mut(owner).children;
                let pos = children
                    .iter()
                    .position(|&child| child == target)
                    .ok_or("target is not a top-level node")?;
                children.remove(pos);
                Ok(Slot::Module(owner, pos))
            }
        }
    }

    fn deviate_add(&mut self, target: NodeId, deviate: &Deviate) -> std::result::Result<(), String> {
        let node = &mut self.nodes[target.index()];
        if let Some(units) = &deviate.units {
            match &mut node.data {
                NodeData::Leaf(leaf) if leaf.units.is_none() => leaf.units = Some(units.clone()),
                NodeData::LeafList(leaf_list) if leaf_list.units.is_none() => {
                    leaf_list.units = Some(units.clone())
                }
                _ => return Err("units already present or not applicable".into()),
            }
        }
        if !deviate.defaults.is_empty() {
            match &mut node.data {
                NodeData::Leaf(leaf) if leaf.default.is_none() && deviate.defaults.len() == 1 => {
                    leaf.default = Some(deviate.defaults[0].clone());
                }
                NodeData::LeafList(leaf_list) => {
                    leaf_list.defaults.extend(deviate.defaults.iter().cloned());
                }
                NodeData::Choice(choice) if choice.default_name.is_none() => {
                    choice.default_name = Some(self.interner.intern(&deviate.defaults[0]));
                }
                _ => return Err("default already present or not applicable".into()),
            }
        }
        if let Some(config) = deviate.config {
            if node.config.is_some() {
                return Err("config already present".into());
            }
            node.config = Some(config);
        }
        if let Some(mandatory) = deviate.mandatory {
            if node.mandatory {
                return Err("mandatory already present".into());
            }
            node.mandatory = mandatory;
        }
        if deviate.min_elements.is_some() || deviate.max_elements.is_some() {
            let Some((min, max)) = node.element_bounds() else {
                return Err("min-elements/max-elements not applicable".into());
            };
            if (deviate.min_elements.is_some() && min != 0)
                || (deviate.max_elements.is_some() && max.is_some())
            {
                return Err("min-elements/max-elements already present".into());
            }
            node.set_element_bounds(deviate.min_elements, deviate.max_elements);
        }
        node.musts.extend(deviate.musts.iter().cloned());
        if !deviate.uniques.is_empty() {
            match &mut node.data {
                NodeData::List(list) => list.unique_specs.extend(deviate.uniques.iter().cloned()),
                _ => return Err("unique is only valid on lists".into()),
            }
        }
        Ok(())
    }

    fn deviate_replace(
        &mut self,
        target: NodeId,
        deviate: &Deviate,
    ) -> std::result::Result<(), String> {
        let node = &mut self.nodes[target.index()];
        if let Some(ty) = deviate.ty {
            match &mut node.data {
                NodeData::Leaf(leaf) => leaf.ty = ty,
                NodeData::LeafList(leaf_list) => leaf_list.ty = ty,
                _ => return Err("type is only valid on leaves and leaf-lists".into()),
            }
        }
        if let Some(units) = &deviate.units {
            match &mut node.data {
                NodeData::Leaf(leaf) if leaf.units.is_some() => leaf.units = Some(units.clone()),
                NodeData::LeafList(leaf_list) if leaf_list.units.is_some() => {
                    leaf_list.units = Some(units.clone())
                }
                _ => return Err("no units to replace".into()),
            }
        }
        if let Some(default) = deviate.defaults.first() {
            match &mut node.data {
                NodeData::Leaf(leaf) if leaf.default.is_some() => leaf.default = Some(default.clone()),
                NodeData::Choice(choice) if choice.default_name.is_some() => {
                    choice.default_name = Some(self.interner.intern(default));
                    choice.default_case = None;
                }
                _ => return Err("no default to replace".into()),
            }
        }
        if let Some(config) = deviate.config {
            node.config = Some(config);
        }
        if let Some(mandatory) = deviate.mandatory {
            node.mandatory = mandatory;
        }
        if deviate.min_elements.is_some() || deviate.max_elements.is_some() {
            if node.element_bounds().is_none() {
                return Err("min-elements/max-elements not applicable".into());
            }
            node.set_element_bounds(deviate.min_elements, deviate.max_elements);
        }
        Ok(())
    }

    fn deviate_delete(&mut self, target: NodeId, deviate: &Deviate) -> std::result::Result<(), String> {
        let node = self.node_mut(target);
        if let Some(units) = &deviate.units {
            let slot = match &mut node.data {
                NodeData::Leaf(leaf) => &mut leaf.units,
                NodeData::LeafList(leaf_list) => &mut leaf_list.units,
                _ => return Err("units not applicable".into()),
            };
            if slot.as_ref() != Some(units) {
                return Err(format!("units \"{}\" not present", units));
            }
            *slot = None;
        }
        for default in &deviate.defaults {
            match &mut node.data {
                NodeData::Leaf(leaf) if leaf.default.as_ref() == Some(default) => leaf.default = None,
                NodeData::LeafList(leaf_list) => {
                    let pos = leaf_list
                        .defaults
                        .iter()
                        .position(|d| d == default)
                        .ok_or_else(|| format!("default \"{}\" not present", default))?;
                    leaf_list.defaults.remove(pos);
                }
                NodeData::Choice(choice)
                    if choice.default_name.as_ref().is_some_and(|d| d == default.as_str()) =>
                {
                    choice.default_name = None;
                    choice.default_case = None;
                }
                _ => return Err(format!("default \"{}\" not present", default)),
            }
        }
        for must in &deviate.musts {
            let pos = node
                .musts
                .iter()
                .position(|m| m.expr == must.expr)
                .ok_or_else(|| format!("must \"{}\" not present", must.expr))?;
            node.musts.remove(pos);
        }
        if !deviate.uniques.is_empty() {
            let NodeData::List(list) = &mut node.data else {
                return Err("unique is only valid on lists".into());
            };
            for unique in &deviate.uniques {
                let pos = list
                    .unique_specs
                    .iter()
                    .position(|u| u.split_whitespace().eq(unique.split_whitespace()))
                    .ok_or_else(|| format!("unique \"{}\" not present", unique))?;
                list.unique_specs.remove(pos);
                if pos < list.uniques.len() {
                    list.uniques.remove(pos);
                }
            }
        }
        if node.kind() == NodeKind::Leaf && deviate.mandatory.is_some() {
            return Err("mandatory cannot be deleted".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with_default() -> (Context, ModuleId, NodeId) {
        let mut ctx = Context::new();
        let m = ctx.add_module("m", "m").unwrap();
        let c = ctx.add_container(m, None, "c");
        let leaf = ctx.add_leaf(m, Some(c), "l", "string");
        if let NodeData::Leaf(data) = &mut ctx.node_mut(leaf).data {
            data.default = Some("x".into());
        }
        let dev = ctx.add_module("dev", "d").unwrap();
        (ctx, dev, leaf)
    }

    #[test]
    fn test_replace_and_revert() {
        let (mut ctx, dev, leaf) = leaf_with_default();
        let mut replace = Deviate::new(DeviateKind::Replace);
        replace.defaults.push("y".into());
        let index = ctx.add_deviation(dev, "/m:c/m:l", vec![replace]);
        ctx.module_mut(dev).deviations[index].target = Some(leaf);

        ctx.apply_deviation(dev, index).unwrap();
        assert_eq!(ctx.node(leaf).defaults(), vec!["y"]);
        ctx.set_deviations_enabled(dev, false).unwrap();
        assert_eq!(ctx.node(leaf).defaults(), vec!["x"]);
        ctx.set_deviations_enabled(dev, true).unwrap();
        assert_eq!(ctx.node(leaf).defaults(), vec!["y"]);
    }

    #[test]
    fn test_not_supported_unlinks_and_restores_position() {
        let (mut ctx, dev, leaf) = leaf_with_default();
        let parent = ctx.node(leaf).parent.unwrap();
        let index = ctx.add_deviation(dev, "/m:c/m:l", vec![Deviate::new(DeviateKind::NotSupported)]);
        ctx.module_mut(dev).deviations[index].target = Some(leaf);

        ctx.apply_deviation(dev, index).unwrap();
        assert!(ctx.node(parent).children.is_empty());
        ctx.revert_deviation(dev, index);
        assert_eq!(ctx.node(parent).children, vec![leaf]);
    }

    #[test]
    fn test_add_existing_default_fails_and_leaves_node() {
        let (mut ctx, dev, leaf) = leaf_with_default();
        let mut add = Deviate::new(DeviateKind::Add);
        add.defaults.push("z".into());
        let index = ctx.add_deviation(dev, "/m:c/m:l", vec![add]);
        ctx.module_mut(dev).deviations[index].target = Some(leaf);

        assert!(ctx.apply_deviation(dev, index).is_err());
        assert_eq!(ctx.node(leaf).defaults(), vec!["x"]);
        assert!(!ctx.module(dev).deviations[index].is_applied());
    }
}
