//! Deviation linking.

use crate::base::ModuleId;
use crate::error::CompileError;
use crate::resolve::{NodeIdStart, Resolve, Unresolved};
use crate::schema::{BaseType, DeviateKind};

use super::unres::{DefaultOwner, WorkItem, WorkKind};
use super::Compiler;

impl Compiler<'_> {
    /// Resolve the target of a deviation and patch it.
    ///
    /// Statements the patch can invalidate (defaults, `unique`, a replaced
    /// leafref type, new `must`s) are queued again on the patched node.
    pub(crate) fn link_deviation(&mut self, module: ModuleId, index: usize) -> Resolve<()> {
        let deviation = &self.ctx.module(module).deviations[index];
        if deviation.is_applied() {
            return Ok(());
        }
        let path = deviation.target_path.clone();
        let types: Vec<_> = deviation.deviates.iter().filter_map(|d| d.ty).collect();
        let not_supported = deviation
            .deviates
            .iter()
            .any(|d| d.kind == DeviateKind::NotSupported);

        let target = self.ctx.resolve_schema_nodeid(&path, NodeIdStart::Root, module)?;
        if self.ctx.main_module(self.ctx.node(target).module) == self.ctx.main_module(module) {
            return Err(CompileError::constraint(format!(
                "deviation \"{path}\" targets its own module"
            ))
            .into());
        }
        if let Some(&ty) = types.iter().find(|&&ty| !self.ctx.type_spec(ty).is_resolved()) {
            return Err(Unresolved::forward(format!(
                "type \"{}\" of deviation \"{path}\" is not resolved yet",
                self.ctx.type_spec(ty).name
            )));
        }

        self.ctx.module_mut(module).deviations[index].target = Some(target);
        self.ctx.apply_deviation(module, index)?;
        tracing::debug!(target = %path, module = %self.ctx.module(module).name, "deviation applied");
        if not_supported {
            return Ok(());
        }

        let node_module = self.ctx.node(target).module;
        let n = self.ctx.node(target);
        let mut recheck = Vec::new();
        if n.type_id().is_some() && self.needs_default_check(target) {
            recheck.push(WorkKind::TypeDefault {
                owner: DefaultOwner::Node(target),
            });
        }
        if n.choice().is_some_and(|c| c.default_name.is_some()) {
            recheck.push(WorkKind::ChoiceDefault { node: target });
        }
        if n.list().is_some_and(|l| l.uniques.len() != l.unique_specs.len()) {
            recheck.push(WorkKind::ListUnique { node: target });
        }
        if let Some(ty) = n.type_id() {
            if types.contains(&ty) && self.ctx.type_spec(ty).base == Some(BaseType::LeafRef) {
                recheck.push(WorkKind::Leafref { ty, node: target });
            }
        }
        if self.options.check_xpath && !n.musts.is_empty() {
            recheck.push(WorkKind::XPath { node: target });
        }
        for kind in recheck {
            self.unres.reopen(WorkItem::new(node_module, kind));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::base::ModuleId;
    use crate::compile::{CompileReport, Compiler, compile};
    use crate::error::{CompileError, Result};
    use crate::options::CompileOptions;
    use crate::resolve::{Siblings, WalkMode};
    use crate::schema::{Context, Deviate, DeviateKind, NodeData};

    fn compile_all(ctx: &mut Context, modules: &[ModuleId]) -> Result<CompileReport> {
        let mut compiler = Compiler::new(ctx, CompileOptions::default());
        for &module in modules {
            compiler.register_module(module)?;
        }
        compiler.resolve()
    }

    fn base(ctx: &mut Context) -> (ModuleId, crate::base::NodeId) {
        let base = ctx.add_module("base", "b").unwrap();
        let system = ctx.add_container(base, None, "system");
        let leaf = ctx.add_leaf(base, Some(system), "mtu", "uint16");
        if let NodeData::Leaf(data) = &mut ctx.node_mut(leaf).data {
            data.default = Some("1500".into());
        }
        (base, leaf)
    }

    #[test]
    fn test_not_supported_removes_node() {
        let mut ctx = Context::new();
        let (b, leaf) = base(&mut ctx);
        let dev = ctx.add_module("dev", "d").unwrap();
        ctx.add_import(dev, b, "b");
        ctx.add_deviation(dev, "/b:system/b:mtu", vec![Deviate::new(DeviateKind::NotSupported)]);

        compile_all(&mut ctx, &[b, dev]).unwrap();
        let system = ctx.schema_parent(leaf).unwrap();
        assert!(ctx.find_child(Siblings::Node(system), b, "mtu", WalkMode::Data).is_none());

        ctx.set_deviations_enabled(dev, false).unwrap();
        assert!(ctx.find_child(Siblings::Node(system), b, "mtu", WalkMode::Data).is_some());
    }

    #[test]
    fn test_replaced_default_is_checked() {
        let mut ctx = Context::new();
        let (b, _) = base(&mut ctx);
        let dev = ctx.add_module("dev", "d").unwrap();
        ctx.add_import(dev, b, "b");
        let mut replace = Deviate::new(DeviateKind::Replace);
        replace.defaults.push("70000".into());
        ctx.add_deviation(dev, "/b:system/b:mtu", vec![replace]);

        assert!(matches!(compile_all(&mut ctx, &[b, dev]), Err(CompileError::Constraint(_))));
    }

    #[test]
    fn test_replaced_type() {
        let mut ctx = Context::new();
        let (b, leaf) = base(&mut ctx);
        let dev = ctx.add_module("dev", "d").unwrap();
        ctx.add_import(dev, b, "b");
        let mut replace = Deviate::new(DeviateKind::Replace);
        replace.ty = Some(ctx.new_type(dev, "uint32"));
        ctx.add_deviation(dev, "/b:system/b:mtu", vec![replace]);

        compile_all(&mut ctx, &[b, dev]).unwrap();
        let ty = ctx.node(leaf).type_id().unwrap();
        assert_eq!(ctx.type_spec(ty).name, "uint32");
        assert!(ctx.type_spec(ty).is_resolved());
    }

    #[test]
    fn test_own_module_cannot_be_deviated() {
        let mut ctx = Context::new();
        let (b, _) = base(&mut ctx);
        ctx.add_deviation(b, "/b:system/b:mtu", vec![Deviate::new(DeviateKind::NotSupported)]);

        assert!(matches!(compile(&mut ctx, b), Err(CompileError::Constraint(_))));
    }
}
