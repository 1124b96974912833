//! Identity derivation and feature references.

use rustc_hash::FxHashSet;

use crate::base::{FeatureId, IdentityId, ModuleId, Name};
use crate::error::CompileError;
use crate::resolve::{Resolve, Unresolved};
use crate::schema::FeatureOwner;

use super::Compiler;

impl Compiler<'_> {
    /// Link one `base` of `identity`. A base is only linked once its own
    /// bases are, so the transitive `derived` sets can be extended upwards
    /// in one pass.
    pub(crate) fn link_identity_base(&mut self, identity: IdentityId, index: usize) -> Resolve<()> {
        let ident = self.ctx.identity(identity);
        if ident.bases.get(index).copied().flatten().is_some() {
            return Ok(());
        }
        let Some(name) = ident.base_names.get(index).cloned() else {
            return Ok(());
        };
        let module = ident.module;
        let base = self.ctx.find_identity(module, &name)?;

        if base == identity || self.reaches_identity(base, identity) {
            return Err(CompileError::cycle("identity", self.ctx.identity(identity).name.as_str()).into());
        }
        if self.ctx.identity(base).pending_bases() > 0 {
            return Err(Unresolved::forward(format!(
                "identity base \"{name}\" is not derived yet"
            )));
        }

        self.ctx.identity_mut(identity).bases[index] = Some(base);

        let mut derived = vec![identity];
        derived.extend(self.ctx.identity(identity).derived.iter().copied());
        for ancestor in self.ancestors(base) {
            let entry = &mut self.ctx.identity_mut(ancestor).derived;
            for &d in &derived {
                if !entry.contains(&d) {
                    entry.push(d);
                }
            }
        }
        tracing::trace!(identity = %self.ctx.identity(identity).name, base = %name, "identity base linked");
        Ok(())
    }

    /// `base` and every identity it derives from.
    fn ancestors(&self, base: IdentityId) -> Vec<IdentityId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![base];
        let mut ancestors = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            ancestors.push(id);
            stack.extend(self.ctx.identity(id).bases.iter().flatten().copied());
        }
        ancestors
    }

    /// Whether `from` reaches `target` through base statements, linked or not.
    fn reaches_identity(&self, from: IdentityId, target: IdentityId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            let ident = self.ctx.identity(id);
            for (name, base) in ident.base_names.iter().zip(&ident.bases) {
                let next = match base {
                    Some(base) => Some(*base),
                    None => self.ctx.find_identity(ident.module, name).ok(),
                };
                stack.extend(next);
            }
        }
        false
    }

    pub(crate) fn link_if_feature(
        &mut self,
        module: ModuleId,
        owner: FeatureOwner,
        expr: usize,
        slot: usize,
        name: &Name,
    ) -> Resolve<()> {
        let feature = self.ctx.find_feature(module, name)?;
        if owner == FeatureOwner::Feature(feature) {
            return Err(CompileError::cycle("feature", name.as_str()).into());
        }
        if let Some(expr) = self.ctx.if_features_mut(owner).get_mut(expr) {
            expr.set_feature(slot, feature);
        }
        Ok(())
    }

    /// Reject a feature whose `if-feature`s lead back to itself.
    pub(crate) fn check_feature_cycle(&mut self, feature: FeatureId) -> Resolve<()> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![feature];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for expr in &self.ctx.feature(id).if_features {
                if !expr.is_resolved() {
                    return Err(Unresolved::forward(format!(
                        "if-feature \"{}\" of feature \"{}\" is not linked yet",
                        expr.text(),
                        self.ctx.feature(id).name
                    )));
                }
                for &next in expr.features().iter().flatten() {
                    if next == feature {
                        let name = self.ctx.feature(feature).name.as_str();
                        return Err(CompileError::cycle("feature", name).into());
                    }
                    stack.push(next);
                }
            }
        }
        Ok(())
    }
}
