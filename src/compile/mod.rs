//! The deferred-resolution compiler.
//!
//! [`Compiler::register_module`] scans a module and queues one work item per
//! reference that is still text. [`Compiler::resolve`] then sweeps the
//! worklist until a sweep links nothing new:
//!
//! ```text
//! sweep:   uses → augments → everything else      (diagnostics suppressed)
//! fixed point reached:
//!   items still pending → dispatched once more with diagnostics on → error
//!   otherwise           → must/when checks → modules marked compiled
//! ```
//!
//! A resolver answers `Ok`, a forward reference (retry next sweep) or a fatal
//! error, which stops the compilation at once.

mod augment;
mod deviation;
mod identity;
mod list;
mod register;
mod types;
mod unres;
mod uses;
mod xpath;

pub use unres::{AddOutcome, DefaultOwner, ItemState, Unres, WorkItem, WorkKind};
pub use xpath::{XPathContextKind, XPathEvaluator, XPathValue};

use rustc_hash::FxHashSet;

use crate::base::{ModuleId, NodeId, TypeId};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
use crate::error::{CompileError, Result};
use crate::options::CompileOptions;
use crate::resolve::{Resolve, Unresolved};
use crate::schema::{Context, FeatureOwner, NodeData, TypeOwner};

/// Outcome of a successful [`Compiler::resolve`].
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    /// Sweeps that attempted at least one item.
    pub sweeps: usize,
    /// Items linked over the whole run.
    pub resolved: usize,
    /// Warnings raised while linking.
    pub warnings: Vec<Diagnostic>,
}

/// One compilation session over a [`Context`].
pub struct Compiler<'a> {
    ctx: &'a mut Context,
    options: CompileOptions,
    unres: Unres,
    diagnostics: DiagnosticCollector,
    xpath: Option<Box<dyn XPathEvaluator + 'a>>,
    /// Modules whose typedefs, identities, features and groupings are queued.
    definitions: FxHashSet<ModuleId>,
    /// Modules whose data tree, augments and deviations are queued.
    trees: FxHashSet<ModuleId>,
}

impl<'a> Compiler<'a> {
    pub fn new(ctx: &'a mut Context, options: CompileOptions) -> Self {
        Self {
            ctx,
            options,
            unres: Unres::new(),
            diagnostics: DiagnosticCollector::new(),
            xpath: None,
            definitions: FxHashSet::default(),
            trees: FxHashSet::default(),
        }
    }

    /// Evaluate `must`/`when` through `evaluator` once all names are linked.
    pub fn with_xpath(mut self, evaluator: impl XPathEvaluator + 'a) -> Self {
        self.xpath = Some(Box::new(evaluator));
        self
    }

    pub fn context(&self) -> &Context {
        &*self.ctx
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn unres(&self) -> &Unres {
        &self.unres
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    /// Queue an item by hand, e.g. for a reference created after registration.
    pub fn add(&mut self, item: WorkItem) -> AddOutcome {
        self.unres.add(item)
    }

    pub(crate) fn queue(&mut self, module: ModuleId, kind: WorkKind) -> AddOutcome {
        self.unres.add(WorkItem::new(module, kind))
    }

    /// Sweep the worklist to its fixed point.
    pub fn resolve(&mut self) -> Result<CompileReport> {
        let mut report = CompileReport::default();
        self.diagnostics.set_enabled(false);

        loop {
            let items = self.unres.snapshot(false);
            if items.is_empty() {
                break;
            }
            if let Some(limit) = self.options.max_sweeps {
                if report.sweeps >= limit {
                    self.diagnostics.set_enabled(true);
                    let error = CompileError::SweepLimit { limit };
                    self.diagnostics.add(Diagnostic::error(error.code(), error.to_string()));
                    return Err(error);
                }
            }
            report.sweeps += 1;

            let mut resolved = 0;
            for item in &items {
                match self.dispatch(item) {
                    Ok(()) => {
                        self.unres.mark_resolved(item);
                        resolved += 1;
                    }
                    Err(Unresolved::Forward(reason)) => {
                        tracing::trace!(kind = item.kind.as_str(), %reason, "deferred");
                    }
                    Err(Unresolved::Fatal(error)) => return Err(self.fatal(item, error)),
                }
            }
            report.resolved += resolved;
            tracing::debug!(sweep = report.sweeps, attempted = items.len(), resolved, "sweep finished");
            if resolved == 0 {
                break;
            }
        }

        self.diagnostics.set_enabled(true);
        let remaining = self.unres.snapshot(false);
        if !remaining.is_empty() {
            tracing::warn!(count = remaining.len(), "fixed point reached with pending references");
            let mut unresolved = 0;
            for item in &remaining {
                match self.dispatch(item) {
                    Ok(()) => {
                        self.unres.mark_resolved(item);
                        report.resolved += 1;
                    }
                    Err(Unresolved::Forward(reason)) => {
                        unresolved += 1;
                        let diagnostic = self.locate(item, Diagnostic::error(codes::UNRESOLVED_REFERENCE, reason));
                        self.diagnostics.add(diagnostic);
                    }
                    Err(Unresolved::Fatal(error)) => return Err(self.fatal(item, error)),
                }
            }
            if unresolved > 0 {
                return Err(CompileError::Unresolved { count: unresolved });
            }
        }

        for item in self.unres.snapshot(true) {
            match self.dispatch(&item) {
                Ok(()) => {
                    self.unres.mark_resolved(&item);
                    report.resolved += 1;
                }
                Err(Unresolved::Forward(reason)) => {
                    let error = CompileError::Constraint(reason);
                    return Err(self.fatal(&item, error));
                }
                Err(Unresolved::Fatal(error)) => return Err(self.fatal(&item, error)),
            }
        }

        let modules: Vec<ModuleId> = self.definitions.iter().copied().collect();
        for module in modules {
            for member in self.ctx.module_family(module) {
                self.ctx.module_mut(member).compiled = true;
            }
        }
        report.warnings = self
            .diagnostics
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .cloned()
            .collect();
        Ok(report)
    }

    fn dispatch(&mut self, item: &WorkItem) -> Resolve<()> {
        let module = item.module;
        let outcome = match &item.kind {
            WorkKind::TypeDerivation { ty } => self.resolve_type(*ty),
            WorkKind::TypeDefault { owner } => self.check_default(*owner),
            WorkKind::Leafref { ty, node } => self.link_leafref(*ty, *node),
            WorkKind::Identityref { ty } => self.link_identityref(*ty),
            WorkKind::IdentityBase { identity, index } => self.link_identity_base(*identity, *index),
            WorkKind::IfFeature {
                owner,
                expr,
                slot,
                name,
            } => self.link_if_feature(module, *owner, *expr, *slot, name),
            WorkKind::FeatureCheck { feature } => self.check_feature_cycle(*feature),
            WorkKind::Uses { node } => self.expand_uses(*node),
            WorkKind::ChoiceDefault { node } => self.link_choice_default(*node),
            WorkKind::ListKeys { node } => self.link_list_keys(*node),
            WorkKind::ListUnique { node } => self.link_unique(*node),
            WorkKind::Augment { node } => self.apply_augment(*node),
            WorkKind::Deviation { module, index } => self.link_deviation(*module, *index),
            WorkKind::XPath { node } => self.check_xpath(*node),
        };
        tracing::trace!(
            kind = item.kind.as_str(),
            module = %self.ctx.module(module).name,
            resolved = outcome.is_ok(),
            "dispatched"
        );
        outcome
    }

    fn fatal(&mut self, item: &WorkItem, error: CompileError) -> CompileError {
        self.diagnostics.set_enabled(true);
        let diagnostic = self.locate(item, Diagnostic::error(error.code(), error.to_string()));
        self.diagnostics.add(diagnostic);
        error
    }

    /// Attach the module, line and schema path of the item's subject.
    fn locate(&self, item: &WorkItem, diagnostic: Diagnostic) -> Diagnostic {
        let diagnostic = diagnostic.with_module(self.ctx.module(item.module).name.clone());
        let subject = match &item.kind {
            WorkKind::Augment { node } => {
                let augment = self.ctx.node(*node);
                let path = augment.augment().map(|a| a.target_path.to_string());
                let diagnostic = diagnostic.with_line(augment.line);
                return match path {
                    Some(path) => diagnostic.with_path(path),
                    None => diagnostic,
                };
            }
            WorkKind::Deviation { module, index } => {
                let path = self.ctx.module(*module).deviations[*index].target_path.to_string();
                return diagnostic.with_path(path);
            }
            WorkKind::Leafref { node, .. }
            | WorkKind::Uses { node }
            | WorkKind::ChoiceDefault { node }
            | WorkKind::ListKeys { node }
            | WorkKind::ListUnique { node }
            | WorkKind::XPath { node }
            | WorkKind::TypeDefault {
                owner: DefaultOwner::Node(node),
            }
            | WorkKind::IfFeature {
                owner: FeatureOwner::Node(node),
                ..
            } => Some(*node),
            WorkKind::TypeDerivation { ty } | WorkKind::Identityref { ty } => self.type_node(*ty),
            _ => None,
        };
        match subject {
            Some(node) => diagnostic
                .with_line(self.ctx.node(node).line)
                .with_path(self.ctx.schema_path(node)),
            None => diagnostic,
        }
    }

    /// The node a type is written on, through union members.
    pub(crate) fn type_node(&self, ty: TypeId) -> Option<NodeId> {
        let mut owner = self.ctx.type_spec(ty).owner;
        loop {
            match owner {
                TypeOwner::Node(node) => return Some(node),
                TypeOwner::Union(union) => owner = self.ctx.type_spec(union).owner,
                TypeOwner::Typedef(_) | TypeOwner::Deviation(_) => return None,
            }
        }
    }

    /// The grouping whose expansion waits for `ty`.
    pub(crate) fn type_grouping(&self, ty: TypeId) -> Option<NodeId> {
        let mut owner = self.ctx.type_spec(ty).owner;
        loop {
            match owner {
                TypeOwner::Node(node) => return self.ctx.enclosing_grouping(node),
                TypeOwner::Typedef(id) => {
                    let parent = self.ctx.typedef(id).parent?;
                    return if self.ctx.node(parent).grouping().is_some() {
                        Some(parent)
                    } else {
                        self.ctx.enclosing_grouping(parent)
                    };
                }
                TypeOwner::Union(union) => owner = self.ctx.type_spec(union).owner,
                TypeOwner::Deviation(_) => return None,
            }
        }
    }

    /// One more item must resolve before `grouping` may be copied.
    pub(crate) fn hold_grouping(&mut self, grouping: Option<NodeId>) {
        if let Some(grouping) = grouping {
            if let NodeData::Grouping(data) = &mut self.ctx.node_mut(grouping).data {
                data.pending += 1;
            }
        }
    }

    pub(crate) fn release_grouping(&mut self, grouping: Option<NodeId>) {
        if let Some(grouping) = grouping {
            if let NodeData::Grouping(data) = &mut self.ctx.node_mut(grouping).data {
                data.pending = data.pending.saturating_sub(1);
            }
        }
    }

    pub(crate) fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }
}

/// Register `module` and resolve everything it needs with default options.
pub fn compile(ctx: &mut Context, module: ModuleId) -> Result<CompileReport> {
    let mut compiler = Compiler::new(ctx, CompileOptions::default());
    compiler.register_module(module)?;
    compiler.resolve()
}
