//! `must` and `when` checks through a pluggable XPath evaluator.
//!
//! The compiler does not evaluate XPath itself. Once every name is linked it
//! hands each expression to an [`XPathEvaluator`], which may reject it or
//! report the nodes it depends on.

use crate::base::NodeId;
use crate::diagnostics::{Diagnostic, codes};
use crate::error::CompileError;
use crate::resolve::Resolve;
use crate::schema::Context;

use super::Compiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XPathContextKind {
    When,
    Must,
}

/// What an expression evaluated to at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathValue {
    Boolean(bool),
    /// The schema nodes the expression depends on.
    NodeSet(Vec<NodeId>),
}

pub trait XPathEvaluator {
    /// Check `expr`, written on `node`, against the compiled schema.
    fn evaluate(
        &self,
        ctx: &Context,
        expr: &str,
        node: NodeId,
        kind: XPathContextKind,
    ) -> Result<XPathValue, String>;
}

impl<F> XPathEvaluator for F
where
    F: Fn(&Context, &str, NodeId, XPathContextKind) -> Result<XPathValue, String>,
{
    fn evaluate(
        &self,
        ctx: &Context,
        expr: &str,
        node: NodeId,
        kind: XPathContextKind,
    ) -> Result<XPathValue, String> {
        self(ctx, expr, node, kind)
    }
}

impl Compiler<'_> {
    pub(crate) fn check_xpath(&mut self, node: NodeId) -> Resolve<()> {
        let Some(evaluator) = self.xpath.as_deref() else {
            return Ok(());
        };
        let ctx: &Context = self.ctx;
        let n = ctx.node(node);
        let exprs = n
            .when
            .iter()
            .map(|when| (when.expr.as_str(), XPathContextKind::When))
            .chain(n.musts.iter().map(|must| (must.expr.as_str(), XPathContextKind::Must)));

        let config = ctx.is_config(node);
        let mut warnings = Vec::new();
        for (expr, kind) in exprs {
            let value = evaluator
                .evaluate(ctx, expr, node, kind)
                .map_err(|message| CompileError::XPath {
                    expr: expr.to_string(),
                    message,
                })?;
            if let XPathValue::NodeSet(nodes) = value {
                if let Some(&state) = nodes.iter().find(|&&dep| config && !ctx.is_config(dep)) {
                    warnings.push(
                        Diagnostic::warning(
                            codes::STATE_DATA_REFERENCE,
                            format!(
                                "\"{expr}\" on configuration node refers to state data \"{}\"",
                                ctx.schema_path(state)
                            ),
                        )
                        .with_module(ctx.module(n.module).name.clone())
                        .with_line(n.line)
                        .with_path(ctx.schema_path(node)),
                    );
                }
            }
        }
        for warning in warnings {
            self.warn(warning);
        }
        Ok(())
    }
}
