//! Schema builders shared by the integration tests.

use yanglink::resolve::{Siblings, WalkMode};
use yanglink::schema::NodeData;
use yanglink::{CompileOptions, CompileReport, Compiler, Context, Diagnostic, ModuleId, NodeId, Result};

/// Runs one compilation over `modules` and hands back every diagnostic,
/// whether the run succeeded or not.
pub fn compile_modules(
    ctx: &mut Context,
    options: CompileOptions,
    modules: &[ModuleId],
) -> (Result<CompileReport>, Vec<Diagnostic>) {
    let mut compiler = Compiler::new(ctx, options);
    for &module in modules {
        if let Err(error) = compiler.register_module(module) {
            return (Err(error), compiler.diagnostics().diagnostics().to_vec());
        }
    }
    let result = compiler.resolve();
    (result, compiler.diagnostics().diagnostics().to_vec())
}

pub fn set_default(ctx: &mut Context, leaf: NodeId, value: &str) {
    match &mut ctx.node_mut(leaf).data {
        NodeData::Leaf(data) => data.default = Some(value.to_string()),
        NodeData::LeafList(data) => data.defaults.push(value.to_string()),
        other => panic!("no default on {:?}", other.kind()),
    }
}

pub fn leafref(ctx: &mut Context, module: ModuleId, parent: Option<NodeId>, name: &str, path: &str) -> NodeId {
    let leaf = ctx.add_leaf(module, parent, name, "leafref");
    let ty = ctx.node(leaf).type_id().unwrap();
    let path = ctx.intern(path);
    ctx.type_mut(ty).restrictions.path = Some(path);
    leaf
}

pub fn identityref(ctx: &mut Context, module: ModuleId, parent: Option<NodeId>, name: &str, base: &str) -> NodeId {
    let leaf = ctx.add_leaf(module, parent, name, "identityref");
    let ty = ctx.node(leaf).type_id().unwrap();
    let base = ctx.intern(base);
    ctx.type_mut(ty).restrictions.bases.push(base);
    leaf
}

/// Sorted `path: base-type` lines for every data node of `module`.
pub fn summarize(ctx: &Context, module: ModuleId) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = ctx.visible_children(Siblings::Module(module), WalkMode::Data);
    while let Some(node) = pending.pop() {
        let base = ctx
            .node(node)
            .type_id()
            .and_then(|ty| ctx.type_spec(ty).base)
            .map(|base| base.as_str())
            .unwrap_or("-");
        lines.push(format!("{}: {}", ctx.schema_path(node), base));
        pending.extend(ctx.visible_children(Siblings::Node(node), WalkMode::Data));
    }
    lines.sort();
    lines
}
