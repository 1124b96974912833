//! Deviations applied by the compiler.

use yanglink::error::CompileError;
use yanglink::resolve::{Siblings, WalkMode};
use yanglink::schema::{Deviate, DeviateKind, Must};
use yanglink::{CompileOptions, Context, ModuleId, NodeId};

use crate::helpers::schema_fixtures::{compile_modules, set_default};

struct Fixture {
    ctx: Context,
    base: ModuleId,
    dev: ModuleId,
    users: NodeId,
    timeout: NodeId,
}

fn fixture() -> Fixture {
    let mut ctx = Context::new();
    let base = ctx.add_module("system", "sys").unwrap();
    let system = ctx.add_container(base, None, "system");
    let users = ctx.add_list(base, Some(system), "user", Some("name"));
    ctx.add_leaf(base, Some(users), "name", "string");
    ctx.add_leaf(base, Some(users), "uid", "uint32");
    let timeout = ctx.add_leaf(base, Some(system), "timeout", "uint16");

    let dev = ctx.add_module("vendor-deviations", "vd").unwrap();
    ctx.add_import(dev, base, "sys");
    Fixture {
        ctx,
        base,
        dev,
        users,
        timeout,
    }
}

#[test]
fn test_added_unique_is_linked() {
    let mut f = fixture();
    let mut add = Deviate::new(DeviateKind::Add);
    add.uniques.push("uid".into());
    f.ctx.add_deviation(f.dev, "/sys:system/sys:user", vec![add]);

    let (result, _) = compile_modules(&mut f.ctx, CompileOptions::default(), &[f.base, f.dev]);
    result.unwrap();
    let list = f.ctx.node(f.users).list().unwrap();
    assert_eq!(list.uniques.len(), 1);
    assert_eq!(f.ctx.schema_path(list.uniques[0][0]), "/system:system/system:user/system:uid");
}

#[test]
fn test_added_default_is_checked() {
    let mut f = fixture();
    let mut add = Deviate::new(DeviateKind::Add);
    add.defaults.push("forever".into());
    f.ctx.add_deviation(f.dev, "/sys:system/sys:timeout", vec![add]);

    let (result, _) = compile_modules(&mut f.ctx, CompileOptions::default(), &[f.base, f.dev]);
    assert!(matches!(result, Err(CompileError::Constraint(_))));
}

#[test]
fn test_deleting_missing_default_fails() {
    let mut f = fixture();
    let mut delete = Deviate::new(DeviateKind::Delete);
    delete.defaults.push("30".into());
    f.ctx.add_deviation(f.dev, "/sys:system/sys:timeout", vec![delete]);

    let (result, _) = compile_modules(&mut f.ctx, CompileOptions::default(), &[f.base, f.dev]);
    assert!(matches!(result, Err(CompileError::Constraint(_))));
    assert!(f.ctx.node(f.timeout).defaults().is_empty());
}

#[test]
fn test_delete_then_add_default() {
    let mut f = fixture();
    set_default(&mut f.ctx, f.timeout, "30");
    let mut delete = Deviate::new(DeviateKind::Delete);
    delete.defaults.push("30".into());
    let mut add = Deviate::new(DeviateKind::Add);
    add.defaults.push("60".into());
    add.musts.push(Must::new(". >= 10"));
    f.ctx.add_deviation(f.dev, "/sys:system/sys:timeout", vec![delete, add]);

    let (result, _) = compile_modules(&mut f.ctx, CompileOptions::default(), &[f.base, f.dev]);
    result.unwrap();
    assert_eq!(f.ctx.node(f.timeout).defaults(), vec!["60"]);
    assert_eq!(f.ctx.node(f.timeout).musts.len(), 1);
}

#[test]
fn test_deviations_can_be_left_out() {
    let mut f = fixture();
    f.ctx.add_deviation(
        f.dev,
        "/sys:system/sys:timeout",
        vec![Deviate::new(DeviateKind::NotSupported)],
    );

    let options = CompileOptions::default().apply_deviations(false);
    let (result, _) = compile_modules(&mut f.ctx, options, &[f.base, f.dev]);
    result.unwrap();
    let system = f.ctx.schema_parent(f.timeout).unwrap();
    assert_eq!(
        f.ctx.find_child(Siblings::Node(system), f.base, "timeout", WalkMode::Data),
        Some(f.timeout)
    );
    assert!(!f.ctx.module(f.dev).deviations[0].is_applied());
}

#[test]
fn test_missing_deviation_target_is_unresolved() {
    let mut f = fixture();
    f.ctx.add_deviation(
        f.dev,
        "/sys:system/sys:nonexistent",
        vec![Deviate::new(DeviateKind::NotSupported)],
    );

    let (result, _) = compile_modules(&mut f.ctx, CompileOptions::default(), &[f.base, f.dev]);
    assert_eq!(result.unwrap_err(), CompileError::Unresolved { count: 1 });
}
