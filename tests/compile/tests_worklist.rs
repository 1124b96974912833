//! Fixed-point behavior of the worklist.

use rstest::rstest;
use yanglink::compile::{AddOutcome, ItemState, WorkItem, WorkKind};
use yanglink::diagnostics::codes;
use yanglink::error::CompileError;
use yanglink::{CompileOptions, Compiler, Context, ModuleId, NodeId, compile};

use crate::helpers::diagnostic_helpers::{assert_has_code, count_code};
use crate::helpers::schema_fixtures::compile_modules;

/// `t1 -> t2 -> ... -> tN -> uint8`, declared head first, and a leaf of type `t1`.
fn typedef_chain(length: usize) -> (Context, ModuleId, NodeId) {
    let mut ctx = Context::new();
    let m = ctx.add_module("chain", "c").unwrap();
    for i in 1..=length {
        let parent = if i == length { "uint8".to_string() } else { format!("t{}", i + 1) };
        ctx.add_typedef(m, None, &format!("t{i}"), &parent);
    }
    let leaf = ctx.add_leaf(m, None, "value", "t1");
    (ctx, m, leaf)
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(9)]
fn test_chain_settles_within_bound(#[case] length: usize) {
    let (mut ctx, m, leaf) = typedef_chain(length);
    let report = compile(&mut ctx, m).unwrap();
    assert!(report.sweeps >= 1);
    assert!(report.sweeps <= length + 1, "{} sweeps for a chain of {}", report.sweeps, length);

    let ty = ctx.node(leaf).type_id().unwrap();
    assert!(ctx.type_spec(ty).is_resolved());
    assert_eq!(ctx.type_spec(ty).base.unwrap().as_str(), "uint8");
}

#[test]
fn test_sweep_limit() {
    let (mut ctx, m, _) = typedef_chain(6);
    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::new().max_sweeps(2), &[m]);
    assert_eq!(result.unwrap_err(), CompileError::SweepLimit { limit: 2 });
    assert_has_code(&diagnostics, codes::UNRESOLVED_REFERENCE);
}

#[test]
fn test_unresolved_reference_is_reported_once_settled() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let c = ctx.add_container(m, None, "c");
    ctx.add_leaf(m, Some(c), "a", "no-such-type");
    ctx.add_leaf(m, Some(c), "b", "string");

    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::default(), &[m]);
    assert_eq!(result.unwrap_err(), CompileError::Unresolved { count: 1 });
    assert_eq!(count_code(&diagnostics, codes::UNRESOLVED_REFERENCE), 1);

    let diagnostic = diagnostics
        .iter()
        .find(|d| d.code == codes::UNRESOLVED_REFERENCE)
        .unwrap();
    assert_eq!(diagnostic.module.as_ref().map(|m| m.as_str()), Some("m"));
    assert_eq!(diagnostic.path.as_deref(), Some("/m:c/m:a"));
    assert!(!ctx.module(m).compiled);
}

#[test]
fn test_unknown_prefix_fails_at_once() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_leaf(m, None, "a", "x:counter");

    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::default(), &[m]);
    assert!(matches!(result, Err(CompileError::NotFound { kind: "prefix", .. })));
    assert_has_code(&diagnostics, codes::UNDEFINED_REFERENCE);
}

#[test]
fn test_worklist_deduplicates_and_tracks_state() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let list = ctx.add_list(m, None, "l", Some("k"));
    ctx.add_leaf(m, Some(list), "k", "string");

    let mut compiler = Compiler::new(&mut ctx, CompileOptions::default());
    compiler.register_module(m).unwrap();
    let keys = WorkItem::new(m, WorkKind::ListKeys { node: list });
    assert_eq!(compiler.unres().state(&keys), Some(ItemState::Pending));
    assert_eq!(compiler.add(keys.clone()), AddOutcome::AlreadyQueued);

    let report = compiler.resolve().unwrap();
    assert_eq!(compiler.unres().state(&keys), Some(ItemState::Resolved));
    assert_eq!(compiler.unres().pending_count(), 0);
    assert_eq!(report.resolved, compiler.unres().len());
}

#[test]
fn test_registering_twice_queues_nothing_new() {
    let (mut ctx, m, _) = typedef_chain(3);
    let mut compiler = Compiler::new(&mut ctx, CompileOptions::default());
    compiler.register_module(m).unwrap();
    let queued = compiler.unres().len();
    compiler.register_module(m).unwrap();
    assert_eq!(compiler.unres().len(), queued);
}
