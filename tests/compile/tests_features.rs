//! if-feature linking and evaluation after compilation.

use rstest::rstest;
use yanglink::error::CompileError;
use yanglink::schema::{FeatureOwner, YangVersion};
use yanglink::{Context, ModuleId, NodeId, compile};

fn featured(condition: &str) -> (Context, ModuleId, NodeId) {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_feature(m, "f1");
    ctx.add_feature(m, "f2");
    ctx.add_feature(m, "f3");
    let leaf = ctx.add_leaf(m, None, "x", "string");
    ctx.add_if_feature(FeatureOwner::Node(leaf), condition);
    (ctx, m, leaf)
}

#[rstest]
#[case("f1", &[], false)]
#[case("f1", &["f1"], true)]
#[case("not not f1", &["f1"], true)]
#[case("not not f1", &[], false)]
#[case("not f1 and (f2 or f3)", &["f3"], true)]
#[case("not f1 and (f2 or f3)", &["f1", "f2"], false)]
#[case("f1 or f2 and f3", &["f1"], true)]
#[case("f1 or f2 and f3", &["f2"], false)]
fn test_node_enabled_by_features(#[case] condition: &str, #[case] enabled: &[&str], #[case] expected: bool) {
    let (mut ctx, m, leaf) = featured(condition);
    compile(&mut ctx, m).unwrap();
    for feature in enabled {
        ctx.enable_feature(m, feature).unwrap();
    }
    assert_eq!(ctx.is_node_enabled(leaf), expected);
}

#[test]
fn test_compiled_form_is_packed() {
    let (mut ctx, m, leaf) = featured("not f1 and (f2 or f3)");
    compile(&mut ctx, m).unwrap();
    let expr = &ctx.if_features(FeatureOwner::Node(leaf))[0];
    assert!(expr.is_resolved());
    assert_eq!(expr.len(), 6);
    assert_eq!(expr.packed().len(), 2);
    assert_eq!(expr.features().len(), 3);
}

#[test]
fn test_extended_syntax_needs_version_1_1() {
    let (mut ctx, m, _) = featured("not f1");
    ctx.module_mut(m).version = YangVersion::V1_0;
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::IfFeature { .. })));
}

#[test]
fn test_feature_disabled_by_its_own_condition() {
    let (mut ctx, m, leaf) = featured("f2");
    let f2 = ctx.module(m).features[1];
    ctx.add_if_feature(FeatureOwner::Feature(f2), "f1");
    compile(&mut ctx, m).unwrap();

    ctx.enable_feature(m, "f2").unwrap();
    assert!(!ctx.is_feature_enabled(f2));
    assert!(!ctx.is_node_enabled(leaf));
    ctx.enable_feature(m, "f1").unwrap();
    assert!(ctx.is_node_enabled(leaf));
}

#[test]
fn test_undefined_feature_is_unresolved() {
    let (mut ctx, m, _) = featured("f9");
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Unresolved { count: 1 })));
}

#[test]
fn test_condition_on_ancestor() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_feature(m, "routing");
    let c = ctx.add_container(m, None, "routing");
    let leaf = ctx.add_leaf(m, Some(c), "router-id", "string");
    ctx.add_if_feature(FeatureOwner::Node(c), "routing");

    compile(&mut ctx, m).unwrap();
    assert!(!ctx.is_node_enabled(leaf));
    ctx.enable_all_features(m);
    assert!(ctx.is_node_enabled(leaf));
}
