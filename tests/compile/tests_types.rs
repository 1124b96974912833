//! Type derivation, restrictions and default values.

use rstest::rstest;
use yanglink::error::CompileError;
use yanglink::schema::{BaseType, BitValue, EnumValue, Pattern};
use yanglink::{Context, ModuleId, NodeId, TypeId, compile};

use crate::helpers::schema_fixtures::{leafref, set_default};

fn leaf_with_default(type_name: &str, value: &str) -> (Context, ModuleId, NodeId, TypeId) {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let leaf = ctx.add_leaf(m, None, "value", type_name);
    let ty = ctx.node(leaf).type_id().unwrap();
    set_default(&mut ctx, leaf, value);
    (ctx, m, leaf, ty)
}

/// Extra statements a built-in type needs before it is usable.
fn complete(ctx: &mut Context, ty: TypeId) {
    let name = ctx.type_spec(ty).name.to_string();
    match name.as_str() {
        "decimal64" => ctx.type_mut(ty).restrictions.fraction_digits = Some(2),
        "bits" => {
            for bit in ["read", "write"] {
                let name = ctx.intern(bit);
                ctx.type_mut(ty).restrictions.bits.push(BitValue { name, position: None });
            }
        }
        "enumeration" => {
            for label in ["up", "down"] {
                let name = ctx.intern(label);
                ctx.type_mut(ty).restrictions.enums.push(EnumValue { name, value: None });
            }
        }
        "union" => {
            ctx.add_union_member(ty, "int8");
            ctx.add_union_member(ty, "boolean");
        }
        _ => {}
    }
}

#[rstest]
#[case("int8", "-128", true)]
#[case("int8", "-129", false)]
#[case("uint64", "18446744073709551615", true)]
#[case("uint64", "-1", false)]
#[case("decimal64", "3.14", true)]
#[case("decimal64", "3.141", false)]
#[case("bits", "read write", true)]
#[case("bits", "read read", false)]
#[case("bits", "execute", false)]
#[case("enumeration", "down", true)]
#[case("enumeration", "sideways", false)]
#[case("union", "true", true)]
#[case("union", "-5", true)]
#[case("union", "maybe", false)]
#[case("binary", "aGVsbG8=", true)]
#[case("binary", "abc", false)]
#[case("instance-identifier", "/m:value", true)]
fn test_default_against_builtin(#[case] type_name: &str, #[case] value: &str, #[case] valid: bool) {
    let (mut ctx, m, _, ty) = leaf_with_default(type_name, value);
    complete(&mut ctx, ty);
    match compile(&mut ctx, m) {
        Ok(_) => assert!(valid, "{type_name} accepted {value:?}"),
        Err(CompileError::Constraint(_)) => assert!(!valid, "{type_name} rejected {value:?}"),
        Err(other) => panic!("unexpected error for {type_name} {value:?}: {other}"),
    }
}

#[rstest]
#[case("enumeration")]
#[case("bits")]
#[case("leafref")]
#[case("identityref")]
#[case("union")]
#[case("decimal64")]
fn test_builtin_without_required_statements(#[case] type_name: &str) {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_leaf(m, None, "value", type_name);
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_restriction_on_wrong_base() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let leaf = ctx.add_leaf(m, None, "flag", "boolean");
    let ty = ctx.node(leaf).type_id().unwrap();
    ctx.type_mut(ty).restrictions.range = Some("0..1".into());
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_derived_enumeration_must_be_subset() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let state = ctx.add_typedef(m, None, "state", "enumeration");
    let state_ty = ctx.typedef(state).ty;
    complete(&mut ctx, state_ty);
    let leaf = ctx.add_leaf(m, None, "s", "state");
    let ty = ctx.node(leaf).type_id().unwrap();
    let name = ctx.intern("testing");
    ctx.type_mut(ty).restrictions.enums.push(EnumValue { name, value: None });

    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_typedef_default_is_inherited_and_checked() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let mtu = ctx.add_typedef(m, None, "mtu", "uint16");
    ctx.typedef_mut(mtu).default = Some("1500".into());
    let jumbo = ctx.add_leaf(m, None, "jumbo", "mtu");
    let ty = ctx.node(jumbo).type_id().unwrap();
    ctx.type_mut(ty).restrictions.range = Some("9000..9216".into());

    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_leafref_default_checked_against_target() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let c = ctx.add_container(m, None, "c");
    ctx.add_leaf(m, Some(c), "size", "uint8");
    let r = leafref(&mut ctx, m, Some(c), "size-ref", "../size");
    set_default(&mut ctx, r, "300");

    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_every_leaf_list_default_is_checked() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let list = ctx.add_leaf_list(m, None, "ports", "uint8");
    set_default(&mut ctx, list, "22");
    set_default(&mut ctx, list, "443");
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_scoped_typedef_shadows_module_typedef() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_typedef(m, None, "counter", "uint32");
    let c = ctx.add_container(m, None, "stats");
    let scoped = ctx.add_typedef(m, Some(c), "counter", "uint64");
    let leaf = ctx.add_leaf(m, Some(c), "packets", "counter");

    compile(&mut ctx, m).unwrap();
    let ty = ctx.node(leaf).type_id().unwrap();
    assert_eq!(ctx.type_spec(ty).base, Some(BaseType::Uint64));
    assert_eq!(ctx.type_spec(ty).derived_from, Some(scoped));
}

#[rstest]
#[case(Pattern::new("[0-9]+"), "8080", true)]
#[case(Pattern::new("[0-9]+"), "abc", false)]
#[case(Pattern::new("[0-9]+"), "80a", false)]
#[case(Pattern::inverted("[xX][mM][lL].*"), "config", true)]
#[case(Pattern::inverted("[xX][mM][lL].*"), "xml-config", false)]
fn test_default_against_pattern(#[case] pattern: Pattern, #[case] value: &str, #[case] valid: bool) {
    let (mut ctx, m, _, ty) = leaf_with_default("string", value);
    ctx.type_mut(ty).restrictions.patterns.push(pattern);
    match compile(&mut ctx, m) {
        Ok(_) => assert!(valid, "accepted {value:?}"),
        Err(CompileError::Constraint(_)) => assert!(!valid, "rejected {value:?}"),
        Err(other) => panic!("unexpected error for {value:?}: {other}"),
    }
}

#[rstest]
#[case("abc", None)]
#[case("abcd", Some(".{1,3}"))]
#[case("ABC", Some("[a-z]+"))]
fn test_typedef_patterns_all_apply(#[case] value: &str, #[case] failing: Option<&str>) {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let word = ctx.add_typedef(m, None, "word", "string");
    let word_ty = ctx.typedef(word).ty;
    ctx.type_mut(word_ty).restrictions.patterns.push(Pattern::new("[a-z]+"));
    let leaf = ctx.add_leaf(m, None, "name", "word");
    let ty = ctx.node(leaf).type_id().unwrap();
    ctx.type_mut(ty).restrictions.patterns.push(Pattern::new(".{1,3}"));
    set_default(&mut ctx, leaf, value);

    match (compile(&mut ctx, m), failing) {
        (Ok(_), None) => {}
        (Err(CompileError::Constraint(message)), Some(pattern)) => {
            assert!(message.contains(pattern), "{message}");
        }
        (other, _) => panic!("unexpected outcome for {value:?}: {other:?}"),
    }
}

#[test]
fn test_inherited_default_checked_against_narrowing_pattern() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let host = ctx.add_typedef(m, None, "host", "string");
    ctx.typedef_mut(host).default = Some("localhost".into());
    let leaf = ctx.add_leaf(m, None, "address", "host");
    let ty = ctx.node(leaf).type_id().unwrap();
    ctx.type_mut(ty).restrictions.patterns.push(Pattern::new("[0-9.]+"));

    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_invalid_pattern_rejected_without_default() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let leaf = ctx.add_leaf(m, None, "name", "string");
    let ty = ctx.node(leaf).type_id().unwrap();
    ctx.type_mut(ty).restrictions.patterns.push(Pattern::new("[a-z"));

    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}
