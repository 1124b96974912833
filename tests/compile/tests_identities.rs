//! Identity derivation across modules and identityref values.

use yanglink::error::CompileError;
use yanglink::{CompileOptions, Context, compile};

use crate::helpers::schema_fixtures::{compile_modules, identityref, set_default};

#[test]
fn test_derivation_across_imports() {
    let mut ctx = Context::new();
    let types = ctx.add_module("iana-if-type", "ianaift").unwrap();
    let base = ctx.add_module("interfaces", "if").unwrap();
    ctx.add_import(types, base, "if");
    let interface_type = ctx.add_identity(base, "interface-type", &[]);
    let ethernet = ctx.add_identity(types, "ethernet-csmacd", &["iana-interface-type"]);
    let iana = ctx.add_identity(types, "iana-interface-type", &["if:interface-type"]);

    let (result, _) = compile_modules(&mut ctx, CompileOptions::default(), &[types]);
    result.unwrap();
    assert!(ctx.identity_derives_from(ethernet, interface_type));
    assert!(ctx.identity_derives_from(iana, interface_type));
    assert!(ctx.identity_derives_from(ethernet, iana));
    assert!(!ctx.identity_derives_from(interface_type, ethernet));
    assert_eq!(ctx.identity(interface_type).derived.len(), 2);
}

#[test]
fn test_three_identity_cycle() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_identity(m, "a", &["c"]);
    ctx.add_identity(m, "b", &["a"]);
    ctx.add_identity(m, "c", &["b"]);

    assert!(matches!(
        compile(&mut ctx, m),
        Err(CompileError::Cycle { kind: "identity", .. })
    ));
}

#[test]
fn test_identityref_default_must_derive_from_base() {
    let mut ctx = Context::new();
    let m = ctx.add_module("crypto", "c").unwrap();
    ctx.add_identity(m, "algorithm", &[]);
    ctx.add_identity(m, "aes", &["algorithm"]);
    ctx.add_identity(m, "unrelated", &[]);
    let good = identityref(&mut ctx, m, None, "cipher", "algorithm");
    set_default(&mut ctx, good, "c:aes");
    compile(&mut ctx, m).unwrap();

    let mut ctx = Context::new();
    let m = ctx.add_module("crypto", "c").unwrap();
    ctx.add_identity(m, "algorithm", &[]);
    ctx.add_identity(m, "unrelated", &[]);
    let bad = identityref(&mut ctx, m, None, "cipher", "algorithm");
    set_default(&mut ctx, bad, "unrelated");
    assert!(matches!(compile(&mut ctx, m), Err(CompileError::Constraint(_))));
}

#[test]
fn test_identityref_links_bases() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let leaf = identityref(&mut ctx, m, None, "kind", "animal");
    let animal = ctx.add_identity(m, "animal", &[]);

    compile(&mut ctx, m).unwrap();
    let ty = ctx.node(leaf).type_id().unwrap();
    assert_eq!(ctx.type_spec(ty).identities, vec![animal]);
}
