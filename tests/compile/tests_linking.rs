//! Linking a whole module: groupings, augments, keys and leafrefs together.

use rstest::rstest;
use yanglink::error::CompileError;
use yanglink::resolve::{Siblings, WalkMode};
use yanglink::schema::{NodeData, NodeKind};
use yanglink::{CompileOptions, Context, ModuleId, compile};

use crate::helpers::diagnostic_helpers::assert_no_errors;
use crate::helpers::schema_fixtures::{compile_modules, identityref, leafref, set_default, summarize};

fn typedefs(ctx: &mut Context, m: ModuleId) {
    let port = ctx.add_typedef(m, None, "port", "uint16");
    let ty = ctx.typedef(port).ty;
    ctx.type_mut(ty).restrictions.range = Some("1..65535".into());
    ctx.add_typedef(m, None, "port-alias", "port");
}

fn identities(ctx: &mut Context, m: ModuleId) {
    ctx.add_identity(m, "transport", &[]);
    ctx.add_identity(m, "tcp", &["transport"]);
}

fn grouping(ctx: &mut Context, m: ModuleId) {
    let g = ctx.add_grouping(m, None, "endpoint");
    ctx.add_leaf(m, Some(g), "name", "string");
    ctx.add_leaf(m, Some(g), "port", "port-alias");
    let proto = identityref(ctx, m, Some(g), "proto", "transport");
    set_default(ctx, proto, "tcp");
}

fn servers(ctx: &mut Context, m: ModuleId) {
    let list = ctx.add_list(m, None, "server", Some("name"));
    ctx.add_uses(m, Some(list), "endpoint");
}

fn refs(ctx: &mut Context, m: ModuleId) {
    let refs = ctx.add_container(m, None, "refs");
    leafref(ctx, m, Some(refs), "primary", "/n:server/n:name");
}

fn augment(ctx: &mut Context, m: ModuleId) {
    let aug = ctx.add_augment(m, None, "/n:refs");
    ctx.add_leaf(m, Some(aug), "backup-port", "port");
}

const STEPS: [fn(&mut Context, ModuleId); 6] = [typedefs, identities, grouping, servers, refs, augment];

fn network(reversed: bool) -> (Context, ModuleId) {
    let mut ctx = Context::new();
    let m = ctx.add_module("net", "n").unwrap();
    let mut steps = STEPS.to_vec();
    if reversed {
        steps.reverse();
    }
    for step in steps {
        step(&mut ctx, m);
    }
    (ctx, m)
}

#[test]
fn test_declaration_order_does_not_matter() {
    let (mut forward, fm) = network(false);
    let (mut backward, bm) = network(true);
    compile(&mut forward, fm).unwrap();
    compile(&mut backward, bm).unwrap();

    let summary = summarize(&forward, fm);
    assert_eq!(summary, summarize(&backward, bm));
    assert_eq!(
        summary,
        vec![
            "/net:refs: -",
            "/net:refs/net:backup-port: uint16",
            "/net:refs/net:primary: leafref",
            "/net:server: -",
            "/net:server/net:name: string",
            "/net:server/net:port: uint16",
            "/net:server/net:proto: identityref",
        ]
    );
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_network_links_every_reference(#[case] reversed: bool) {
    let (mut ctx, m) = network(reversed);
    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::default(), &[m]);
    result.unwrap();
    assert_no_errors(&diagnostics);

    let server = ctx
        .module(m)
        .children
        .iter()
        .copied()
        .find(|&id| ctx.node(id).kind() == NodeKind::List)
        .unwrap();
    let keys = &ctx.node(server).list().unwrap().keys;
    assert_eq!(keys.len(), 1);
    assert_eq!(ctx.schema_path(keys[0]), "/net:server/net:name");

    let primary = ctx.resolve_instance_identifier("/net:refs/primary").unwrap();
    let ty = ctx.node(primary).type_id().unwrap();
    assert_eq!(ctx.type_spec(ty).leafref_target, Some(keys[0]));
    assert!(ctx.module(m).compiled);
}

#[test]
fn test_mutually_recursive_groupings_never_settle() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let a = ctx.add_grouping(m, None, "a");
    let inner_a = ctx.add_container(m, Some(a), "in-a");
    ctx.add_uses(m, Some(inner_a), "b");
    let b = ctx.add_grouping(m, None, "b");
    let inner_b = ctx.add_container(m, Some(b), "in-b");
    ctx.add_uses(m, Some(inner_b), "a");

    assert!(matches!(
        compile(&mut ctx, m),
        Err(CompileError::Unresolved { count: 2 })
    ));
}

#[test]
fn test_augment_promotes_imported_module() {
    let mut ctx = Context::new();
    let base = ctx.add_module("base", "b").unwrap();
    ctx.module_mut(base).implemented = false;
    let system = ctx.add_container(base, None, "system");
    let users = ctx.add_list(base, Some(system), "user", Some("name"));
    ctx.add_leaf(base, Some(users), "name", "string");

    let ext = ctx.add_module("ext", "e").unwrap();
    ctx.add_import(ext, base, "b");
    let aug = ctx.add_augment(ext, None, "/b:system/b:user");
    let shell = ctx.add_leaf(ext, Some(aug), "shell", "string");

    let report = compile(&mut ctx, ext).unwrap();
    assert!(report.warnings.is_empty());
    assert!(ctx.module(base).implemented);
    assert!(ctx.module(base).compiled);
    assert_eq!(ctx.node(users).list().unwrap().keys.len(), 1);
    assert_eq!(ctx.data_path(shell), "/base:system/user/ext:shell");
}

#[test]
fn test_augment_into_choice_adds_case() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    let transport = ctx.add_choice(m, None, "transport", None);
    let tcp = ctx.add_case(m, transport, "tcp");
    ctx.add_leaf(m, Some(tcp), "port", "uint16");
    let aug = ctx.add_augment(m, None, "/m:transport");
    let udp = ctx.add_case(m, aug, "udp");
    let leaf = ctx.add_leaf(m, Some(udp), "datagram-size", "uint16");

    compile(&mut ctx, m).unwrap();
    assert_eq!(ctx.schema_path(leaf), "/m:transport/m:udp/m:datagram-size");
    assert_eq!(ctx.data_path(leaf), "/m:datagram-size");
}

#[test]
fn test_leafref_to_missing_node() {
    let mut ctx = Context::new();
    let m = ctx.add_module("m", "m").unwrap();
    leafref(&mut ctx, m, None, "dangling", "/m:nowhere");

    assert!(matches!(
        compile(&mut ctx, m),
        Err(CompileError::Unresolved { count: 1 })
    ));
}

#[test]
fn test_operation_input_is_never_config() {
    let mut ctx = Context::new();
    let m = ctx.add_module("ops", "o").unwrap();
    let stats = ctx.add_container(m, None, "stats");
    ctx.node_mut(stats).config = Some(false);
    ctx.add_leaf(m, Some(stats), "counter", "uint32");
    let rpc = ctx.add_node(m, None, "reset", NodeData::Rpc);
    let input = ctx.add_node(m, Some(rpc), "input", NodeData::Input);
    let which = leafref(&mut ctx, m, Some(input), "which", "/o:stats/o:counter");
    ctx.node_mut(which).config = Some(true);
    let event = ctx.add_node(m, None, "overflow", NodeData::Notification);
    let value = ctx.add_leaf(m, Some(event), "value", "uint32");
    ctx.node_mut(value).config = Some(true);

    compile(&mut ctx, m).unwrap();
    assert!(!ctx.is_config(which));
    assert!(!ctx.is_config(value));
    assert!(ctx.node(which).type_id().is_some_and(|ty| ctx.type_spec(ty).leafref_target.is_some()));
}

#[test]
fn test_grouping_keeps_its_own_prefixes_when_used_elsewhere() {
    let mut ctx = Context::new();
    let lib = ctx.add_module("lib", "l").unwrap();
    let interfaces = ctx.add_container(lib, None, "interfaces");
    let name = ctx.add_leaf(lib, Some(interfaces), "name", "string");
    ctx.add_identity(lib, "crypto-alg", &[]);
    let aes = ctx.add_identity(lib, "aes", &["l:crypto-alg"]);
    let g = ctx.add_grouping(lib, None, "g");
    leafref(&mut ctx, lib, Some(g), "iface", "/l:interfaces/l:name");
    let alg = identityref(&mut ctx, lib, Some(g), "alg", "l:crypto-alg");
    set_default(&mut ctx, alg, "l:aes");

    let m = ctx.add_module("m", "m").unwrap();
    ctx.add_import(m, lib, "lib");
    let tunnel = ctx.add_container(m, None, "tunnel");
    ctx.add_uses(m, Some(tunnel), "lib:g");

    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::default(), &[lib, m]);
    assert_no_errors(&diagnostics);
    result.unwrap();

    let iface = ctx.find_child(Siblings::Node(tunnel), m, "iface", WalkMode::Data).unwrap();
    let ty = ctx.node(iface).type_id().unwrap();
    assert_eq!(ctx.type_spec(ty).leafref_target, Some(name));
    let alg = ctx.find_child(Siblings::Node(tunnel), m, "alg", WalkMode::Data).unwrap();
    let ty = ctx.node(alg).type_id().unwrap();
    assert_eq!(ctx.type_spec(ty).identities.len(), 1);
    assert!(ctx.identity_derives_from(aes, ctx.type_spec(ty).identities[0]));
}

#[test]
fn test_augment_of_shorthand_case() {
    let mut ctx = Context::new();
    let base = ctx.add_module("base", "b").unwrap();
    let c = ctx.add_container(base, None, "c");
    let ch = ctx.add_choice(base, Some(c), "ch", None);
    let x = ctx.add_leaf(base, Some(ch), "x", "string");
    let ext = ctx.add_module("ext", "e").unwrap();
    ctx.add_import(ext, base, "b");
    let aug = ctx.add_augment(ext, None, "/b:c/b:ch/b:x");
    let y = ctx.add_leaf(ext, Some(aug), "y", "string");

    let (result, diagnostics) = compile_modules(&mut ctx, CompileOptions::default(), &[base, ext]);
    assert_no_errors(&diagnostics);
    result.unwrap();

    let case = ctx.schema_parent(y).unwrap();
    assert_eq!(ctx.node(case).kind(), NodeKind::Case);
    assert_eq!(ctx.schema_parent(x), Some(case));
    assert_eq!(ctx.schema_path(y), "/base:c/base:ch/base:x/ext:y");
    assert_eq!(
        ctx.resolve_schema_nodeid("/b:c/b:ch/b:x/b:x", yanglink::resolve::NodeIdStart::Root, base).unwrap(),
        x
    );
}
