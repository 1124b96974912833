//! The embedded path grammars, exercised through their public cursors.

use rstest::rstest;
use yanglink::parser::{
    InstanceIdCursor, NodeIdKind, PathArgCursor, PathKeyExprCursor, PredicateKind, SchemaNodeIdCursor,
    SyntaxErrorKind, is_identifier, split_qualified,
};

/// Rebuild an instance-identifier from the ranges its cursor reports.
fn rebuild_instance_identifier(input: &str) -> String {
    let mut cursor = InstanceIdCursor::new(input);
    let mut out = String::new();
    while let Some(segment) = cursor.next_segment().unwrap() {
        out.push('/');
        out.push_str(&input[segment.range]);
        while let Some(predicate) = cursor.next_predicate().unwrap() {
            out.push_str(&input[predicate.range]);
        }
    }
    assert!(cursor.is_done());
    out
}

#[rstest]
#[case("/ietf-interfaces:interfaces")]
#[case("/ietf-interfaces:interfaces/interface[name='eth0']/mtu")]
#[case("/m:a/b[k1='x'][k2=\"y z\"]/c")]
#[case("/m:servers/server[2]")]
#[case("/m:tags/tag[.='blue']")]
fn test_instance_identifier_round_trip(#[case] input: &str) {
    assert_eq!(rebuild_instance_identifier(input), input);
}

#[test]
fn test_instance_identifier_predicates() {
    let input = "/m:list[name='a'][3]/leaf-list[.='v']";
    let mut cursor = InstanceIdCursor::new(input);

    let list = cursor.next_segment().unwrap().unwrap();
    assert_eq!(list.module(), Some("m"));
    assert_eq!(list.name(), "list");
    assert!(list.has_predicate);
    match cursor.next_predicate().unwrap().unwrap().kind {
        PredicateKind::Key { key, value } => {
            assert_eq!(key.name, "name");
            assert_eq!(value, Some("a"));
        }
        other => panic!("expected key predicate, got {:?}", other),
    }
    assert_eq!(cursor.next_predicate().unwrap().unwrap().kind, PredicateKind::Position(3));
    assert!(cursor.next_predicate().unwrap().is_none());

    let leaf_list = cursor.next_segment().unwrap().unwrap();
    assert_eq!(leaf_list.module(), None);
    assert_eq!(cursor.next_predicate().unwrap().unwrap().kind, PredicateKind::Value("v"));
    assert!(cursor.next_segment().unwrap().is_none());
}

#[rstest]
#[case("m:a", 0)]
#[case("/m:a[01]", 5)]
#[case("/m:a[k='x]", 7)]
#[case("/m:a[k]", 6)]
fn test_invalid_instance_identifiers(#[case] input: &str, #[case] offset: usize) {
    let mut cursor = InstanceIdCursor::new(input);
    let error = loop {
        match cursor.next_segment() {
            Ok(Some(_)) => {
                if let Err(error) = cursor.next_predicate() {
                    break error;
                }
            }
            Ok(None) => panic!("{input:?} parsed"),
            Err(error) => break error,
        }
    };
    assert_eq!(error.offset, offset, "{input:?}: {error}");
}

#[test]
fn test_schema_nodeid_segments() {
    let mut cursor = SchemaNodeIdCursor::new("/sys:system/sys:user/ext:shell");
    let names: Vec<_> = std::iter::from_fn(|| cursor.next_segment().unwrap())
        .map(|segment| (segment.module(), segment.name()))
        .collect();
    assert_eq!(
        names,
        vec![(Some("sys"), "system"), (Some("sys"), "user"), (Some("ext"), "shell")]
    );
    assert_eq!(cursor.kind(), Some(NodeIdKind::Absolute));
}

#[test]
fn test_schema_nodeid_kind_is_enforced() {
    let mut cursor = SchemaNodeIdCursor::expecting("/a/b", NodeIdKind::Descendant);
    let error = cursor.next_segment().unwrap_err();
    assert_eq!(error.kind, SyntaxErrorKind::MixedNodeId);

    let mut cursor = SchemaNodeIdCursor::expecting("./a/b", NodeIdKind::Descendant);
    assert_eq!(cursor.next_segment().unwrap().unwrap().name(), "a");
    assert_eq!(cursor.next_segment().unwrap().unwrap().name(), "b");
    assert!(cursor.next_segment().unwrap().is_none());
}

#[test]
fn test_leafref_path_with_predicate() {
    let input = "../../if:interface[if:name = current()/../../ifname]/if:mtu";
    let mut cursor = PathArgCursor::new(input);

    let interface = cursor.next_segment().unwrap().unwrap();
    assert_eq!(cursor.parent_times(), 2);
    assert_eq!(cursor.is_absolute(), Some(false));
    assert_eq!(interface.name(), "interface");

    let predicate = cursor.next_predicate().unwrap().unwrap();
    assert_eq!(predicate.key.name, "name");
    assert_eq!(predicate.key_expr, "current()/../../ifname");
    assert_eq!(&input[predicate.key_expr_range], predicate.key_expr);

    let mut key_expr = PathKeyExprCursor::new(predicate.key_expr);
    assert_eq!(key_expr.next_segment().unwrap().unwrap().name(), "ifname");
    assert_eq!(key_expr.parent_times(), 2);
    assert!(key_expr.next_segment().unwrap().is_none());

    assert_eq!(cursor.next_segment().unwrap().unwrap().name(), "mtu");
    assert!(cursor.next_segment().unwrap().is_none());
}

#[rstest]
#[case("name", true)]
#[case("_private", true)]
#[case("ietf-ip.v4", true)]
#[case("9lives", false)]
#[case("", false)]
#[case("a b", false)]
fn test_identifiers(#[case] input: &str, #[case] valid: bool) {
    assert_eq!(is_identifier(input), valid);
}

#[test]
fn test_split_qualified() {
    let id = split_qualified("if:interface").unwrap();
    assert_eq!((id.module, id.name), (Some("if"), "interface"));
    let id = split_qualified("interface").unwrap();
    assert_eq!((id.module, id.name), (None, "interface"));
    assert!(split_qualified("if:").is_err());
}
