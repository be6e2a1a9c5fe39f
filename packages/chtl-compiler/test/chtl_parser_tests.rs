//! Integration coverage for the CHTL parser (spec §4.3), driven end-to-end
//! from source text through the lexer rather than hand-built token streams.

use chtl_compiler::chtl::ast::{DefinitionKind, Expr, InsertPosition, Node, StyleChild};
use chtl_compiler::chtl::{lex, parse};
use chtl_compiler::config::Configuration;

fn parse_src(source: &str) -> chtl_compiler::chtl::ast::Chtl {
    let config = Configuration::default();
    let tokens = lex(source, "t.chtl", &config).unwrap();
    parse(tokens).unwrap()
}

#[test]
fn element_with_attributes_children_and_text() {
    let chtl = parse_src(r#"div { id: main; span { text { "hi" } } }"#);
    match &chtl.nodes[0] {
        Node::Element(e) => {
            assert_eq!(e.tag, "div");
            assert_eq!(e.attributes[0].name, "id");
            assert_eq!(e.children.len(), 1);
        }
        other => panic!("expected element, got {other:?}"),
    }
}

#[test]
fn template_definition_with_inheritance() {
    let chtl = parse_src("[Template] @Style Base { color: black; } [Template] @Style T { inherit Base; }");
    match &chtl.nodes[1] {
        Node::TemplateDefinition(d) => {
            assert_eq!(d.kind, DefinitionKind::Style);
            assert_eq!(d.inherits, vec!["Base".to_string()]);
        }
        other => panic!("expected template definition, got {other:?}"),
    }
}

#[test]
fn custom_definition_collects_delete_insert_replace_ops() {
    let chtl = parse_src(
        "[Custom] @Element Card { div { p { } span { } } delete p; insert after div { a { } } replace span { b { } } }",
    );
    match &chtl.nodes[0] {
        Node::CustomDefinition(d) => {
            assert_eq!(d.deletes.len(), 1);
            assert_eq!(d.inserts.len(), 1);
            assert_eq!(d.inserts[0].position, InsertPosition::After);
            assert_eq!(d.replaces.len(), 1);
        }
        other => panic!("expected custom definition, got {other:?}"),
    }
}

#[test]
fn usage_with_local_override_block() {
    let chtl = parse_src("div { @Style Box { color: red; } }");
    match &chtl.nodes[0] {
        Node::Element(e) => match &e.children[0] {
            Node::Usage(u) => {
                assert_eq!(u.name, "Box");
                assert_eq!(u.kind, DefinitionKind::Style);
                assert_eq!(u.overrides.len(), 1);
            }
            other => panic!("expected usage node, got {other:?}"),
        },
        other => panic!("expected element, got {other:?}"),
    }
}

#[test]
fn import_with_namespace_and_alias() {
    let chtl = parse_src(r#"[Import] @Chtl from "foo.chtl" as Foo;"#);
    match &chtl.nodes[0] {
        Node::Import(i) => {
            assert_eq!(i.path, "foo.chtl");
            assert_eq!(i.alias.as_deref(), Some("Foo"));
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn nested_selector_and_expression_in_style_block() {
    let chtl = parse_src("div { style { &:hover { color: red; } width: #box.width + 4px; } }");
    match &chtl.nodes[0] {
        Node::Element(e) => {
            let style = e.style.as_ref().unwrap();
            match &style.children[0] {
                StyleChild::Rule(r) => assert_eq!(r.selector, "&:hover"),
                other => panic!("expected rule, got {other:?}"),
            }
            match &style.children[1] {
                StyleChild::Property(p) => {
                    assert!(matches!(p.value, Expr::Binary(_, _, _)));
                }
                other => panic!("expected property, got {other:?}"),
            }
        }
        other => panic!("expected element, got {other:?}"),
    }
}

#[test]
fn namespace_wraps_its_body() {
    let chtl = parse_src("[Namespace] Space { div { } }");
    match &chtl.nodes[0] {
        Node::Namespace(ns) => {
            assert_eq!(ns.name, "Space");
            assert_eq!(ns.children.len(), 1);
        }
        other => panic!("expected namespace, got {other:?}"),
    }
}
