//! Integration coverage for the unified scanner (spec §3.1/§4.1) driven
//! through its public entry point rather than its own unit tests, so a
//! regression in fragment boundaries shows up the way a caller would hit it.

use chtl_compiler::scanner::{scan, FragmentKind};

#[test]
fn script_blocks_are_always_extracted_even_when_nested() {
    let source = r#"
        div {
            span {
                script {
                    let x = 1;
                }
            }
        }
    "#;
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let script_fragments: Vec<_> = fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::ChtlJs))
        .collect();
    assert_eq!(script_fragments.len(), 1);
    assert!(script_fragments[0].text().contains("let x = 1;"));
}

#[test]
fn global_style_is_carved_out_as_css_but_local_style_is_not() {
    let source = r#"
        style {
            div { color: red; }
        }
        div {
            style {
                color: blue;
            }
        }
    "#;
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let css: Vec<_> = fragments.iter().filter(|f| matches!(f.kind, FragmentKind::Css)).collect();
    assert_eq!(css.len(), 1);
    assert!(css[0].text().contains("color: red"));

    let chtl_text: String = fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Chtl))
        .map(|f| f.text())
        .collect();
    assert!(chtl_text.contains("color: blue"), "local style stays in the CHTL stream");
}

#[test]
fn origin_block_with_body_is_placeholder_backed() {
    let source = r#"
        [Origin] @Html Banner {
            <div>raw</div>
        }
    "#;
    let (fragments, placeholders) = scan(source, "t.chtl").unwrap();
    let literal = fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Literal(_)))
        .expect("origin body should scan as a literal fragment");
    let id = literal.placeholder.expect("with-body origin carries a placeholder id");
    assert!(placeholders.get(id).contains("<div>raw</div>"));
    assert_eq!(literal.origin_name.as_deref(), Some("Banner"));
}

#[test]
fn fragments_reconstruct_the_original_source_byte_for_byte() {
    let source = "div {\n    id: box;\n    style { color: red; }\n    script { f(); }\n}\n";
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
    assert_eq!(reconstructed, source);
}

#[test]
fn unterminated_string_inside_a_style_block_is_a_syntax_error() {
    let source = r#"
        div {
            style {
                content: "unterminated;
            }
        }
    "#;
    assert!(scan(source, "t.chtl").is_err());
}

#[test]
fn id_selector_hash_inside_local_style_does_not_desync_brace_nesting() {
    let source = r#"
        div {
            style {
                #box {
                    color: red;
                }
            }
        }
    "#;
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
    assert_eq!(reconstructed, source);
}

#[test]
fn id_selector_hash_inside_a_global_style_block_does_not_desync_brace_nesting() {
    let source = r#"
        style {
            #box {
                color: red;
            }
        }
        div { }
    "#;
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
    assert_eq!(reconstructed, source);
    let css: Vec<_> = fragments.iter().filter(|f| matches!(f.kind, FragmentKind::Css)).collect();
    assert_eq!(css.len(), 1);
    assert!(css[0].text().contains("#box"));
}

#[test]
fn enhanced_selector_hash_inside_a_script_block_does_not_desync_brace_nesting() {
    // The literal spec scenario this guards: an enhanced `{{#id}}` selector
    // feeding `->listen` inside a `script{}` body, scanned through the full
    // unified scanner rather than the CHTL-JS lexer directly.
    let source = r#"script { {{#b}}->listen { click: () => x() } }"#;
    let (fragments, _) = scan(source, "t.chtl").unwrap();
    let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
    assert_eq!(reconstructed, source);

    let script: Vec<_> = fragments.iter().filter(|f| matches!(f.kind, FragmentKind::ChtlJs)).collect();
    assert_eq!(script.len(), 1);
    assert!(script[0].text().contains("{{#b}}->listen"));
}
