//! Integration coverage for the CHTL generator (spec §4.6): HTML structure,
//! void elements, auto class/id synthesis, and origin-block re-emission.

use chtl_compiler::config::CompilerConfig;
use chtl_compiler::driver::compile_source;
use std::path::Path;

fn compile(source: &str) -> chtl_compiler::output::Artifact {
    compile_source(source, Path::new("t.chtl"), &CompilerConfig::default()).unwrap()
}

#[test]
fn void_elements_self_close_without_children() {
    let artifact = compile(r#"img { src: "a.png"; }"#);
    assert!(artifact.html.contains("<img") && artifact.html.ends_with("/>"));
    assert!(!artifact.html.contains("</img>"));
}

#[test]
fn generator_comment_becomes_an_html_comment() {
    let artifact = compile("# a note\ndiv { }");
    assert!(artifact.html.contains("<!--a note-->"));
}

#[test]
fn a_style_block_with_no_id_or_class_synthesizes_one() {
    let artifact = compile("div { style { color: red; } }");
    assert!(
        artifact.html.contains("class=\"chtl-auto-") || artifact.html.contains("id="),
        "expected an auto-synthesized selector attribute, got {}",
        artifact.html
    );
}

#[test]
fn disabling_auto_add_class_leaves_no_synthetic_class() {
    let artifact = compile(
        r#"
        [Configuration] {
            DISABLE_STYLE_AUTO_ADD_CLASS = true;
        }
        div { style { color: red; } }
        "#,
    );
    assert!(!artifact.html.contains("chtl-auto-"));
}

#[test]
fn nested_elements_render_in_document_order() {
    let artifact = compile(r#"div { span { text { "a" } } p { text { "b" } } }"#);
    let a = artifact.html.find("a").unwrap();
    let b = artifact.html.find("b").unwrap();
    assert!(a < b);
}

#[test]
fn origin_html_block_is_spliced_verbatim_in_place() {
    let artifact = compile(
        r#"
        div {
            [Origin] @Html {
                <em>raw</em>
            }
        }
        "#,
    );
    assert!(artifact.html.contains("<em>raw</em>"));
}

#[test]
fn origin_css_block_lands_in_the_css_buffer_not_the_html() {
    let artifact = compile(
        r#"
        [Origin] @Style {
            body { margin: 0; }
        }
        "#,
    );
    assert!(!artifact.html.contains("margin: 0"));
}
