//! Integration coverage for template/custom resolution (spec §4.3), driven
//! through the full compiler pipeline so behavior is checked the way a
//! `.chtl` author would see it: in the generated HTML/CSS.

use chtl_compiler::config::CompilerConfig;
use chtl_compiler::driver::compile_source;
use std::path::Path;

fn compile(source: &str) -> chtl_compiler::output::Artifact {
    compile_source(source, Path::new("t.chtl"), &CompilerConfig::default()).unwrap()
}

#[test]
fn style_template_usage_inlines_its_properties() {
    let artifact = compile(
        r#"
        [Template] @Style Base {
            color: red;
        }
        div {
            style {
                @Style Base;
            }
        }
        "#,
    );
    assert!(artifact.html.contains("color:red") || artifact.html.contains("color: red"));
}

#[test]
fn element_custom_specialization_deletes_a_child() {
    let artifact = compile(
        r#"
        [Custom] @Element Card {
            div {
                span { text { "keep" } }
                p { text { "drop" } }
            }
            delete p;
        }
        @Element Card;
        "#,
    );
    assert!(artifact.html.contains("keep"));
    assert!(!artifact.html.contains("drop"));
}

#[test]
fn custom_inserts_after_an_anchor() {
    let artifact = compile(
        r#"
        [Custom] @Element Card {
            div {
                span { text { "first" } }
            }
            insert after span { p { text { "second" } } }
        }
        @Element Card;
        "#,
    );
    let first = artifact.html.find("first").unwrap();
    let second = artifact.html.find("second").unwrap();
    assert!(first < second);
}

#[test]
fn style_inheritance_merges_base_and_derived_properties() {
    let artifact = compile(
        r#"
        [Template] @Style Base {
            color: red;
        }
        [Template] @Style Derived {
            inherit Base;
            font-size: 16px;
        }
        div {
            style {
                @Style Derived;
            }
        }
        "#,
    );
    assert!(artifact.html.contains("font-size"));
}

#[test]
fn cyclic_template_inheritance_is_rejected() {
    let result = compile_source(
        r#"
        [Template] @Style A { inherit B; }
        [Template] @Style B { inherit A; }
        div { style { @Style A; } }
        "#,
        Path::new("t.chtl"),
        &CompilerConfig::default(),
    );
    assert!(result.is_err());
}
