//! Integration coverage for style-property expression evaluation (spec
//! §4.5), driven through the full pipeline so property-ref resolution runs
//! against a real resolved element tree rather than a hand-built one.

use chtl_compiler::config::CompilerConfig;
use chtl_compiler::driver::compile_source;
use std::path::Path;

fn compile_html(source: &str) -> String {
    compile_source(source, Path::new("t.chtl"), &CompilerConfig::default()).unwrap().html
}

#[test]
fn arithmetic_on_unitless_numbers_folds_at_compile_time() {
    let html = compile_html("div { style { width: 2 + 3; } }");
    assert!(html.contains("width:5"));
}

#[test]
fn arithmetic_preserves_the_operands_unit() {
    let html = compile_html("div { style { width: 10px + 4px; } }");
    assert!(html.contains("width:14px"));
}

#[test]
fn ternary_picks_the_matching_branch() {
    let html = compile_html(r#"div { style { width: 1 ? 10px : 20px; } }"#);
    assert!(html.contains("width:10px"));
    assert!(!html.contains("width:20px"));
}

#[test]
fn property_ref_reads_another_elements_id_selected_value() {
    let html = compile_html(
        r#"
        div {
            id: box;
            style { width: 100px; }
        }
        span {
            style { height: #box.width; }
        }
        "#,
    );
    assert!(html.contains("height:100px"));
}

#[test]
fn string_operand_plus_a_number_concatenates_instead_of_erroring() {
    // `+` with a string operand coerces to concatenation (spec §4.5), unlike
    // every other operator, so this must succeed rather than error.
    let result = compile_source(
        "div { style { width: 10px + \"oops\"; } }",
        Path::new("t.chtl"),
        &CompilerConfig::default(),
    );
    assert!(result.is_ok());
}

#[test]
fn incompatible_units_in_arithmetic_is_a_compile_error() {
    let result = compile_source(
        "div { style { width: 10px - 4em; } }",
        Path::new("t.chtl"),
        &CompilerConfig::default(),
    );
    assert!(result.is_err());
}
