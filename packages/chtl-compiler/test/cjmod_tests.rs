//! Integration coverage for the CJMOD API (spec §4.8) and the Chtholly
//! built-in module that exercises it (SPEC_FULL §11.3).

use chtl_compiler::chtl_js::lower;
use chtl_compiler::cjmod::{Arg, CJMODGenerator, CJMODScanner, PlaceholderKind, Syntax};

#[test]
fn syntax_analyze_assigns_implicit_ordinal_names() {
    let syntax = Syntax::analyze("$ $ $_label");
    assert_eq!(syntax.placeholders[0].name, "_0");
    assert_eq!(syntax.placeholders[1].name, "_1");
    assert_eq!(syntax.placeholders[2].name, "label");
    assert_eq!(syntax.placeholders[2].kind, PlaceholderKind::Unordered);
}

#[test]
fn scanner_and_generator_round_trip_a_two_argument_call() {
    let schema = Syntax::analyze("$ $");
    let mut arg = Arg::new(schema);
    CJMODScanner::scan(&mut arg, "add", "add(3, 4);").unwrap();

    let mut out = String::new();
    CJMODGenerator::export_result(&arg, "$_0 + $_1", &mut out);
    assert_eq!(out, "3 + 4");
}

#[test]
fn bound_transformer_applies_before_template_substitution() {
    let mut arg = Arg::new(Syntax::analyze("$_name"));
    arg.set("name", "box");
    arg.bind("name", |v| format!("#{v}"));
    let mut out = String::new();
    CJMODGenerator::export_result(&arg, "document.querySelector('$name')", &mut out);
    assert_eq!(out, "document.querySelector('#box')");
}

#[test]
fn i_never_away_lowers_named_entries_regardless_of_source_order() {
    let js = lower("const cfg = iNeverAway { y: 2, x: 1 };").unwrap();
    assert!(js.contains("y: 2") && js.contains("x: 1"));
}

#[test]
fn print_mylove_lowers_to_a_template_literal_console_log() {
    let js = lower(r#"printMylove("count is {}", count);"#).unwrap();
    assert_eq!(js.trim(), "console.log(`count is ${count}`)");
}
