//! Integration coverage for CHTL-JS lowering (spec §4.7), driven through the
//! single public entry point a `script { ... }` block's source passes
//! through.

use chtl_compiler::chtl_js::lower;

#[test]
fn enhanced_selector_lowers_to_a_dom_query() {
    let js = lower("const el = {{#box}};").unwrap();
    assert!(js.contains("document.getElementById('box')"));
}

#[test]
fn enhanced_selector_with_index_lowers_to_query_selector_all() {
    let js = lower("const el = {{.item[1]}};").unwrap();
    assert!(js.contains("document.querySelectorAll('.item')[1]"));
}

#[test]
fn listen_lowers_to_add_event_listener() {
    let js = lower("btn->listen { click: handleClick };").unwrap();
    assert!(js.contains("btn.addEventListener('click', handleClick);"));
}

#[test]
fn delegate_lowers_to_a_matches_guarded_listener() {
    let js = lower("list->delegate { target: \".item\", click: onItemClick };").unwrap();
    assert!(js.contains("list.addEventListener('click'"));
    assert!(js.contains(".matches('.item')"));
}

#[test]
fn util_change_then_lowers_to_an_if_else() {
    let js = lower("util ready -> change { start() } -> then { wait() };").unwrap();
    assert!(js.contains("if (ready)"));
    assert!(js.contains("start()"));
    assert!(js.contains("wait()"));
}

#[test]
fn raw_javascript_outside_any_construct_passes_through_unchanged() {
    let js = lower("const x = 1;\nconsole.log(x);").unwrap();
    assert!(js.contains("const x = 1;"));
    assert!(js.contains("console.log(x);"));
}

#[test]
fn unterminated_enhanced_selector_is_an_error() {
    assert!(lower("const el = {{#box;").is_err());
}
