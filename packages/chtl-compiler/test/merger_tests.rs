//! Integration coverage for the code merger (spec §4.9), driven through the
//! full pipeline so `MergeOptions` interacts with real generator output
//! rather than hand-built `GeneratedOutput` values.

use chtl_compiler::config::CompilerConfig;
use chtl_compiler::driver::compile_source;
use std::path::Path;

fn artifact_with(source: &str, configure: impl FnOnce(&mut CompilerConfig)) -> chtl_compiler::output::Artifact {
    let mut config = CompilerConfig::default();
    configure(&mut config);
    compile_source(source, Path::new("t.chtl"), &config).unwrap()
}

const SOURCE: &str = r#"
    style {
        div { color: red; }
    }
    div {
        script {
            console.log('hi');
        }
        text { "hello" }
    }
"#;

#[test]
fn inlines_css_and_js_by_default() {
    let artifact = artifact_with(SOURCE, |_| {});
    assert!(artifact.html.contains("<style>"));
    assert!(artifact.html.contains("<script>"));
    assert!(artifact.css_file.is_none());
    assert!(artifact.js_file.is_none());
}

#[test]
fn separate_files_option_splits_css_and_js_into_sidecars() {
    let artifact = artifact_with(SOURCE, |c| c.merge.separate_files = true);
    assert!(!artifact.html.contains("<style>"));
    assert!(!artifact.html.contains("<script>console.log"));
    assert!(artifact.css_file.as_deref().unwrap_or("").contains("color:red"));
    assert!(artifact.js_file.as_deref().unwrap_or("").contains("console.log"));
}

#[test]
fn minify_html_collapses_tag_internal_whitespace() {
    let artifact = artifact_with(r#"div { id:    main; text { "hi" } }"#, |c| c.merge.minify_html = true);
    assert!(!artifact.html.contains("   "));
}

#[test]
fn source_map_is_emitted_only_when_requested() {
    let without = artifact_with(SOURCE, |_| {});
    assert!(without.html_source_map.is_none());

    let with = artifact_with(SOURCE, |c| c.merge.output_sourcemaps = true);
    assert!(with.html_source_map.is_some());
}
