//! The code merger (spec §4.9): assembles the generator's HTML/CSS/JS
//! buffers plus any module-to-module merge order into the final artifact,
//! honoring `MergeOptions`' inline/separate-file and minify choices.

use crate::chtl::generator::GeneratedOutput;
use crate::config::MergeOptions;
use crate::output::{minify_css, minify_html, minify_js, Artifact};

/// One generated file's output tagged with the priority and source order
/// the merger sorts by (spec §4.9: "by declared priority (lower first) then
/// by source order"). A single-file compilation has exactly one unit at
/// priority 0; multi-file builds (driver iterating several `.chtl` inputs)
/// assign increasing source order per file.
#[derive(Debug, Clone)]
pub struct MergeUnit {
    pub priority: i32,
    pub source_order: usize,
    pub output: GeneratedOutput,
}

/// Merges one or more generated outputs into the final artifact. Units are
/// sorted by `(priority, source_order)`; CSS/JS buffers are concatenated in
/// that order with exact-text duplicates dropped, then inlined or split out
/// to sidecar files per `options`.
pub fn merge(mut units: Vec<MergeUnit>, options: &MergeOptions) -> Artifact {
    units.sort_by_key(|u| (u.priority, u.source_order));

    let mut html = String::new();
    let mut css_fragments: Vec<String> = Vec::new();
    let mut js_fragments: Vec<String> = Vec::new();

    for unit in &units {
        html.push_str(&unit.output.html);
        push_dedup(&mut css_fragments, &unit.output.css);
        push_dedup(&mut js_fragments, &unit.output.js);
    }

    let mut css = css_fragments.join("\n");
    let mut js = js_fragments.join("\n");

    if options.minify_css {
        css = minify_css(&css);
    }
    if options.minify_js {
        js = minify_js(&js);
    }

    let mut artifact = Artifact::default();

    if options.separate_files || (!options.inline_css && !css.trim().is_empty()) {
        artifact.css_file = Some(css.clone());
    }
    if options.separate_files || (!options.inline_js && !js.trim().is_empty()) {
        artifact.js_file = Some(js.clone());
    }

    if options.inline_css && !css.trim().is_empty() && artifact.css_file.is_none() {
        html = inline_into_head(&html, &format!("<style>{css}</style>"));
    }
    if options.inline_js && !js.trim().is_empty() && artifact.js_file.is_none() {
        html = inline_into_body(&html, &format!("<script>{js}</script>"));
    }

    if options.minify_html {
        html = minify_html(&html);
    }

    artifact.html = html;
    artifact
}

/// Skips a CSS/JS fragment if its text (trimmed) already appears verbatim
/// among the already-accumulated fragments (spec §4.9 "duplicate fragments
/// ... are deduplicated").
fn push_dedup(fragments: &mut Vec<String>, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if fragments.iter().any(|f| f.trim() == text.trim()) {
        return;
    }
    fragments.push(text.to_string());
}

/// Wraps a document body in a minimal `<html><head>...</head><body>...`
/// shell if it isn't one already, then inserts `content` at the end of
/// `<head>`. The generator emits bare element markup (spec §4.6), not a
/// full document, so the merger owns shell synthesis.
fn inline_into_head(html: &str, content: &str) -> String {
    if let Some(pos) = html.find("</head>") {
        let mut out = html.to_string();
        out.insert_str(pos, content);
        out
    } else {
        format!("<head>{content}</head>{html}")
    }
}

fn inline_into_body(html: &str, content: &str) -> String {
    if let Some(pos) = html.find("</body>") {
        let mut out = html.to_string();
        out.insert_str(pos, content);
        out
    } else {
        format!("{html}{content}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(html: &str, css: &str, js: &str) -> GeneratedOutput {
        GeneratedOutput { html: html.to_string(), css: css.to_string(), js: js.to_string() }
    }

    #[test]
    fn inlines_css_and_js_by_default() {
        let units = vec![MergeUnit {
            priority: 0,
            source_order: 0,
            output: output("<div>hi</div>", "div{color:red;}", "console.log(1);"),
        }];
        let artifact = merge(units, &MergeOptions::default());
        assert!(artifact.html.contains("<style>div{color:red;}</style>"));
        assert!(artifact.html.contains("<script>console.log(1);</script>"));
        assert!(artifact.css_file.is_none());
        assert!(artifact.js_file.is_none());
    }

    #[test]
    fn separate_files_splits_css_and_js_out() {
        let units = vec![MergeUnit {
            priority: 0,
            source_order: 0,
            output: output("<div>hi</div>", "div{color:red;}", "console.log(1);"),
        }];
        let mut options = MergeOptions::default();
        options.separate_files = true;
        let artifact = merge(units, &options);
        assert!(!artifact.html.contains("<style>"));
        assert_eq!(artifact.css_file.as_deref(), Some("div{color:red;}"));
        assert_eq!(artifact.js_file.as_deref(), Some("console.log(1);"));
    }

    #[test]
    fn duplicate_css_fragments_are_dropped() {
        let units = vec![
            MergeUnit { priority: 0, source_order: 0, output: output("<a></a>", "div{color:red;}", "") },
            MergeUnit { priority: 0, source_order: 1, output: output("<b></b>", "div{color:red;}", "") },
        ];
        let artifact = merge(units, &MergeOptions::default());
        assert_eq!(artifact.html.matches("div{color:red;}").count(), 1);
    }

    #[test]
    fn priority_orders_ahead_of_source_order() {
        let units = vec![
            MergeUnit { priority: 1, source_order: 0, output: output("<second/>", "", "") },
            MergeUnit { priority: 0, source_order: 0, output: output("<first/>", "", "") },
        ];
        let artifact = merge(units, &MergeOptions::default());
        assert!(artifact.html.find("<first/>").unwrap() < artifact.html.find("<second/>").unwrap());
    }
}
