//! The compiler driver (spec §3.1, §5): wires one source file's scan ->
//! skeleton build -> lex -> parse -> symbol-table population -> zip ->
//! resolve -> generate -> merge pipeline together, and recurses through
//! `@Chtl` imports along the way. This is the only module that owns a full
//! [`CompileContext`], which is why `import_resolver`'s `@Chtl` handling was
//! left for here rather than folded into that module.

use crate::chtl::ast::{Import, ImportKind, Node, RawPassKind};
use crate::chtl::resolver::Resolver;
use crate::chtl::symbol_table::{Definition, SymbolTable};
use crate::chtl::{generator, lexer, parser};
use crate::chtl_js;
use crate::config::{CompilerConfig, Configuration};
use crate::error::{CompileError, DiagnosticCollector, Result};
use crate::import_resolver::{apply_exports, ChtlTarget, ImportResolver};
use crate::merger::{self, MergeUnit};
use crate::output::{Artifact, SourceMapGenerator};
use crate::scanner::{self, Fragment, FragmentKind, PlaceholderId, PlaceholderTable};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Everything that must not outlive a single compilation (spec §5: no
/// process-wide statics). One instance per file or per-project build.
pub struct CompileContext {
    pub table: SymbolTable,
    pub diagnostics: DiagnosticCollector,
    pub imports: ImportResolver,
    /// Verbatim text of every global (non-element-nested) `style{}` block
    /// seen anywhere in this compilation, root file or `@Chtl` import alike,
    /// in the order encountered.
    global_styles: Vec<String>,
    /// Raw CHTL-JS source of every global `script{}` block, same ordering
    /// rule. Lowered through `chtl_js::lower` once, at merge time.
    global_scripts: Vec<String>,
}

impl CompileContext {
    pub fn new(config: &CompilerConfig) -> Self {
        let mut table = SymbolTable::new();
        table.configuration.set("DEBUG_MODE", if config.debug { "true" } else { "false" });
        CompileContext {
            table,
            diagnostics: DiagnosticCollector::new(),
            imports: ImportResolver::new(config.module_paths.clone()),
            global_styles: Vec::new(),
            global_scripts: Vec::new(),
        }
    }
}

/// One file's lex/parse result with script/origin bodies already backfilled
/// from the scanner's extracted fragments.
struct ParsedUnit {
    nodes: Vec<Node>,
    placeholders: PlaceholderTable,
}

/// Concatenates only the `Chtl`-kind fragments, in source order, producing a
/// structurally valid skeleton (braces intact, extracted bodies elided as
/// `{}` gaps) that the lexer/parser can consume (spec §4.1).
fn build_skeleton(fragments: &[Fragment]) -> String {
    let mut skeleton = String::new();
    for fragment in fragments {
        if fragment.kind == FragmentKind::Chtl {
            skeleton.push_str(fragment.text());
        }
    }
    skeleton
}

/// Walks `nodes` in document order, handing each `Script` and with-body
/// `Origin` the text/placeholder the scanner carved out for it, and
/// collecting global `style`/`script` blocks' text into `ctx`. Fragment
/// order and node-visit order are both document order by construction, so
/// a shared FIFO queue per fragment kind is all the correlation needs.
fn zip_nodes(
    nodes: &mut [Node],
    chtl_js: &mut VecDeque<String>,
    css: &mut VecDeque<String>,
    literals: &mut VecDeque<PlaceholderId>,
    ctx: &mut CompileContext,
) {
    for node in nodes.iter_mut() {
        match node {
            Node::Element(el) => {
                if let Some(script) = el.script.as_mut() {
                    if let Some(text) = chtl_js.pop_front() {
                        script.source = text.into();
                    }
                }
                zip_nodes(&mut el.children, chtl_js, css, literals, ctx);
            }
            Node::Namespace(ns) => zip_nodes(&mut ns.children, chtl_js, css, literals, ctx),
            Node::TemplateDefinition(t) => zip_nodes(&mut t.body, chtl_js, css, literals, ctx),
            Node::CustomDefinition(c) => {
                zip_nodes(&mut c.body, chtl_js, css, literals, ctx);
                for op in &mut c.inserts {
                    zip_nodes(&mut op.payload, chtl_js, css, literals, ctx);
                }
                for op in &mut c.replaces {
                    zip_nodes(&mut op.payload, chtl_js, css, literals, ctx);
                }
            }
            Node::Usage(u) => zip_nodes(&mut u.overrides, chtl_js, css, literals, ctx),
            // A with-body `[Origin] @Kind { ... }` node's span ends at the
            // closing brace; a bodyless `[Origin] @Kind name;` reference's
            // span ends at the semicolon (see `parser::parse_origin`). The
            // scanner only ever produced a `Literal` fragment for the
            // former, so only this form should drain the queue.
            Node::Origin { placeholder, span, .. } => {
                if span.text().trim_end().ends_with('}') {
                    *placeholder = literals.pop_front();
                }
            }
            Node::RawPass(RawPassKind::GlobalStyle, _) => {
                if let Some(text) = css.pop_front() {
                    ctx.global_styles.push(text);
                }
            }
            Node::RawPass(RawPassKind::GlobalScript, _) => {
                if let Some(text) = chtl_js.pop_front() {
                    ctx.global_scripts.push(text);
                }
            }
            _ => {}
        }
    }
}

/// Scans, skeleton-lexes, parses and zips one file's content. Does not
/// touch the symbol table; that's [`populate_symbol_table`]'s job, kept
/// separate so tests can exercise parsing without a `CompileContext`.
fn parse_and_zip(content: &str, url: &str, config: &Configuration, ctx: &mut CompileContext) -> Result<ParsedUnit> {
    let (fragments, placeholders) = scanner::scan(content, url.to_string())?;
    let skeleton = build_skeleton(&fragments);
    let tokens = lexer::lex(&skeleton, url.to_string(), config)?;
    let mut chtl = parser::parse(tokens)?;

    let mut chtl_js_queue = VecDeque::new();
    let mut css_queue = VecDeque::new();
    let mut literal_queue = VecDeque::new();
    for fragment in &fragments {
        match &fragment.kind {
            FragmentKind::ChtlJs => chtl_js_queue.push_back(fragment.text().to_string()),
            FragmentKind::Css => css_queue.push_back(fragment.text().to_string()),
            FragmentKind::Literal(_) => {
                if let Some(id) = fragment.placeholder {
                    literal_queue.push_back(id);
                }
            }
            FragmentKind::Chtl | FragmentKind::Js => {}
        }
    }

    zip_nodes(&mut chtl.nodes, &mut chtl_js_queue, &mut css_queue, &mut literal_queue, ctx);
    Ok(ParsedUnit { nodes: chtl.nodes, placeholders })
}

/// Picks the namespace an `@Chtl` import's definitions land under (spec
/// §3.7, §4.4). `path::ns` selects a specific sub-namespace of the target
/// file; `as alias` renames the mount point; otherwise a file gets an
/// implicit namespace named after itself unless `DISABLE_DEFAULT_NAMESPACE`
/// says every file shares the root namespace.
fn import_namespace_for(import: &Import, config: &Configuration) -> String {
    if let Some(ns) = &import.from_namespace {
        return ns.clone();
    }
    if let Some(alias) = &import.alias {
        return alias.clone();
    }
    if config.disable_default_namespace() {
        return String::new();
    }
    Path::new(&import.path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| import.path.clone())
}

/// Registers one file's top-level nodes into the symbol table under
/// `namespace`, recursing into child `[Namespace]` blocks and `@Chtl`
/// imports. Returns the file's own node list so the caller can later
/// resolve/generate it (imported files only ever contribute definitions,
/// never their own HTML, unless referenced back in via a `[Namespace]` or
/// `@Element`/`@Var` usage).
fn populate_symbol_table(
    nodes: &[Node],
    namespace: &str,
    file_path: &Path,
    placeholders: &PlaceholderTable,
    ctx: &mut CompileContext,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::TemplateDefinition(t) => {
                ctx.table.define(namespace, Definition::Template(t.clone()), false)?;
            }
            Node::CustomDefinition(c) => {
                ctx.table.define(namespace, Definition::Custom(c.clone()), false)?;
            }
            Node::Configuration(cfg) => ctx.table.apply_configuration(cfg),
            Node::Origin { kind, name, placeholder, .. } => {
                if let (Some(id), Some(name)) = (*placeholder, name.as_deref()) {
                    let is_standard = matches!(kind.as_str(), "Html" | "Style" | "Css" | "JavaScript" | "Js");
                    if is_standard || !ctx.table.configuration.disable_custom_origin_type() {
                        ctx.table.register_origin_block(name, placeholders.get(id).to_string());
                    }
                }
            }
            Node::Namespace(ns) => {
                let child = crate::chtl::symbol_table::qualify(namespace, &ns.name);
                let parent = if namespace.is_empty() { None } else { Some(namespace) };
                ctx.table.register_namespace(&child, parent)?;
                populate_symbol_table(&ns.children, &child, file_path, placeholders, ctx)?;
            }
            Node::Import(import) => {
                populate_import(import, namespace, file_path, ctx)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn populate_import(import: &Import, namespace: &str, file_path: &Path, ctx: &mut CompileContext) -> Result<()> {
    match import.kind {
        ImportKind::Chtl => match ctx.imports.begin_chtl_load(import, file_path)? {
            ChtlTarget::AlreadyLoaded => Ok(()),
            ChtlTarget::Load(canonical) => {
                let file_ns = import_namespace_for(import, &ctx.table.configuration);
                let imported = compile_unit_into_table(&canonical, &file_ns, ctx)?;
                apply_exports(&imported, &file_ns, namespace, &mut ctx.table);
                ctx.imports.finish_chtl_load(canonical);
                Ok(())
            }
        },
        ImportKind::Html | ImportKind::Css | ImportKind::JavaScript => {
            ctx.imports.resolve_raw(import, file_path, &mut ctx.table)
        }
        ImportKind::CJmod => ctx.imports.resolve_cjmod_package(import, file_path, &mut ctx.table),
    }
}

/// Reads, parses, zips and registers one `@Chtl` import target, returning
/// its own top-level nodes (spec §4.4). The root file's equivalent work
/// happens inline in [`compile_file`] since it isn't reached through an
/// `Import` node.
fn compile_unit_into_table(path: &Path, namespace: &str, ctx: &mut CompileContext) -> Result<Vec<Node>> {
    let content = ctx.imports.read_cached(path)?;
    let url = path.to_string_lossy().into_owned();
    let config = ctx.table.configuration.clone();
    let parsed = parse_and_zip(&content, &url, &config, ctx)?;
    populate_symbol_table(&parsed.nodes, namespace, path, &parsed.placeholders, ctx)?;
    Ok(parsed.nodes)
}

/// Compiles a single `.chtl` file to its combined HTML/CSS/JS artifact
/// (spec §3.1's full pipeline, §6.1's CLI-facing contract).
pub fn compile_file(path: &Path, config: &CompilerConfig) -> Result<Artifact> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CompileError::io(format!("cannot read `{}`: {e}", path.display())))?
        .replace("\r\n", "\n");
    compile_source(&content, path, config)
}

/// Core of [`compile_file`], split out so callers that already have source
/// text in hand (tests, a future `--stdin` mode) don't need a real file.
pub fn compile_source(content: &str, path: &Path, config: &CompilerConfig) -> Result<Artifact> {
    let mut ctx = CompileContext::new(config);
    let url = path.to_string_lossy().into_owned();

    let root_config = ctx.table.configuration.clone();
    let parsed = parse_and_zip(content, &url, &root_config, &mut ctx)?;
    populate_symbol_table(&parsed.nodes, "", path, &parsed.placeholders, &mut ctx)?;

    if config.strict {
        ctx.table.configuration.validate_strict()?;
    }

    let resolver = Resolver::new(&ctx.table);
    let expanded = resolver.expand_tree("", parsed.nodes)?;

    let constraint_errors = resolver.check_constraints(&expanded);
    for err in &constraint_errors {
        ctx.diagnostics.push_error(err);
    }
    if let Some(first) = constraint_errors.into_iter().next() {
        return Err(first);
    }

    let mut generated = generator::generate(&expanded, &ctx.table.configuration, &ctx.table, &parsed.placeholders)?;

    for style in &ctx.global_styles {
        generated.css.push_str(style);
        generated.css.push('\n');
    }
    for script in &ctx.global_scripts {
        let lowered = chtl_js::lower(script)?;
        generated.js.push_str(&lowered);
        generated.js.push('\n');
    }

    let unit = MergeUnit { priority: 0, source_order: 0, output: generated };
    let mut artifact = merger::merge(vec![unit], &config.merge);

    if config.merge.output_sourcemaps {
        artifact.html_source_map = Some(trivial_source_map(&url, content));
    }

    Ok(artifact)
}

/// A coarse source map covering the whole file as one segment. The
/// generator doesn't track per-token source positions through evaluation
/// and lowering, so this is a best-effort "points back at the file", not a
/// token-accurate map.
fn trivial_source_map(url: &str, content: &str) -> crate::output::SourceMap {
    let mut gen = SourceMapGenerator::new(None);
    gen.add_source(url.to_string(), Some(content.to_string()));
    gen.add_line();
    let _ = gen.add_mapping(0, Some(url.to_string()), Some(0), Some(0));
    gen.to_json().expect("a single mapping was just added")
}

/// Compiles every `.chtl` file found under `root` (recursively), for the
/// CLI's `build` subcommand (spec §6.1). Each file produces its own
/// artifact; they are not merged together, since a CHTL project is a tree
/// of independent documents sharing a module path, not one monolithic page.
pub fn compile_project(root: &Path, config: &CompilerConfig) -> Result<Vec<(PathBuf, Artifact)>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| CompileError::io(format!("cannot read `{}`: {e}", dir.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| CompileError::io(e.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("chtl") {
                let artifact = compile_file(&path, config)?;
                out.push((path, artifact));
            }
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> CompilerConfig {
        CompilerConfig::default()
    }

    #[test]
    fn compiles_a_basic_element_to_html() {
        let artifact = compile_source(r#"div { text { "Hello" } }"#, Path::new("t.chtl"), &default_config()).unwrap();
        assert!(artifact.html.contains("<div>Hello</div>"));
    }

    #[test]
    fn global_style_block_lands_in_css() {
        let src = "style { div { color: red; } }\nbody { text { \"hi\" } }";
        let artifact = compile_source(src, Path::new("t.chtl"), &default_config()).unwrap();
        assert!(artifact.html.contains("color:red") || artifact.css_file.as_deref().unwrap_or("").contains("color:red"));
    }

    #[test]
    fn template_usage_resolves_across_the_file() {
        let src = r#"
            [Template] @Style Base { color: blue; }
            div { style { @Style Base; } }
        "#;
        let artifact = compile_source(src, Path::new("t.chtl"), &default_config()).unwrap();
        assert!(artifact.html.contains("color:blue;"));
    }
}
