//! The CHTL generator (spec §4.6): walks the fully-resolved AST and emits
//! HTML, CSS and JS buffers. CHTL-JS lowering is delegated to
//! `crate::chtl_js` (spec §4.7); this module only collects each `Script`
//! block's source and hands it off.

use super::ast::*;
use super::evaluator::Evaluator;
use super::symbol_table::SymbolTable;
use crate::chtl_js;
use crate::config::Configuration;
use crate::error::Result;
use crate::html5;
use crate::scanner::PlaceholderTable;
use std::fmt::Write as _;

pub struct GeneratedOutput {
    pub html: String,
    pub css: String,
    pub js: String,
}

pub struct Generator<'a> {
    config: &'a Configuration,
    table: &'a SymbolTable,
    placeholders: &'a PlaceholderTable,
    evaluator: Evaluator<'a>,
    css: String,
    js: String,
    auto_class_counter: usize,
}

/// `table` resolves bodyless `[Origin] @Kind name;` re-emission and
/// `placeholders` backs literal `[Origin]` bodies (spec §4.1, §9
/// "placeholder substitution").
pub fn generate(
    nodes: &[Node],
    config: &Configuration,
    table: &SymbolTable,
    placeholders: &PlaceholderTable,
) -> Result<GeneratedOutput> {
    let mut generator = Generator {
        config,
        table,
        placeholders,
        evaluator: Evaluator::new(nodes),
        css: String::new(),
        js: String::new(),
        auto_class_counter: 0,
    };
    let mut html = String::new();
    for node in nodes {
        generator.emit_node(node, &mut html, None)?;
    }
    Ok(GeneratedOutput { html, css: generator.css, js: generator.js })
}

impl<'a> Generator<'a> {
    fn emit_node(&mut self, node: &Node, out: &mut String, ancestor_selector: Option<&str>) -> Result<()> {
        match node {
            Node::Element(el) => self.emit_element(el, out, ancestor_selector),
            Node::Text(text, _) => {
                out.push_str(&html5::escape_html(text));
                Ok(())
            }
            Node::Comment(text, CommentKind::Generator, _) => {
                let _ = write!(out, "<!--{text}-->");
                Ok(())
            }
            Node::Comment(_, CommentKind::Source, _) => Ok(()),
            // A namespace is a pure scoping construct (spec §3.4); its
            // children still render in document order wherever the
            // namespace itself sits.
            Node::Namespace(ns) => {
                for child in &ns.children {
                    self.emit_node(child, out, ancestor_selector)?;
                }
                Ok(())
            }
            Node::Origin { kind, name, placeholder, .. } => {
                self.emit_origin(kind, name.as_deref(), *placeholder, out)
            }
            Node::RawPass(_, _) => Ok(()),
            Node::Use(_) | Node::Import(_) | Node::Configuration(_)
            | Node::Info(_) | Node::Export(_) | Node::Constraint(_) | Node::TemplateDefinition(_)
            | Node::CustomDefinition(_) | Node::Usage(_) | Node::Property(_) => Ok(()),
        }
    }

    /// Origin blocks re-emit verbatim into the channel their kind names
    /// (spec §4.1, §4.6): `@Html` (and any custom-registered type, SPEC_FULL
    /// §11.2) goes into the HTML buffer in place; `@Style`/`@Css` and
    /// `@JavaScript`/`@Js` accumulate into the CSS/JS buffers instead, since
    /// those aren't part of the document tree.
    fn emit_origin(
        &mut self,
        kind: &str,
        name: Option<&str>,
        placeholder: Option<crate::scanner::PlaceholderId>,
        out: &mut String,
    ) -> Result<()> {
        let text = match placeholder {
            Some(id) => self.placeholders.get(id).to_string(),
            None => match name.and_then(|n| self.table.lookup_origin_block(n)) {
                Some(text) => text.to_string(),
                None => return Ok(()),
            },
        };
        match kind {
            "Style" | "Css" | "CSS" => {
                self.css.push_str(&text);
                self.css.push('\n');
            }
            "JavaScript" | "Js" => {
                self.js.push_str(&text);
                self.js.push('\n');
            }
            _ => out.push_str(&text),
        }
        Ok(())
    }

    fn emit_element(&mut self, el: &Element, out: &mut String, ancestor_selector: Option<&str>) -> Result<()> {
        let effective_selector = self.effective_selector(el, ancestor_selector);

        out.push('<');
        out.push_str(&el.tag);

        let mut attrs = el.attributes.clone();
        self.auto_add_class_id(el, &mut attrs, &effective_selector);

        for attr in &attrs {
            let value = self.evaluator.eval(&attr.value)?.to_css_string();
            let _ = write!(out, " {}=\"{}\"", attr.name, html5::escape_html(&value));
        }

        if let Some(style) = &el.style {
            let inline = self.emit_style(style, &effective_selector)?;
            if !inline.is_empty() {
                let _ = write!(out, " style=\"{inline}\"");
            }
        }

        if html5::is_void_element(&el.tag) {
            out.push_str(" />");
            return Ok(());
        }
        out.push('>');

        for child in &el.children {
            self.emit_node(child, out, Some(&effective_selector))?;
        }

        if let Some(script) = &el.script {
            let lowered = chtl_js::lower(&script.source)?;
            self.js.push_str(&lowered);
            self.js.push('\n');
        }

        let _ = write!(out, "</{}>", el.tag);
        Ok(())
    }

    /// The id (preferred), first class, or an auto-generated class used to
    /// anchor this element's nested selectors and `&` resolution (spec
    /// §4.3, §4.6).
    fn effective_selector(&mut self, el: &Element, ancestor: Option<&str>) -> String {
        if let Some(id) = el.attributes.iter().find(|a| a.name == "id") {
            if let Some(text) = literal_text(&id.value) {
                return format!("#{text}");
            }
        }
        if let Some(class) = el.attributes.iter().find(|a| a.name == "class") {
            if let Some(text) = literal_text(&class.value) {
                if let Some(first) = text.split_whitespace().next() {
                    return format!(".{first}");
                }
            }
        }
        if el.style.is_some() {
            self.auto_class_counter += 1;
            return format!(".chtl-auto-{}", self.auto_class_counter);
        }
        ancestor.map(str::to_string).unwrap_or_else(|| el.tag.clone())
    }

    /// Adds a synthesized `class` attribute when a style block needs a
    /// selector to hang off and none is user-supplied, unless
    /// `DISABLE_STYLE_AUTO_ADD_CLASS`/`_ID` is set (spec §4.6, §6.4).
    fn auto_add_class_id(&self, el: &Element, attrs: &mut Vec<Property>, selector: &str) {
        if el.style.is_none() {
            return;
        }
        if attrs.iter().any(|a| a.name == "id" || a.name == "class") {
            return;
        }
        if let Some(class) = selector.strip_prefix('.') {
            if !self.config.disable_style_auto_add_class() {
                attrs.push(synthetic_property("class", class));
            }
        } else if let Some(id) = selector.strip_prefix('#') {
            if !self.config.disable_style_auto_add_id() {
                attrs.push(synthetic_property("id", id));
            }
        }
    }

    /// Emits a style block's local properties as an inline-style string and
    /// accumulates its nested-selector rules into the global CSS buffer
    /// (spec §4.6). Returns the `style="..."` attribute content.
    fn emit_style(&mut self, style: &Style, effective_selector: &str) -> Result<String> {
        let mut inline = String::new();
        for child in &style.children {
            match child {
                StyleChild::Property(p) => {
                    let value = self.evaluator.eval(&p.value)?.to_css_string();
                    let _ = write!(inline, "{}:{};", p.name, value);
                }
                StyleChild::Rule(rule) => self.emit_rule(rule, effective_selector)?,
                StyleChild::Usage(_) => {}
            }
        }
        Ok(inline)
    }

    fn emit_rule(&mut self, rule: &StyleRule, effective_selector: &str) -> Result<()> {
        let selector = if rule.selector.starts_with('&') {
            rule.selector.replacen('&', effective_selector, 1)
        } else {
            format!("{effective_selector} {}", rule.selector)
        };
        let mut body = String::new();
        for prop in &rule.properties {
            let value = self.evaluator.eval(&prop.value)?.to_css_string();
            let _ = write!(body, "{}:{};", prop.name, value);
        }
        let _ = write!(self.css, "{selector} {{ {body} }}\n");
        Ok(())
    }
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Literal(Literal::Str(s)) => Some(s.clone()),
        _ => None,
    }
}

fn synthetic_property(name: &str, value: &str) -> Property {
    use crate::parse_util::{Position, SourceFile, Span};
    use std::rc::Rc;
    let file = Rc::new(SourceFile::new(String::new(), "<synthetic>"));
    let pos = Position::start_of(file);
    Property { name: name.to_string(), value: Expr::string(value), span: Span::new(pos.clone(), pos) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chtl::lexer::lex;
    use crate::chtl::parser::parse;
    use crate::scanner::PlaceholderTable;

    fn gen(src: &str) -> GeneratedOutput {
        let cfg = Configuration::default();
        let toks = lex(src, "t.chtl", &cfg).unwrap();
        let chtl = parse(toks).unwrap();
        let table = SymbolTable::new();
        let placeholders = PlaceholderTable::new();
        generate(&chtl.nodes, &cfg, &table, &placeholders).unwrap()
    }

    #[test]
    fn basic_element_with_text() {
        let out = gen(r#"div { text { "Hello" } }"#);
        assert_eq!(out.html, "<div>Hello</div>");
    }

    #[test]
    fn inline_style_is_emitted() {
        let out = gen("div { style { color: red; font-size: 16px; } }");
        assert_eq!(out.html, r#"<div style="color:red;font-size:16px;"></div>"#);
    }

    #[test]
    fn nested_selector_produces_global_rule() {
        let out = gen("div { id: main; style { &:hover { border: 1; } } }");
        assert_eq!(out.html, r#"<div id="main"></div>"#);
        assert!(out.css.contains("#main:hover"));
    }

    #[test]
    fn void_elements_self_close() {
        let out = gen(r#"img { src: "a.png"; }"#);
        assert_eq!(out.html, r#"<img src="a.png" />"#);
    }

    #[test]
    fn generator_comment_becomes_html_comment() {
        let out = gen("div { # a note\n}");
        assert!(out.html.contains("<!--a note-->"));
    }
}
