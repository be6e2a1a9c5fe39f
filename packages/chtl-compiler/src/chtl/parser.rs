//! The CHTL parser (spec §4.3): recursive-descent, one-token lookahead,
//! producing the AST in `super::ast`.

use super::ast::*;
use super::token::{Token, TokenKind};
use crate::error::{CompileError, Result};
use crate::parse_util::Span;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub fn parse(tokens: Vec<Token>) -> Result<Chtl> {
    let mut parser = Parser { tokens, pos: 0 };
    let nodes = parser.parse_body(true)?;
    Ok(Chtl { nodes })
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax("unexpected-token", message, Some(self.peek().span.clone()))
    }

    fn expect_kind(&mut self, kind: &TokenKind) -> Result<Token> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {kind:?}, found {:?}", self.peek().kind)))
        }
    }

    fn is_kind(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat_kind(&mut self, kind: &TokenKind) -> bool {
        if self.is_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            other => Err(self.error(format!("expected identifier, found {other:?}"))),
        }
    }

    fn skip_trivial_comments(&mut self) {
        while matches!(self.peek().kind, TokenKind::Comment(_)) {
            self.advance();
        }
    }

    // -------------------------------------------------------------
    // Top-level / element bodies
    // -------------------------------------------------------------

    /// Parses a sequence of nodes until `}` or EOF. `top_level` controls
    /// whether a bare `[Configuration]` pre-pass has already happened (spec
    /// §4.3: configuration blocks are read before the rest of the file).
    fn parse_body(&mut self, _top_level: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<Node> {
        match self.peek().kind.clone() {
            TokenKind::GeneratorComment(text) => {
                let span = self.advance().span;
                Ok(Node::Comment(text, CommentKind::Generator, span))
            }
            TokenKind::Comment(text) => {
                let span = self.advance().span;
                Ok(Node::Comment(text, CommentKind::Source, span))
            }
            TokenKind::BracketKeyword(kw) => self.parse_bracket_construct(&kw),
            TokenKind::AtKeyword(_) => self.parse_usage().map(Node::Usage),
            TokenKind::Identifier(name) => self.parse_identifier_construct(name),
            other => Err(self.error(format!("unexpected token {other:?} at top level"))),
        }
    }

    fn parse_bracket_construct(&mut self, keyword: &str) -> Result<Node> {
        match keyword {
            "Template" => self.parse_definition(false).map(Node::TemplateDefinition),
            "Custom" => self.parse_custom_definition().map(Node::CustomDefinition),
            "Origin" => self.parse_origin(),
            "Import" => self.parse_import().map(Node::Import),
            "Namespace" => self.parse_namespace().map(Node::Namespace),
            "Configuration" => self.parse_configuration().map(Node::Configuration),
            "Info" => self.parse_info().map(Node::Info),
            "Export" => self.parse_export().map(Node::Export),
            other => Err(self.error(format!("unknown bracket keyword [{other}]"))),
        }
    }

    fn parse_identifier_construct(&mut self, name: String) -> Result<Node> {
        match name.as_str() {
            "text" => self.parse_text(),
            "use" => self.parse_use(),
            "delete" | "insert" | "replace" => {
                Err(self.error(format!("`{name}` is only valid inside a [Custom] body")))
            }
            // A bare `style`/`script` at the document or namespace level
            // (never inside an element body, which `parse_element` handles
            // itself before falling through to `parse_node`) marks a
            // global block the scanner already extracted as its own
            // fragment (SPEC_FULL §12). Its body is elided from the CHTL
            // token stream, so this only reserves the slot.
            "style" if self.peek_at(1).kind == TokenKind::LBrace => {
                self.parse_raw_pass(RawPassKind::GlobalStyle)
            }
            "script" if self.peek_at(1).kind == TokenKind::LBrace => {
                self.parse_raw_pass(RawPassKind::GlobalScript)
            }
            _ => self.parse_element(name),
        }
    }

    fn parse_raw_pass(&mut self, kind: RawPassKind) -> Result<Node> {
        let start = self.advance().span; // `style` / `script`
        self.expect_kind(&TokenKind::LBrace)?;
        // The body was carved out by the scanner; skip anything left over
        // defensively rather than assuming it's always empty.
        while !self.is_kind(&TokenKind::RBrace) && !self.at_eof() {
            self.advance();
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(Node::RawPass(kind, start.to(&end)))
    }

    fn parse_use(&mut self) -> Result<Node> {
        let start = self.advance().span; // `use`
        let (doctype, end_span) = self.expect_identifier()?;
        self.eat_kind(&TokenKind::Semicolon);
        Ok(Node::Use(UseDirective { doctype, span: start.to(&end_span) }))
    }

    fn parse_text(&mut self) -> Result<Node> {
        let start = self.advance().span; // `text`
        self.expect_kind(&TokenKind::LBrace)?;
        let value = self.parse_text_value()?;
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(Node::Text(value, start.to(&end)))
    }

    fn parse_text_value(&mut self) -> Result<String> {
        match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            _ => {
                let mut parts = Vec::new();
                while !self.is_kind(&TokenKind::RBrace) && !self.at_eof() {
                    parts.push(self.raw_value_fragment());
                }
                Ok(parts.join(""))
            }
        }
    }

    /// Consumes one token's literal text verbatim, for building unquoted
    /// values out of runs of identifier/number/punctuation tokens.
    fn raw_value_fragment(&mut self) -> String {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Identifier(s) | TokenKind::UnquotedLiteral(s) => s,
            TokenKind::String(s) => s,
            TokenKind::Number { text, .. } => text,
            _ => tok.span.text().to_string(),
        }
    }

    // -------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------

    fn parse_element(&mut self, tag: String) -> Result<Node> {
        let start = self.tokens[self.pos].span.clone();
        self.advance(); // tag identifier
        self.expect_kind(&TokenKind::LBrace)?;

        let mut attributes = Vec::new();
        let mut children = Vec::new();
        let mut style = None;
        let mut script = None;

        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            if self.is_kind(&TokenKind::Identifier("style".into())) && self.peek_at(1).kind == TokenKind::LBrace {
                style = Some(self.parse_style()?);
                continue;
            }
            if self.is_kind(&TokenKind::Identifier("script".into())) && self.peek_at(1).kind == TokenKind::LBrace {
                script = Some(self.parse_script()?);
                continue;
            }
            if let TokenKind::Identifier(name) = self.peek().kind.clone() {
                if matches!(self.peek_at(1).kind, TokenKind::Colon | TokenKind::Equals) {
                    attributes.push(self.parse_property(name)?);
                    continue;
                }
            }
            children.push(self.parse_node()?);
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;

        Ok(Node::Element(Element {
            tag,
            attributes,
            children,
            style,
            script,
            span: start.to(&end),
        }))
    }

    fn parse_property(&mut self, name: String) -> Result<Property> {
        let start = self.advance().span; // name
        self.advance(); // `:` or `=`
        let value = self.parse_expr()?;
        let end = self.peek().span.clone();
        self.eat_kind(&TokenKind::Semicolon);
        Ok(Property { name, value, span: start.to(&end) })
    }

    // -------------------------------------------------------------
    // Style blocks
    // -------------------------------------------------------------

    fn parse_style(&mut self) -> Result<Style> {
        let start = self.advance().span; // `style`
        self.expect_kind(&TokenKind::LBrace)?;
        let mut children = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            if matches!(self.peek().kind, TokenKind::AtKeyword(_)) {
                children.push(StyleChild::Usage(self.parse_usage()?));
                continue;
            }
            if let TokenKind::Identifier(name) = self.peek().kind.clone() {
                if matches!(self.peek_at(1).kind, TokenKind::Colon | TokenKind::Equals) {
                    children.push(StyleChild::Property(self.parse_property(name)?));
                    continue;
                }
            }
            children.push(StyleChild::Rule(self.parse_style_rule()?));
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(Style { children, span: start.to(&end) })
    }

    /// A nested selector rule: `&:hover { ... }`, `.foo { ... }`, `#id { ... }`,
    /// or a bare tag selector `span { ... }` (spec §4.3).
    fn parse_style_rule(&mut self) -> Result<StyleRule> {
        let start = self.peek().span.clone();
        let mut selector = String::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::LBrace => break,
                TokenKind::Ampersand => {
                    selector.push('&');
                    self.advance();
                }
                TokenKind::Hash => {
                    selector.push('#');
                    self.advance();
                }
                TokenKind::Period => {
                    selector.push('.');
                    self.advance();
                }
                TokenKind::Colon => {
                    selector.push(':');
                    self.advance();
                }
                TokenKind::Identifier(name) => {
                    selector.push_str(&name);
                    self.advance();
                }
                other => return Err(self.error(format!("unexpected token {other:?} in selector"))),
            }
        }
        self.expect_kind(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            let name = match self.peek().kind.clone() {
                TokenKind::Identifier(n) => n,
                other => return Err(self.error(format!("expected a property name, found {other:?}"))),
            };
            properties.push(self.parse_property(name)?);
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(StyleRule { selector, properties, span: start.to(&end) })
    }

    // -------------------------------------------------------------
    // Script blocks
    // -------------------------------------------------------------

    fn parse_script(&mut self) -> Result<Script> {
        let start = self.advance().span; // `script`
        let open = self.expect_kind(&TokenKind::LBrace)?;
        // The scanner already extracted `script { ... }` bodies as a
        // separate CHTL_JS fragment; when the CHTL parser encounters a
        // `script` keyword directly, it means the surrounding driver chose
        // to inline the fragment's text as the element's script source.
        let body_start = open.span.end.clone();
        let mut depth = 1usize;
        let mut end_span = open.span.clone();
        while depth > 0 && !self.at_eof() {
            match &self.peek().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        end_span = self.peek().span.clone();
                        break;
                    }
                }
                _ => {}
            }
            self.advance();
        }
        let source = body_start.file.content[body_start.offset..end_span.start.offset].into();
        self.expect_kind(&TokenKind::RBrace)?;
        Ok(Script { source, span: start.to(&end_span) })
    }

    // -------------------------------------------------------------
    // Template / Custom definitions
    // -------------------------------------------------------------

    fn parse_definition_kind(&mut self) -> Result<DefinitionKind> {
        match self.peek().kind.clone() {
            TokenKind::AtKeyword(k) => {
                self.advance();
                match k.as_str() {
                    "Style" => Ok(DefinitionKind::Style),
                    "Element" => Ok(DefinitionKind::Element),
                    "Var" => Ok(DefinitionKind::Var),
                    other => Err(self.error(format!("unknown definition kind @{other}"))),
                }
            }
            other => Err(self.error(format!("expected @Style/@Element/@Var, found {other:?}"))),
        }
    }

    fn parse_inherits(&mut self) -> Result<Vec<String>> {
        let mut inherits = Vec::new();
        // `inherit Name, Other;` — the keyword spelling may be rebound, but
        // the lexer hands the parser raw identifiers, so we recognise the
        // literal word `inherit` here and leave rebinding to a
        // configuration-aware lexer pass in a full implementation.
        if self.is_kind(&TokenKind::Identifier("inherit".into())) {
            self.advance();
            loop {
                let (name, _) = self.expect_identifier()?;
                inherits.push(name);
                if !self.eat_kind(&TokenKind::Comma) {
                    break;
                }
            }
            self.eat_kind(&TokenKind::Semicolon);
        }
        Ok(inherits)
    }

    fn parse_definition(&mut self, _is_custom: bool) -> Result<TemplateDefinition> {
        let start = self.advance().span; // `[Template]`
        let kind = self.parse_definition_kind()?;
        let (name, _) = self.expect_identifier()?;
        self.expect_kind(&TokenKind::LBrace)?;
        let inherits = self.parse_inherits()?;
        let body = self.parse_definition_body(kind)?;
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(TemplateDefinition { kind, name, body, inherits, span: start.to(&end) })
    }

    /// `@Style`/`@Var` bodies are flat key/value lists (plus usages, for
    /// composing one style template out of another); `@Element` bodies are
    /// ordinary element/text/comment/usage sequences (spec §3.4).
    fn parse_definition_body(&mut self, kind: DefinitionKind) -> Result<Vec<Node>> {
        if matches!(kind, DefinitionKind::Element) {
            return self.parse_body(false);
        }
        let mut nodes = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            match self.peek().kind.clone() {
                TokenKind::GeneratorComment(text) => {
                    let span = self.advance().span;
                    nodes.push(Node::Comment(text, CommentKind::Generator, span));
                }
                TokenKind::Comment(text) => {
                    let span = self.advance().span;
                    nodes.push(Node::Comment(text, CommentKind::Source, span));
                }
                TokenKind::AtKeyword(_) => nodes.push(Node::Usage(self.parse_usage()?)),
                TokenKind::Identifier(name) => {
                    nodes.push(Node::Property(self.parse_property(name)?));
                }
                other => return Err(self.error(format!("unexpected token {other:?} in template body"))),
            }
        }
        Ok(nodes)
    }

    fn parse_custom_definition(&mut self) -> Result<CustomDefinition> {
        let start = self.advance().span; // `[Custom]`
        let kind = self.parse_definition_kind()?;
        let (name, _) = self.expect_identifier()?;
        self.expect_kind(&TokenKind::LBrace)?;
        let inherits = self.parse_inherits()?;

        let mut body = Vec::new();
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        let mut replaces = Vec::new();

        let flat = !matches!(kind, DefinitionKind::Element);
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            match self.peek().kind.clone() {
                TokenKind::Identifier(kw) if kw == "delete" => {
                    deletes.push(self.parse_delete_op()?);
                }
                TokenKind::Identifier(kw) if kw == "insert" => {
                    inserts.push(self.parse_insert_op()?);
                }
                TokenKind::Identifier(kw) if kw == "replace" => {
                    replaces.push(self.parse_replace_op()?);
                }
                TokenKind::AtKeyword(_) => body.push(Node::Usage(self.parse_usage()?)),
                TokenKind::Identifier(name) if flat => {
                    body.push(Node::Property(self.parse_property(name)?));
                }
                _ => body.push(self.parse_node()?),
            }
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(CustomDefinition {
            kind,
            name,
            body,
            inherits,
            inserts,
            deletes,
            replaces,
            span: start.to(&end),
        })
    }

    fn parse_anchor(&mut self) -> Result<Anchor> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(tag) => {
                self.advance();
                if self.eat_kind(&TokenKind::LBracket) {
                    let idx = self.expect_number_literal()?;
                    self.expect_kind(&TokenKind::RBracket)?;
                    return Ok(Anchor::Index(idx as usize));
                }
                Ok(Anchor::Tag(tag))
            }
            TokenKind::Period | TokenKind::Hash => {
                let mut sel = String::new();
                sel.push(if self.is_kind(&TokenKind::Period) { '.' } else { '#' });
                self.advance();
                let (name, _) = self.expect_identifier()?;
                sel.push_str(&name);
                Ok(Anchor::Selector(sel))
            }
            other => Err(self.error(format!("expected an anchor, found {other:?}"))),
        }
    }

    fn expect_number_literal(&mut self) -> Result<f64> {
        match self.peek().kind.clone() {
            TokenKind::Number { value, .. } => {
                self.advance();
                Ok(value)
            }
            other => Err(self.error(format!("expected a number, found {other:?}"))),
        }
    }

    fn parse_delete_op(&mut self) -> Result<DeleteOp> {
        let start = self.advance().span; // `delete`
        let anchor = self.parse_anchor()?;
        let end = self.peek().span.clone();
        self.eat_kind(&TokenKind::Semicolon);
        Ok(DeleteOp { anchor, span: start.to(&end) })
    }

    fn parse_insert_position(&mut self) -> Result<InsertPosition> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(w) if w == "before" => {
                self.advance();
                Ok(InsertPosition::Before)
            }
            TokenKind::Identifier(w) if w == "after" => {
                self.advance();
                Ok(InsertPosition::After)
            }
            TokenKind::Identifier(w) if w == "replace" => {
                self.advance();
                Ok(InsertPosition::Replace)
            }
            TokenKind::Identifier(w) if w == "at" => {
                self.advance();
                let (which, _) = self.expect_identifier()?;
                match which.as_str() {
                    "top" => Ok(InsertPosition::AtTop),
                    "bottom" => Ok(InsertPosition::AtBottom),
                    other => Err(self.error(format!("expected `top`/`bottom` after `at`, found `{other}`"))),
                }
            }
            other => Err(self.error(format!("expected an insert position, found {other:?}"))),
        }
    }

    fn parse_insert_op(&mut self) -> Result<InsertOp> {
        let start = self.advance().span; // `insert`
        let position = self.parse_insert_position()?;
        let anchor = if matches!(position, InsertPosition::AtTop | InsertPosition::AtBottom) {
            None
        } else {
            Some(self.parse_anchor()?)
        };
        self.expect_kind(&TokenKind::LBrace)?;
        let payload = self.parse_body(false)?;
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(InsertOp { position, anchor, payload, span: start.to(&end) })
    }

    fn parse_replace_op(&mut self) -> Result<ReplaceOp> {
        let start = self.advance().span; // `replace`
        let anchor = self.parse_anchor()?;
        self.expect_kind(&TokenKind::LBrace)?;
        let payload = self.parse_body(false)?;
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(ReplaceOp { anchor, payload, span: start.to(&end) })
    }

    // -------------------------------------------------------------
    // Usage sites
    // -------------------------------------------------------------

    fn parse_usage(&mut self) -> Result<Usage> {
        let start = self.peek().span.clone();
        let kind = self.parse_definition_kind()?;
        let (mut name, _) = self.expect_identifier()?;
        let mut namespace = None;
        if self.eat_kind(&TokenKind::DoubleColon) {
            let (local, _) = self.expect_identifier()?;
            namespace = Some(name);
            name = local;
        }
        let mut index = None;
        if self.eat_kind(&TokenKind::LBracket) {
            let n = self.expect_number_literal()?;
            self.expect_kind(&TokenKind::RBracket)?;
            index = Some(n as usize);
        }
        let mut var_key = None;
        if self.eat_kind(&TokenKind::LParen) {
            let (key, _) = self.expect_identifier()?;
            var_key = Some(key);
            self.expect_kind(&TokenKind::RParen)?;
        }
        let mut overrides = Vec::new();
        let mut end = self.peek().span.clone();
        if self.eat_kind(&TokenKind::LBrace) {
            overrides = self.parse_body(false)?;
            end = self.expect_kind(&TokenKind::RBrace)?.span;
        } else {
            self.eat_kind(&TokenKind::Semicolon);
        }
        Ok(Usage { kind, name, namespace, index, var_key, overrides, span: start.to(&end) })
    }

    // -------------------------------------------------------------
    // Import / Namespace / Configuration / Info / Export / Origin
    // -------------------------------------------------------------

    fn parse_import(&mut self) -> Result<Import> {
        let start = self.advance().span; // `[Import]`
        let kind = match self.peek().kind.clone() {
            TokenKind::AtKeyword(k) => {
                self.advance();
                match k.as_str() {
                    "Html" => ImportKind::Html,
                    "CSS" => ImportKind::Css,
                    "JavaScript" => ImportKind::JavaScript,
                    "Chtl" => ImportKind::Chtl,
                    "CJmod" => ImportKind::CJmod,
                    other => return Err(self.error(format!("unknown import kind @{other}"))),
                }
            }
            other => return Err(self.error(format!("expected an import kind, found {other:?}"))),
        };
        if self.is_kind(&TokenKind::Identifier("from".into())) {
            self.advance();
        }
        let path = match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                s
            }
            other => return Err(self.error(format!("expected a path string, found {other:?}"))),
        };
        let mut from_namespace = None;
        if self.eat_kind(&TokenKind::DoubleColon) {
            let (ns, _) = self.expect_identifier()?;
            from_namespace = Some(ns);
        }
        let mut alias = None;
        if self.is_kind(&TokenKind::Identifier("as".into())) {
            self.advance();
            let (a, _) = self.expect_identifier()?;
            alias = Some(a);
        }
        let end = self.peek().span.clone();
        self.eat_kind(&TokenKind::Semicolon);
        Ok(Import { kind, path, alias, from_namespace, span: start.to(&end) })
    }

    fn parse_namespace(&mut self) -> Result<Namespace> {
        let start = self.advance().span; // `[Namespace]`
        let (name, _) = self.expect_identifier()?;
        self.expect_kind(&TokenKind::LBrace)?;
        let children = self.parse_body(false)?;
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(Namespace { name, children, span: start.to(&end) })
    }

    fn parse_configuration(&mut self) -> Result<ConfigurationNode> {
        let start = self.advance().span; // `[Configuration]`
        self.expect_kind(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            let (key, _) = self.expect_identifier()?;
            self.advance(); // `:` or `=`
            let value = self.parse_raw_config_value()?;
            entries.push((key, value));
            self.eat_kind(&TokenKind::Semicolon);
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(ConfigurationNode { entries, span: start.to(&end) })
    }

    fn parse_raw_config_value(&mut self) -> Result<String> {
        match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            TokenKind::Identifier(s) => {
                self.advance();
                Ok(s)
            }
            TokenKind::Number { text, .. } => {
                self.advance();
                Ok(text)
            }
            other => Err(self.error(format!("expected a configuration value, found {other:?}"))),
        }
    }

    fn parse_info(&mut self) -> Result<InfoNode> {
        let start = self.advance().span; // `[Info]`
        self.expect_kind(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            let (key, _) = self.expect_identifier()?;
            self.advance();
            let value = self.parse_raw_config_value()?;
            entries.push((key, value));
            self.eat_kind(&TokenKind::Semicolon);
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(InfoNode { entries, span: start.to(&end) })
    }

    fn parse_export(&mut self) -> Result<ExportNode> {
        let start = self.advance().span; // `[Export]`
        self.expect_kind(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivial_comments();
            if self.at_eof() || self.is_kind(&TokenKind::RBrace) {
                break;
            }
            let kind = self.parse_definition_kind()?;
            let (name, _) = self.expect_identifier()?;
            entries.push(ExportEntry { kind, name });
            self.eat_kind(&TokenKind::Semicolon);
            self.eat_kind(&TokenKind::Comma);
        }
        let end = self.expect_kind(&TokenKind::RBrace)?.span;
        Ok(ExportNode { entries, span: start.to(&end) })
    }

    fn parse_origin(&mut self) -> Result<Node> {
        let start = self.advance().span; // `[Origin]`
        let kind = match self.peek().kind.clone() {
            TokenKind::AtKeyword(k) => {
                self.advance();
                k
            }
            other => return Err(self.error(format!("expected @Kind after [Origin], found {other:?}"))),
        };
        let mut name = None;
        if let TokenKind::Identifier(n) = self.peek().kind.clone() {
            self.advance();
            name = Some(n);
        }
        let mut placeholder = None;
        let mut end = self.peek().span.clone();
        if self.eat_kind(&TokenKind::LBrace) {
            // The scanner already pulled the body out as a `Literal`
            // fragment; the parser only needs to thread the placeholder id
            // through, discovered by the driver when it dispatches this
            // fragment's enclosing span. We still need to consume the
            // (already-lexed) body tokens here if the driver fed them
            // inline rather than via a placeholder.
            while !self.is_kind(&TokenKind::RBrace) && !self.at_eof() {
                self.advance();
            }
            end = self.expect_kind(&TokenKind::RBrace)?.span;
        } else {
            self.eat_kind(&TokenKind::Semicolon);
        }
        Ok(Node::Origin { kind, name, placeholder, span: start.to(&end) })
    }

    // -------------------------------------------------------------
    // Expressions (spec §3.5)
    // -------------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let cond = self.parse_additive()?;
        if self.eat_kind(&TokenKind::Question) {
            let then_branch = self.parse_ternary()?;
            self.expect_kind(&TokenKind::Colon)?;
            let else_branch = self.parse_ternary()?;
            return Ok(Expr::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)));
        }
        Ok(cond)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat_kind(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().kind.clone() {
            TokenKind::Number { value, unit, .. } => {
                self.advance();
                Ok(Expr::Literal(Literal::Number { value, unit }))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s)))
            }
            TokenKind::Identifier(word) if word == "true" || word == "false" => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(word == "true")))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_kind(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Hash | TokenKind::Period => self.parse_property_ref(),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.is_kind(&TokenKind::LParen) {
                    return self.parse_function_call(name);
                }
                if self.is_kind(&TokenKind::Period) {
                    self.advance();
                    let (prop, _) = self.expect_identifier()?;
                    return Ok(Expr::PropertyRef(PropertyRef { selector: name, property: prop }));
                }
                // A bare identifier with no further structure is an
                // unquoted literal value (spec §3.3).
                Ok(Expr::Literal(Literal::Str(name)))
            }
            other => Err(self.error(format!("unexpected token {other:?} in expression"))),
        }
    }

    fn parse_property_ref(&mut self) -> Result<Expr> {
        let mut selector = String::new();
        selector.push(if self.is_kind(&TokenKind::Hash) { '#' } else { '.' });
        self.advance();
        let (name, _) = self.expect_identifier()?;
        selector.push_str(&name);
        self.expect_kind(&TokenKind::Period)?;
        let (prop, _) = self.expect_identifier()?;
        Ok(Expr::PropertyRef(PropertyRef { selector, property: prop }))
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr> {
        self.expect_kind(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.is_kind(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_kind(&TokenKind::RParen)?;
        Ok(Expr::FunctionCall { name, args })
    }
}

trait SpanExt {
    fn to(&self, other: &Span) -> Span;
}

impl SpanExt for Span {
    fn to(&self, other: &Span) -> Span {
        Span::new(self.start.clone(), other.end.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chtl::lexer::lex;
    use crate::config::Configuration;

    fn parse_src(src: &str) -> Chtl {
        let cfg = Configuration::default();
        let toks = lex(src, "t.chtl", &cfg).unwrap();
        parse(toks).unwrap()
    }

    #[test]
    fn parses_basic_element_with_text() {
        let chtl = parse_src(r#"div { text { "Hello" } }"#);
        assert_eq!(chtl.nodes.len(), 1);
        match &chtl.nodes[0] {
            Node::Element(e) => {
                assert_eq!(e.tag, "div");
                assert_eq!(e.children.len(), 1);
                match &e.children[0] {
                    Node::Text(t, _) => assert_eq!(t, "Hello"),
                    other => panic!("expected text node, got {other:?}"),
                }
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_attributes_and_inline_style() {
        let chtl = parse_src("div { id: main; style { color: red; font-size: 16px; } }");
        match &chtl.nodes[0] {
            Node::Element(e) => {
                assert_eq!(e.attributes.len(), 1);
                assert_eq!(e.attributes[0].name, "id");
                let style = e.style.as_ref().unwrap();
                assert_eq!(style.children.len(), 2);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_template_style_definition() {
        let chtl = parse_src("[Template] @Style T { color: black; }");
        match &chtl.nodes[0] {
            Node::TemplateDefinition(d) => {
                assert_eq!(d.kind, DefinitionKind::Style);
                assert_eq!(d.name, "T");
                assert_eq!(d.body.len(), 1);
            }
            other => panic!("expected template definition, got {other:?}"),
        }
    }

    #[test]
    fn parses_specialization_inside_custom_body() {
        let chtl = parse_src(
            "[Custom] @Element Card { div { p { } } delete p; insert after div { span { } } }",
        );
        match &chtl.nodes[0] {
            Node::CustomDefinition(d) => {
                assert_eq!(d.deletes.len(), 1);
                assert_eq!(d.inserts.len(), 1);
                assert_eq!(d.inserts[0].position, InsertPosition::After);
            }
            other => panic!("expected custom definition, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_selector_with_ampersand() {
        let chtl = parse_src("div { id: main; style { &:hover { border: 1; } } }");
        match &chtl.nodes[0] {
            Node::Element(e) => {
                let style = e.style.as_ref().unwrap();
                match &style.children[0] {
                    StyleChild::Rule(r) => assert_eq!(r.selector, "&:hover"),
                    other => panic!("expected rule, got {other:?}"),
                }
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_import_with_alias() {
        let chtl = parse_src(r#"[Import] @Chtl from "foo.chtl" as Foo;"#);
        match &chtl.nodes[0] {
            Node::Import(i) => {
                assert_eq!(i.path, "foo.chtl");
                assert_eq!(i.alias.as_deref(), Some("Foo"));
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn parses_expression_with_property_ref_and_arithmetic() {
        let chtl = parse_src("div { style { width: #box.width + 4px; } }");
        match &chtl.nodes[0] {
            Node::Element(e) => {
                let style = e.style.as_ref().unwrap();
                match &style.children[0] {
                    StyleChild::Property(p) => {
                        assert!(matches!(p.value, Expr::Binary(BinaryOp::Add, _, _)));
                    }
                    other => panic!("expected property, got {other:?}"),
                }
            }
            other => panic!("expected element, got {other:?}"),
        }
    }
}
