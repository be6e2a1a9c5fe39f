//! The CHTL AST (spec §3.4) and the expression AST it embeds (spec §3.5).
//!
//! Property values are always expression trees, never free strings (spec
//! §3.7): a quoted string literal parses into `Expr::Literal(Literal::Str)`
//! just like an unquoted one, so a downstream pass never needs to guess
//! whether a value still needs parsing.

use crate::parse_util::Span;
use std::rc::Rc;

/// Style/element/var: the three kinds a `[Template]` or `[Custom]` may take
/// (spec §3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Style,
    Element,
    Var,
}

/// `[Import]` target kind (spec §3.4, §6.3's at-type modifiers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    Html,
    Css,
    JavaScript,
    Chtl,
    CJmod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...` or `/* ... */` — stripped, never reaches the generator.
    Source,
    /// `# ...` — becomes an HTML comment (spec §4.6, SPEC_FULL §11.1).
    Generator,
}

/// An anchor a specialization operation or nested-selector rule targets
/// (spec §4.3's `delete`/`insert`/`replace`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Tag(String),
    Selector(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
    Replace,
    AtTop,
    AtBottom,
}

#[derive(Debug, Clone)]
pub struct InsertOp {
    pub position: InsertPosition,
    pub anchor: Option<Anchor>,
    pub payload: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct DeleteOp {
    pub anchor: Anchor,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReplaceOp {
    pub anchor: Anchor,
    pub payload: Vec<Node>,
    pub span: Span,
}

/// A `@Style Name;` / `@Element Name;` / `@Var Name(key);` usage site, with
/// optional `[i]` index and local `{ ... }` overrides (spec §4.3).
#[derive(Debug, Clone)]
pub struct Usage {
    pub kind: DefinitionKind,
    pub name: String,
    pub namespace: Option<String>,
    pub index: Option<usize>,
    pub var_key: Option<String>,
    pub overrides: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// A nested selector rule inside a `Style` block, e.g. `&:hover { ... }` or
/// `.child { ... }` (spec §4.3's context selector rule).
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: String,
    pub properties: Vec<Property>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StyleChild {
    Property(Property),
    Rule(StyleRule),
    Usage(Usage),
}

#[derive(Debug, Clone)]
pub struct Style {
    pub children: Vec<StyleChild>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Script {
    /// The raw CHTL-JS source text this script block owns; lowered by the
    /// CHTL-JS pipeline (spec §4.7) before being folded into the JS buffer.
    pub source: Rc<str>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub forbidden: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Property>,
    pub children: Vec<Node>,
    pub style: Option<Style>,
    pub script: Option<Script>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub kind: DefinitionKind,
    pub name: String,
    pub body: Vec<Node>,
    pub inherits: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CustomDefinition {
    pub kind: DefinitionKind,
    pub name: String,
    pub body: Vec<Node>,
    pub inherits: Vec<String>,
    pub inserts: Vec<InsertOp>,
    pub deletes: Vec<DeleteOp>,
    pub replaces: Vec<ReplaceOp>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub kind: ImportKind,
    pub path: String,
    pub alias: Option<String>,
    pub from_namespace: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub children: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConfigurationNode {
    pub entries: Vec<(String, String)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InfoNode {
    pub entries: Vec<(String, String)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub kind: DefinitionKind,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ExportNode {
    pub entries: Vec<ExportEntry>,
    pub span: Span,
}

/// `use html5;` style document-type directive.
#[derive(Debug, Clone)]
pub struct UseDirective {
    pub doctype: String,
    pub span: Span,
}

/// Which global (document- or namespace-level, never element-nested) raw
/// block a [`Node::RawPass`] marks the position of (SPEC_FULL §12's
/// local/global `style` split, and §4.1's "`script` is always scanned
/// out" rule). The scanner already carved the real content out as its own
/// `Css`/`ChtlJs` fragment; this node only keeps that fragment's place in
/// document order so the driver can splice its lowered content into the
/// right buffer without the generator mistaking the keyword for an
/// element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPassKind {
    GlobalStyle,
    GlobalScript,
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String, Span),
    Comment(String, CommentKind, Span),
    /// A bare key/value pair, used inside `@Style`/`@Var` template and
    /// custom bodies (spec §3.4: `Property` is a standalone node kind, not
    /// only a `Style` child).
    Property(Property),
    TemplateDefinition(TemplateDefinition),
    CustomDefinition(CustomDefinition),
    Usage(Usage),
    Import(Import),
    Namespace(Namespace),
    Configuration(ConfigurationNode),
    Info(InfoNode),
    Export(ExportNode),
    Constraint(Constraint),
    Use(UseDirective),
    /// A raw `[Origin] @Kind { ... }` or bodyless `[Origin] @Kind name;`
    /// reference, carried through to generation verbatim (spec §4.1).
    Origin {
        kind: String,
        name: Option<String>,
        placeholder: Option<crate::scanner::PlaceholderId>,
        span: Span,
    },
    /// Placeholder for a global `style`/`script` block the scanner already
    /// extracted as its own fragment (see [`RawPassKind`]).
    RawPass(RawPassKind, Span),
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Element(e) => &e.span,
            Node::Text(_, s) => s,
            Node::Comment(_, _, s) => s,
            Node::Property(p) => &p.span,
            Node::TemplateDefinition(d) => &d.span,
            Node::CustomDefinition(d) => &d.span,
            Node::Usage(u) => &u.span,
            Node::Import(i) => &i.span,
            Node::Namespace(n) => &n.span,
            Node::Configuration(c) => &c.span,
            Node::Info(i) => &i.span,
            Node::Export(e) => &e.span,
            Node::Constraint(c) => &c.span,
            Node::Use(u) => &u.span,
            Node::Origin { span, .. } => span,
            Node::RawPass(_, span) => span,
        }
    }
}

/// The whole parse of one file: a flat list of top-level nodes plus the
/// placeholder table the scanner produced (needed at generation time for
/// `Origin` bodies, spec §4.1).
#[derive(Debug, Clone)]
pub struct Chtl {
    pub nodes: Vec<Node>,
}

// ---------------------------------------------------------------------
// Expression AST (spec §3.5)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number { value: f64, unit: Option<String> },
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A reference to another element's effective property value, e.g.
/// `#box.width` or `div.height` (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    pub selector: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    PropertyRef(PropertyRef),
    /// Dispatched through the CJMOD-fed function registry (spec §4.5).
    FunctionCall { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn unitless_number(value: f64) -> Expr {
        Expr::Literal(Literal::Number { value, unit: None })
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Str(value.into()))
    }
}
