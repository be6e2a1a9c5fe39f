//! The scanner's output vocabulary (spec §3.2, §4.1).
//!
//! A [`Fragment`] is a non-overlapping slice of the source file tagged with
//! the pipeline that owns it. Fragments are totally ordered by source
//! position and their spans, concatenated, reproduce the original file
//! byte-for-byte — nothing is dropped, nothing is duplicated.

use crate::parse_util::Span;
use std::fmt;

/// Opaque key into a [`PlaceholderTable`]. Never rendered or parsed; only
/// ever used to look a fragment's original text back up at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(pub u32);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of content the original `[Origin]` target names (spec §4.1,
/// SPEC_FULL §11: origin custom types). The scanner doesn't validate this
/// against the configuration's `DISABLE_CUSTOM_ORIGIN_TYPE` flag — that's a
/// semantic-resolver concern (spec §12).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginKind {
    Html,
    Css,
    JavaScript,
    Custom(String),
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginKind::Html => write!(f, "Html"),
            OriginKind::Css => write!(f, "Css"),
            OriginKind::JavaScript => write!(f, "JavaScript"),
            OriginKind::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// The pipeline a fragment's text belongs to. The fixed four kinds from
/// spec §3.2, plus `Literal` for `[Origin]` bodies, which are opaque to all
/// four typed pipelines (SPEC_FULL §11) and are reinserted verbatim by the
/// generator rather than parsed by any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    Chtl,
    ChtlJs,
    Css,
    Js,
    Literal(OriginKind),
}

/// One scanned slice of the source file.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub span: Span,
    /// Set for fragments that are never re-lexed by any pipeline (raw
    /// `[Origin]` bodies) — the generator looks these up verbatim rather
    /// than re-deriving the text from `span`, so round-tripping survives
    /// even if a later pass rewrites surrounding spans.
    pub placeholder: Option<PlaceholderId>,
    /// The optional name following `[Origin] @Kind` (spec §4.1,
    /// SPEC_FULL §11.2): `[Origin] @Html Banner { ... }` registers this
    /// block under `Banner` for later bodyless `[Origin] @Html Banner;`
    /// re-emission, instead of inlining where it's defined.
    pub origin_name: Option<String>,
}

impl Fragment {
    pub fn new(kind: FragmentKind, span: Span) -> Self {
        Fragment { kind, span, placeholder: None, origin_name: None }
    }

    pub fn with_placeholder(mut self, id: PlaceholderId) -> Self {
        self.placeholder = Some(id);
        self
    }

    pub fn with_origin_name(mut self, name: impl Into<String>) -> Self {
        self.origin_name = Some(name.into());
        self
    }

    pub fn text(&self) -> &str {
        self.span.text()
    }
}

/// Side table mapping placeholder ids to their exact original text, keyed
/// separately from the AST so the generator can substitute a fragment back
/// unchanged without the substitution marker ever touching the token stream
/// (a textual marker could collide with user content; an integer key can't).
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTable {
    entries: Vec<String>,
}

impl PlaceholderTable {
    pub fn new() -> Self {
        PlaceholderTable::default()
    }

    pub fn insert(&mut self, text: impl Into<String>) -> PlaceholderId {
        let id = PlaceholderId(self.entries.len() as u32);
        self.entries.push(text.into());
        id
    }

    pub fn get(&self, id: PlaceholderId) -> &str {
        &self.entries[id.0 as usize]
    }
}
