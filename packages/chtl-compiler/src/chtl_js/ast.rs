//! The shallow CHTL-JS AST (spec §4.7): just enough structure to identify
//! each extended construct. Interior JavaScript is never parsed — it's
//! carried as opaque text and re-emitted verbatim by the generator.

/// One key/value entry inside a `listen`/`delegate`/`animate`/`vir`/
/// `fileloader` object body. `value` is raw JS text, untouched.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Segment {
    /// Plain JavaScript passed through unchanged.
    Raw(String),
    /// `{{selector}}`, `{{selector[i]}}`, `{{#id}}`.
    EnhancedSelector { selector: String, index: Option<String> },
    /// `target->listen { event: fn, ... }`.
    Listen { target: String, entries: Vec<Entry> },
    /// `parent->delegate { target: sel, event: fn, ... }`.
    Delegate { parent: String, entries: Vec<Entry> },
    /// `animate { target, duration, easing, begin, when: [...], end, loop, direction, delay, callback }`.
    Animate { entries: Vec<Entry> },
    /// `router { "/url": page, ... }`.
    Router { entries: Vec<Entry> },
    /// `vir Name = { ... }`.
    Vir { name: String, entries: Vec<Entry> },
    /// `fileloader { load: "...", ... }`.
    FileLoader { entries: Vec<Entry> },
    /// `util COND -> change { THEN } -> then { ELSE }`.
    Util { condition: String, change: String, then: String },
    /// `iNeverAway { ... }` (Chtholly CJMOD, SPEC_FULL §11.3).
    INeverAway { entries: Vec<Entry> },
    /// `printMylove(template, ...)` (Chtholly CJMOD, SPEC_FULL §11.3).
    PrintMylove { args: Vec<String> },
}
