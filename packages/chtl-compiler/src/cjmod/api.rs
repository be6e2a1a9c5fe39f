//! The CJMOD API surface (spec §4.8): the data interface a script-extension
//! implementer programs against. `Syntax` breaks a pattern string into an
//! ordered placeholder schema; `Arg` is a bound instance of that schema;
//! `CJMODScanner`/`CJMODGenerator` read matching source text and emit the
//! lowered result; `CHTLJSFunction` registers a pattern as an extended
//! CHTL-JS construct.

use indexmap::IndexMap;
use std::rc::Rc;

/// Placeholder semantics (spec §4.8): `$` ordered required, `$?` ordered
/// optional, `$!` explicitly required (errors if absent at scan time),
/// `$_name` unordered (matched by name among siblings), `...` variadic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Required,
    Optional,
    ExplicitRequired,
    Unordered,
    Variadic,
}

#[derive(Debug, Clone)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
}

/// An ordered argument schema produced by [`Syntax::analyze`].
#[derive(Debug, Clone, Default)]
pub struct Syntax {
    pub placeholders: Vec<Placeholder>,
}

impl Syntax {
    /// Splits a whitespace-separated pattern string into its placeholder
    /// schema. Unnamed ordinal placeholders (`$`, `$?`, `$!`, `...`) get an
    /// implicit `_N` name in encounter order; `$_name` placeholders keep
    /// their written name.
    pub fn analyze(pattern: &str) -> Syntax {
        let mut placeholders = Vec::new();
        let mut ordinal = 0usize;
        for token in pattern.split_whitespace() {
            let (kind, name) = if let Some(rest) = token.strip_prefix("$_") {
                (PlaceholderKind::Unordered, rest.to_string())
            } else if token == "..." {
                (PlaceholderKind::Variadic, format!("_{ordinal}"))
            } else if token == "$?" {
                (PlaceholderKind::Optional, format!("_{ordinal}"))
            } else if token == "$!" {
                (PlaceholderKind::ExplicitRequired, format!("_{ordinal}"))
            } else if token == "$" {
                (PlaceholderKind::Required, format!("_{ordinal}"))
            } else {
                continue;
            };
            ordinal += 1;
            placeholders.push(Placeholder { name, kind });
        }
        Syntax { placeholders }
    }
}

type Transformer = Rc<dyn Fn(&str) -> String>;

/// A bound instance of a [`Syntax`] schema: raw scanned text per
/// placeholder name, plus optional value transformers.
#[derive(Clone, Default)]
pub struct Arg {
    pub schema: Syntax,
    values: IndexMap<String, String>,
    transformers: IndexMap<String, Transformer>,
}

impl Arg {
    pub fn new(schema: Syntax) -> Self {
        Arg { schema, values: IndexMap::new(), transformers: IndexMap::new() }
    }

    /// Attaches a value transformer invoked by [`Arg::get`]/[`Arg::transform`].
    pub fn bind(&mut self, name: &str, f: impl Fn(&str) -> String + 'static) -> &mut Self {
        self.transformers.insert(name.to_string(), Rc::new(f));
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let raw = self.values.get(name)?;
        Some(match self.transformers.get(name) {
            Some(f) => f(raw),
            None => raw.clone(),
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Copies another `Arg`'s bound values into this one (e.g. two function
    /// calls sharing a common prefix of arguments).
    pub fn fill_value(&mut self, other: &Arg) -> &mut Self {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
        self
    }

    /// Renders `template`, replacing each `$name` run with the (possibly
    /// transformed) bound value for `name`; unbound names are dropped.
    pub fn transform(&self, template: &str) -> String {
        let mut out = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_alphanumeric() || n == '_' {
                    name.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
            } else if let Some(value) = self.get(&name) {
                out.push_str(&value);
            }
        }
        out
    }
}

/// Scans source text for a keyword and fills an `Arg`'s placeholders from
/// the comma-separated tokens that follow it (spec's "two-pointer /
/// pre-truncation scan" — walk forward from the keyword to the next
/// statement terminator, then assign each token to the next placeholder).
pub struct CJMODScanner;

impl CJMODScanner {
    pub fn scan(arg: &mut Arg, keyword: &str, source: &str) -> Option<()> {
        let start = source.find(keyword)? + keyword.len();
        let rest = &source[start..];
        let end = rest.find(';').unwrap_or(rest.len());
        let window = rest[..end].trim().trim_start_matches('(').trim_end_matches(')');
        let tokens: Vec<&str> = window.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

        let placeholders = arg.schema.placeholders.clone();
        for (i, placeholder) in placeholders.iter().enumerate() {
            match tokens.get(i) {
                Some(tok) => {
                    arg.set(&placeholder.name, *tok);
                }
                None if placeholder.kind == PlaceholderKind::ExplicitRequired => return None,
                None => {}
            }
        }
        Some(())
    }
}

/// Emits a rendered `Arg` into the CHTL-JS output buffer.
pub struct CJMODGenerator;

impl CJMODGenerator {
    pub fn export_result(arg: &Arg, template: &str, out: &mut String) {
        out.push_str(&arg.transform(template));
    }
}

/// Registers a pattern as an extended CHTL-JS construct.
#[derive(Debug, Clone)]
pub struct CHTLJSFunction {
    pub pattern: String,
    pub schema: Syntax,
    pub virtual_object: Option<String>,
}

impl CHTLJSFunction {
    pub fn create(pattern: &str) -> Self {
        CHTLJSFunction { pattern: pattern.to_string(), schema: Syntax::analyze(pattern), virtual_object: None }
    }

    /// Marks this function as producing a virtual object reachable through
    /// the `vir` mechanism (spec §4.7).
    pub fn bind_virtual_object(&mut self, name: &str) -> &mut Self {
        self.virtual_object = Some(name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzes_mixed_placeholder_kinds() {
        let syntax = Syntax::analyze("$ $? $! $_key ...");
        let kinds: Vec<PlaceholderKind> = syntax.placeholders.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PlaceholderKind::Required,
                PlaceholderKind::Optional,
                PlaceholderKind::ExplicitRequired,
                PlaceholderKind::Unordered,
                PlaceholderKind::Variadic,
            ]
        );
        assert_eq!(syntax.placeholders[3].name, "key");
    }

    #[test]
    fn arg_transform_substitutes_bound_values() {
        let mut arg = Arg::new(Syntax::analyze("$_name"));
        arg.set("name", "world");
        arg.bind("name", |v| v.to_uppercase());
        assert_eq!(arg.transform("hello $name!"), "hello WORLD!");
    }

    #[test]
    fn scanner_fills_positional_tokens() {
        let schema = Syntax::analyze("$ $");
        let mut arg = Arg::new(schema);
        CJMODScanner::scan(&mut arg, "myFn", "myFn(1, 2);").unwrap();
        assert_eq!(arg.get("_0").as_deref(), Some("1"));
        assert_eq!(arg.get("_1").as_deref(), Some("2"));
    }

    #[test]
    fn scanner_rejects_missing_explicit_required() {
        let schema = Syntax::analyze("$!");
        let mut arg = Arg::new(schema);
        assert!(CJMODScanner::scan(&mut arg, "myFn", "myFn();").is_none());
    }
}
