//! The Chtholly CJMOD module (SPEC_FULL §11.3): a worked example of a CJMOD
//! consumer built on the public API in [`crate::cjmod::api`]. Implements
//! `iNeverAway` (named-argument object literal sugar) and `printMylove`
//! (a templated `console.log` wrapper).

use crate::chtl_js::ast::Entry;
use crate::cjmod::api::{Arg, CHTLJSFunction, CJMODGenerator, Syntax};

/// `iNeverAway { key: value, ... }` lowers to a plain object literal; the
/// sugar is that keys may appear in any order and are matched by name
/// (`$_` unordered placeholders) rather than position.
pub fn i_never_away(entries: &[Entry]) -> String {
    let pattern = entries.iter().map(|e| format!("$_{}", e.key)).collect::<Vec<_>>().join(" ");
    let func = CHTLJSFunction::create(&pattern);
    let mut arg = Arg::new(func.schema.clone());
    for entry in entries {
        arg.set(&entry.key, entry.value.clone());
    }
    let body = entries
        .iter()
        .map(|e| format!("{}: ${}", e.key, e.key))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = String::new();
    CJMODGenerator::export_result(&arg, &format!("{{ {body} }}"), &mut out);
    out
}

/// `printMylove("template with {} slots", a, b)` lowers to a template
/// literal `console.log` call, substituting `{}` positionally with the
/// remaining arguments (`$!` for the required template, `...` for the
/// variadic interpolations).
pub fn print_mylove(args: &[String]) -> String {
    let func = CHTLJSFunction::create("$! ...");
    let mut arg = Arg::new(func.schema.clone());
    if args.is_empty() {
        return "console.log()".to_string();
    }
    let template_literal = args[0].trim().trim_matches(|c| c == '"' || c == '\'');
    arg.set("_0", substitute_slots(template_literal, &args[1..]));
    let mut out = String::new();
    CJMODGenerator::export_result(&arg, "console.log(`$_0`)", &mut out);
    out
}

fn substitute_slots(template: &str, values: &[String]) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    let mut idx = 0usize;
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            if let Some(value) = values.get(idx) {
                out.push_str("${");
                out.push_str(value);
                out.push('}');
            } else {
                out.push_str("${undefined}");
            }
            idx += 1;
        } else if c == '`' {
            out.push_str("\\`");
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i_never_away_emits_object_literal() {
        let entries = vec![
            Entry { key: "x".to_string(), value: "1".to_string() },
            Entry { key: "y".to_string(), value: "2".to_string() },
        ];
        assert_eq!(i_never_away(&entries), "{ x: 1, y: 2 }");
    }

    #[test]
    fn print_mylove_interpolates_positional_slots() {
        let args = vec!["\"hi {}\"".to_string(), "name".to_string()];
        assert_eq!(print_mylove(&args), "console.log(`hi ${name}`)");
    }
}
