//! Shallow CHTL-JS scanning (spec §4.7): finds the extended constructs
//! (`{{selector}}`, `->listen`/`->delegate`, `animate`, `router`, `vir`,
//! `fileloader`, `util ... -> change ... -> then ...`, and the Chtholly
//! builtins) inside a script block and leaves everything else as opaque
//! JavaScript text.

use super::ast::{Entry, Segment};
use crate::error::{CompileError, Result};

pub fn scan(source: &str) -> Result<Vec<Segment>> {
    let chars: Vec<char> = source.chars().collect();
    let mut segments = Vec::new();
    let mut raw = String::new();
    let mut i = 0usize;

    while i < chars.len() {
        if chars[i] == '{' && chars.get(i + 1) == Some(&'{') {
            flush_raw(&mut raw, &mut segments);
            let (seg, next) = scan_enhanced_selector(&chars, i)?;
            segments.push(seg);
            i = next;
            continue;
        }

        if chars[i] == '-' && chars.get(i + 1) == Some(&'>') {
            let after_arrow = skip_ws(&chars, i + 2);
            if let Some(rest) = match_keyword(&chars, after_arrow, "listen") {
                let target = pop_trailing_target(&mut raw, &mut segments);
                flush_raw(&mut raw, &mut segments);
                let brace = skip_ws(&chars, rest);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::Listen { target, entries });
                i = next;
                continue;
            }
            if let Some(rest) = match_keyword(&chars, after_arrow, "delegate") {
                let parent = pop_trailing_target(&mut raw, &mut segments);
                flush_raw(&mut raw, &mut segments);
                let brace = skip_ws(&chars, rest);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::Delegate { parent, entries });
                i = next;
                continue;
            }
            raw.push_str("->");
            i += 2;
            continue;
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "util") {
            flush_raw(&mut raw, &mut segments);
            let (seg, next) = scan_util(&chars, rest)?;
            segments.push(seg);
            i = next;
            continue;
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "animate") {
            let brace = skip_ws(&chars, rest);
            if chars.get(brace) == Some(&'{') {
                flush_raw(&mut raw, &mut segments);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::Animate { entries });
                i = next;
                continue;
            }
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "router") {
            let brace = skip_ws(&chars, rest);
            if chars.get(brace) == Some(&'{') {
                flush_raw(&mut raw, &mut segments);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::Router { entries });
                i = next;
                continue;
            }
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "fileloader") {
            let brace = skip_ws(&chars, rest);
            if chars.get(brace) == Some(&'{') {
                flush_raw(&mut raw, &mut segments);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::FileLoader { entries });
                i = next;
                continue;
            }
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "vir") {
            let name_start = skip_ws(&chars, rest);
            let name_end = ident_end(&chars, name_start);
            if name_end > name_start {
                let eq = skip_ws(&chars, name_end);
                if chars.get(eq) == Some(&'=') {
                    let brace = skip_ws(&chars, eq + 1);
                    if chars.get(brace) == Some(&'{') {
                        flush_raw(&mut raw, &mut segments);
                        let name: String = chars[name_start..name_end].iter().collect();
                        let (entries, next) = scan_object_block(&chars, brace)?;
                        segments.push(Segment::Vir { name, entries });
                        i = next;
                        continue;
                    }
                }
            }
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "iNeverAway") {
            let brace = skip_ws(&chars, rest);
            if chars.get(brace) == Some(&'{') {
                flush_raw(&mut raw, &mut segments);
                let (entries, next) = scan_object_block(&chars, brace)?;
                segments.push(Segment::INeverAway { entries });
                i = next;
                continue;
            }
        }

        if let Some(rest) = match_keyword_at_word_boundary(&chars, i, "printMylove") {
            let paren = skip_ws(&chars, rest);
            if chars.get(paren) == Some(&'(') {
                flush_raw(&mut raw, &mut segments);
                let (args, next) = scan_call_args(&chars, paren)?;
                segments.push(Segment::PrintMylove { args });
                i = next;
                continue;
            }
        }

        raw.push(chars[i]);
        i += 1;
    }

    flush_raw(&mut raw, &mut segments);
    Ok(segments)
}

fn flush_raw(raw: &mut String, segments: &mut Vec<Segment>) {
    if !raw.is_empty() {
        segments.push(Segment::Raw(std::mem::take(raw)));
    }
}

/// When `->listen`/`->delegate` follows something other than a just-lowered
/// `{{selector}}` segment, the target is the trailing identifier chain
/// sitting in `raw` (e.g. `btn->listen {...}`).
fn pop_trailing_target(raw: &mut String, segments: &mut [Segment]) -> String {
    if let Some(Segment::EnhancedSelector { selector, index }) = segments.last() {
        if raw.trim().is_empty() {
            return lower_selector(selector, index.as_deref());
        }
    }
    let trimmed_end = raw.trim_end().len();
    let trailing_start = raw[..trimmed_end]
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .map(|i| i + 1)
        .unwrap_or(0);
    let target = raw[trailing_start..trimmed_end].to_string();
    raw.truncate(trailing_start);
    target
}

fn skip_ws(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn ident_end(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
        i += 1;
    }
    i
}

fn match_keyword(chars: &[char], i: usize, kw: &str) -> Option<usize> {
    let kw_chars: Vec<char> = kw.chars().collect();
    if chars.len() < i + kw_chars.len() {
        return None;
    }
    if chars[i..i + kw_chars.len()] != kw_chars[..] {
        return None;
    }
    let after = i + kw_chars.len();
    if chars.get(after).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
        return None;
    }
    Some(after)
}

fn match_keyword_at_word_boundary(chars: &[char], i: usize, kw: &str) -> Option<usize> {
    if i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_' || chars[i - 1] == '$') {
        return None;
    }
    match_keyword(chars, i, kw)
}

/// Parses `{{selector}}` or `{{selector[index]}}` starting at the first `{`.
fn scan_enhanced_selector(chars: &[char], start: usize) -> Result<(Segment, usize)> {
    let body_start = start + 2;
    let mut j = body_start;
    while j + 1 < chars.len() && !(chars[j] == '}' && chars[j + 1] == '}') {
        j += 1;
    }
    if j + 1 >= chars.len() {
        return Err(CompileError::syntax(
            "unterminated-enhanced-selector",
            "unterminated `{{ ... }}` enhanced selector",
            None,
        ));
    }
    let raw: String = chars[body_start..j].iter().collect();
    let raw = raw.trim();
    let (selector, index) = if let Some(bracket) = raw.rfind('[') {
        if raw.ends_with(']') {
            let sel = raw[..bracket].trim().to_string();
            let idx = raw[bracket + 1..raw.len() - 1].trim().to_string();
            (sel, Some(idx))
        } else {
            (raw.to_string(), None)
        }
    } else {
        (raw.to_string(), None)
    };
    Ok((Segment::EnhancedSelector { selector, index }, j + 2))
}

/// Reads a `{ ... }` block honoring nested braces and quoted strings, then
/// splits its top-level comma-separated entries into key/value pairs.
fn scan_object_block(chars: &[char], open: usize) -> Result<(Vec<Entry>, usize)> {
    let (body, next) = read_braced_body(chars, open)?;
    Ok((parse_entries(&body), next))
}

fn read_braced_body(chars: &[char], open: usize) -> Result<(String, usize)> {
    debug_assert_eq!(chars[open], '{');
    let mut depth = 0i32;
    let mut j = open;
    let mut in_string: Option<char> = None;
    loop {
        if j >= chars.len() {
            return Err(CompileError::syntax(
                "unterminated-block",
                "unterminated CHTL-JS block",
                None,
            ));
        }
        let c = chars[j];
        if let Some(q) = in_string {
            if c == '\\' {
                j += 2;
                continue;
            }
            if c == q {
                in_string = None;
            }
            j += 1;
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let body: String = chars[open + 1..j].iter().collect();
                    return Ok((body, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }
}

fn read_parened_args(chars: &[char], open: usize) -> Result<(String, usize)> {
    debug_assert_eq!(chars[open], '(');
    let mut depth = 0i32;
    let mut j = open;
    let mut in_string: Option<char> = None;
    loop {
        if j >= chars.len() {
            return Err(CompileError::syntax(
                "unterminated-block",
                "unterminated CHTL-JS call arguments",
                None,
            ));
        }
        let c = chars[j];
        if let Some(q) = in_string {
            if c == '\\' {
                j += 2;
                continue;
            }
            if c == q {
                in_string = None;
            }
            j += 1;
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let body: String = chars[open + 1..j].iter().collect();
                    return Ok((body, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }
}

fn scan_call_args(chars: &[char], open: usize) -> Result<(Vec<String>, usize)> {
    let (body, next) = read_parened_args(chars, open)?;
    let args = split_top_level(&body, ',').into_iter().map(|s| s.trim().to_string()).collect();
    Ok((args, next))
}

/// `util COND -> change { THEN } -> then { ELSE }`.
fn scan_util(chars: &[char], start: usize) -> Result<(Segment, usize)> {
    let change_at = find_keyword_after(chars, start, "change")
        .ok_or_else(|| CompileError::syntax("malformed-util", "expected `-> change { ... }`", None))?;
    let condition: String = chars[start..change_at.keyword_start].iter().collect();
    let condition = condition.trim().trim_end_matches("->").trim().to_string();
    let brace = skip_ws(chars, change_at.after_keyword);
    let (change_body, after_change) = read_braced_body(chars, brace)?;

    let then_at = find_keyword_after(chars, after_change, "then")
        .ok_or_else(|| CompileError::syntax("malformed-util", "expected `-> then { ... }`", None))?;
    let then_brace = skip_ws(chars, then_at.after_keyword);
    let (then_body, after_then) = read_braced_body(chars, then_brace)?;

    Ok((
        Segment::Util { condition, change: change_body.trim().to_string(), then: then_body.trim().to_string() },
        after_then,
    ))
}

struct KeywordHit {
    keyword_start: usize,
    after_keyword: usize,
}

fn find_keyword_after(chars: &[char], from: usize, kw: &str) -> Option<KeywordHit> {
    let mut i = from;
    while i < chars.len() {
        if let Some(after) = match_keyword_at_word_boundary(chars, i, kw) {
            return Some(KeywordHit { keyword_start: i, after_keyword: after });
        }
        i += 1;
    }
    None
}

/// Splits `body` on top-level occurrences of `sep`, skipping separators
/// nested inside `()`, `[]`, `{}` or quoted strings.
fn split_top_level(body: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut start = 0usize;
    let bytes = body.as_bytes();
    let mut i = 0usize;
    let mut escape = false;
    while i < bytes.len() {
        let c = body[i..].chars().next().unwrap();
        if let Some(q) = in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == q {
                in_string = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ if c == sep && depth == 0 => {
                    parts.push(&body[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            }
        }
        i += c.len_utf8();
    }
    let tail = &body[start..];
    if !tail.trim().is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

fn split_first_top_level(body: &str, sep: char) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut escape = false;
    let mut i = 0usize;
    while i < body.len() {
        let c = body[i..].chars().next().unwrap();
        if let Some(q) = in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == q {
                in_string = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ if c == sep && depth == 0 => return Some((&body[..i], &body[i + c.len_utf8()..])),
                _ => {}
            }
        }
        i += c.len_utf8();
    }
    None
}

fn parse_entries(body: &str) -> Vec<Entry> {
    split_top_level(body, ',')
        .into_iter()
        .filter_map(|chunk| {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                return None;
            }
            let (key, value) = split_first_top_level(chunk, ':')?;
            let key = key.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
            Some(Entry { key, value: value.trim().to_string() })
        })
        .collect()
}

/// `{{S}}` -> `document.querySelector('S')`; `{{S[i]}}` -> `...querySelectorAll('S')[i]`;
/// `{{#x}}` (no index) -> `document.getElementById('x')`.
pub fn lower_selector(selector: &str, index: Option<&str>) -> String {
    if index.is_none() {
        if let Some(id) = selector.strip_prefix('#') {
            return format!("document.getElementById('{id}')");
        }
        return format!("document.querySelector('{selector}')");
    }
    let idx = index.unwrap();
    format!("document.querySelectorAll('{selector}')[{idx}]")
}
